//! The test site lifecycle state machine.
//!
//! ```text
//! NOT_INSTALLED -> INSTALLING -> INSTALLED -> ENABLED <-> DISABLED
//!        ^                           |            |           |
//!        +---------- uninstall ------+------------+-----------+
//! ```
//!
//! Every operation is gated by a preflight check and reads the current status
//! before deciding. External steps run through a [`CommandRunner`]; a failed
//! step aborts the operation and leaves the status file as it was after the
//! last successful write.

use crate::config::Config;
use crate::error::{Result, TestSiteError};
use crate::preflight::{manager_present, PreflightChecker, PreflightReport};
use crate::process::CommandRunner;
use crate::status::{LifecycleStatus, StatusStore};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Install,
    Enable,
    Disable,
    Reset,
    Uninstall,
    /// Fetch tooling if needed, install if needed, then enable.
    Setup,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Install => "install",
            Operation::Enable => "enable",
            Operation::Disable => "disable",
            Operation::Reset => "reset",
            Operation::Uninstall => "uninstall",
            Operation::Setup => "setup",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The status file now holds `to`.
    Changed {
        from: LifecycleStatus,
        to: LifecycleStatus,
    },
    /// Already in the requested state; nothing was touched.
    Unchanged { status: LifecycleStatus },
}

impl Outcome {
    pub fn status(self) -> LifecycleStatus {
        match self {
            Outcome::Changed { to, .. } => to,
            Outcome::Unchanged { status } => status,
        }
    }

    pub fn changed(self) -> bool {
        matches!(self, Outcome::Changed { .. })
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct Controller<R> {
    root: PathBuf,
    config: Config,
    runner: R,
    store: StatusStore,
}

impl<R: CommandRunner> Controller<R> {
    /// `root` is the harness root holding the status file and tooling.
    pub fn new(root: impl Into<PathBuf>, config: Config, runner: R) -> Self {
        let root = root.into();
        let store = StatusStore::in_root(&root);
        Self {
            root,
            config,
            runner,
            store,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn status(&self) -> Result<LifecycleStatus> {
        self.store.read()
    }

    pub fn preflight(&self) -> PreflightReport {
        PreflightChecker::new(&self.root, &self.config, &self.runner).check()
    }

    pub fn handle(&self, operation: Operation) -> Result<Outcome> {
        tracing::debug!(%operation, "handling lifecycle operation");
        match operation {
            Operation::Install => self.install(),
            Operation::Enable => self.enable(),
            Operation::Disable => self.disable(),
            Operation::Reset => self.reset(),
            Operation::Uninstall => self.uninstall(),
            Operation::Setup => self.setup(),
        }
    }

    pub fn install(&self) -> Result<Outcome> {
        self.gate()?;
        let from = self.store.read()?;
        if from == LifecycleStatus::Installed {
            tracing::info!("test site is already installed");
            return Ok(Outcome::Unchanged { status: from });
        }

        self.store.write(LifecycleStatus::Installing)?;
        self.clear_dataroot()?;
        self.run_installer()?;
        self.store.write(LifecycleStatus::Installed)?;

        tracing::info!(%from, "test site installed");
        Ok(Outcome::Changed {
            from,
            to: LifecycleStatus::Installed,
        })
    }

    /// Turn test mode on. Any state other than `Enabled` is overwritten; the
    /// installed-ness of the site is not checked.
    pub fn enable(&self) -> Result<Outcome> {
        self.switch(LifecycleStatus::Enabled)
    }

    pub fn disable(&self) -> Result<Outcome> {
        self.switch(LifecycleStatus::Disabled)
    }

    /// Full reinstall from whatever state the site is in. Enabled-ness is not
    /// preserved.
    pub fn reset(&self) -> Result<Outcome> {
        self.gate()?;
        let from = self.store.read()?;

        self.clear_dataroot()?;
        if from != LifecycleStatus::NotInstalled {
            self.run_uninstaller()?;
        }
        // a failure past this point leaves INSTALLING; --install or --reset
        // picks it up again
        self.store.write(LifecycleStatus::Installing)?;
        self.run_installer()?;
        self.store.write(LifecycleStatus::Installed)?;

        tracing::info!(%from, "test site reset");
        Ok(Outcome::Changed {
            from,
            to: LifecycleStatus::Installed,
        })
    }

    pub fn uninstall(&self) -> Result<Outcome> {
        self.gate()?;
        let from = self.store.read()?;
        if from == LifecycleStatus::NotInstalled {
            tracing::info!("test site is already uninstalled");
            return Ok(Outcome::Unchanged { status: from });
        }

        self.clear_dataroot()?;
        self.run_uninstaller()?;
        self.store.clear()?;

        if let Some(prune) = &self.config.dependencies.prune {
            self.runner.run_or_raise(prune, &self.root)?;
        }

        tracing::info!(%from, "test site uninstalled");
        Ok(Outcome::Changed {
            from,
            to: LifecycleStatus::NotInstalled,
        })
    }

    /// Bring the site from any state to ENABLED, fetching the dependency
    /// manager and test libraries first when they are missing.
    pub fn setup(&self) -> Result<Outcome> {
        let mut report = self.preflight();
        if report.result.is_tooling() {
            self.ensure_dependencies(&report)?;
            report = self.preflight();
        }
        if !report.is_ok() {
            return Err(TestSiteError::NotReady(report));
        }

        let from = self.store.read()?;
        if from == LifecycleStatus::Enabled {
            tracing::info!("test site is already installed and enabled");
            return Ok(Outcome::Unchanged { status: from });
        }
        if !from.is_installed() {
            self.install()?;
        }
        self.enable()?;
        Ok(Outcome::Changed {
            from,
            to: LifecycleStatus::Enabled,
        })
    }

    // -----------------------------------------------------------------------
    // Steps
    // -----------------------------------------------------------------------

    fn gate(&self) -> Result<()> {
        let report = self.preflight();
        if report.is_ok() {
            Ok(())
        } else {
            Err(TestSiteError::NotReady(report))
        }
    }

    fn switch(&self, to: LifecycleStatus) -> Result<Outcome> {
        self.gate()?;
        let from = self.store.read()?;
        if from == to {
            tracing::info!("test site is already {to}");
            return Ok(Outcome::Unchanged { status: from });
        }
        self.store.write(to)?;
        tracing::info!(%from, %to, "test site status changed");
        Ok(Outcome::Changed { from, to })
    }

    fn ensure_dependencies(&self, report: &PreflightReport) -> Result<()> {
        let deps = &self.config.dependencies;
        if !manager_present(&self.root, &deps.manager) {
            let Some(bootstrap) = &deps.bootstrap else {
                return Err(TestSiteError::NotReady(report.clone()));
            };
            tracing::info!("fetching the dependency manager");
            self.runner.run_or_raise(bootstrap, &self.root)?;
        }
        if let Some(update) = &deps.update {
            tracing::info!("installing test automation dependencies");
            self.runner.run_or_raise(update, &self.root)?;
        }
        Ok(())
    }

    fn run_installer(&self) -> Result<()> {
        let app_root = self.config.app_root(&self.root);
        self.runner
            .run_or_raise(&self.config.install_command(), &app_root)?;
        Ok(())
    }

    fn run_uninstaller(&self) -> Result<()> {
        let app_root = self.config.app_root(&self.root);
        self.runner
            .run_or_raise(&self.config.commands.uninstall, &app_root)?;
        Ok(())
    }

    /// Empty the test dataroot, sparing the keep-list and the harness itself.
    fn clear_dataroot(&self) -> Result<()> {
        let Some(dataroot) = &self.config.test.dataroot else {
            return Ok(());
        };
        let dataroot = std::fs::canonicalize(crate::paths::resolve(&self.root, dataroot))?;
        let harness = std::fs::canonicalize(&self.root).ok();
        let removed = crate::io::clear_dir(&dataroot, &self.config.keep, harness.as_deref())?;
        tracing::info!(dataroot = %dataroot.display(), removed, "cleared test dataroot");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
