use crate::config::{Config, SiteSettings};
use crate::process::CommandRunner;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

pub const REMEDIATION: &str =
    "set the `test` section of testsite.yaml apart from `production` and run `testsite --setup`";

// ---------------------------------------------------------------------------
// PreflightResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PreflightResult {
    Ok,
    MissingDependency,
    MissingRuntimeSupport,
    Misconfigured,
    NotWritable,
}

impl PreflightResult {
    /// Process exit code reported by `--diag`.
    pub fn code(self) -> i32 {
        match self {
            PreflightResult::Ok => 0,
            PreflightResult::MissingDependency => 255,
            PreflightResult::MissingRuntimeSupport => 254,
            PreflightResult::Misconfigured => 248,
            PreflightResult::NotWritable => 250,
        }
    }

    /// Both failures mean tooling is absent and `--setup` can fetch it.
    pub fn is_tooling(self) -> bool {
        matches!(
            self,
            PreflightResult::MissingDependency | PreflightResult::MissingRuntimeSupport
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PreflightResult::Ok => "ok",
            PreflightResult::MissingDependency => "missing_dependency",
            PreflightResult::MissingRuntimeSupport => "missing_runtime_support",
            PreflightResult::Misconfigured => "misconfigured",
            PreflightResult::NotWritable => "not_writable",
        }
    }
}

impl fmt::Display for PreflightResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PreflightReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreflightReport {
    pub result: PreflightResult,
    /// What is wrong, for humans. `None` when the result is `Ok`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
}

impl PreflightReport {
    pub fn ok() -> Self {
        Self {
            result: PreflightResult::Ok,
            problem: None,
        }
    }

    fn fail(result: PreflightResult, problem: impl Into<String>) -> Self {
        Self {
            result,
            problem: Some(problem.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result == PreflightResult::Ok
    }
}

impl fmt::Display for PreflightReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.problem {
            Some(problem) => write!(f, "{problem} ({REMEDIATION})"),
            None => f.write_str("ready"),
        }
    }
}

// ---------------------------------------------------------------------------
// PreflightChecker
// ---------------------------------------------------------------------------

/// Read-only readiness checks, run in a fixed order; the first failure wins.
pub struct PreflightChecker<'a, R> {
    root: &'a Path,
    config: &'a Config,
    runner: &'a R,
}

impl<'a, R: CommandRunner> PreflightChecker<'a, R> {
    pub fn new(root: &'a Path, config: &'a Config, runner: &'a R) -> Self {
        Self {
            root,
            config,
            runner,
        }
    }

    pub fn check(&self) -> PreflightReport {
        let report = self.evaluate();
        if let Some(problem) = &report.problem {
            tracing::warn!(result = %report.result, "{problem}");
        }
        report
    }

    fn evaluate(&self) -> PreflightReport {
        let deps = &self.config.dependencies;
        if !manager_present(self.root, &deps.manager) {
            return PreflightReport::fail(
                PreflightResult::MissingDependency,
                format!("the dependency manager `{}` is not installed", deps.manager),
            );
        }

        let runtime_dir = crate::paths::resolve(self.root, &deps.runtime_dir);
        if !runtime_dir.is_dir() {
            return PreflightReport::fail(
                PreflightResult::MissingRuntimeSupport,
                format!(
                    "the test automation dependencies are not installed ({} is missing)",
                    runtime_dir.display()
                ),
            );
        }

        let self_check = &self.config.commands.self_check;
        match self.runner.run(self_check, self.root) {
            Ok(outcome) if outcome.success() => {}
            Ok(outcome) => {
                return PreflightReport::fail(
                    PreflightResult::MissingRuntimeSupport,
                    format!(
                        "running the test runner failed: `{self_check}` exited with code {}",
                        outcome.exit_code
                    ),
                );
            }
            Err(e) => {
                return PreflightReport::fail(
                    PreflightResult::MissingRuntimeSupport,
                    format!("running the test runner failed: {e}"),
                );
            }
        }

        let test = &self.config.test;
        let (Some(dataroot), Some(dbprefix), Some(wwwroot)) = (
            test.dataroot.as_deref().filter(|p| !p.as_os_str().is_empty()),
            non_empty(&test.dbprefix),
            non_empty(&test.wwwroot),
        ) else {
            return PreflightReport::fail(
                PreflightResult::Misconfigured,
                "the settings test.dataroot, test.dbprefix and test.wwwroot must all be set",
            );
        };

        let prod = &self.config.production;
        let dataroot = crate::paths::resolve(self.root, dataroot);
        if collides(self.root, &dataroot, dbprefix, wwwroot, prod) {
            return PreflightReport::fail(
                PreflightResult::Misconfigured,
                "the values of test.dataroot, test.dbprefix and test.wwwroot must differ \
                 from their production counterparts",
            );
        }

        if !is_writable_dir(&dataroot) {
            return PreflightReport::fail(
                PreflightResult::NotWritable,
                format!(
                    "the test dataroot '{}' must be a writable directory",
                    dataroot.display()
                ),
            );
        }

        PreflightReport::ok()
    }
}

/// A file under the harness root, or an executable on `PATH`.
pub fn manager_present(root: &Path, manager: &str) -> bool {
    !manager.is_empty() && (root.join(manager).is_file() || which::which(manager).is_ok())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// `dataroot` must already be resolved against `root`; the production path
/// is resolved the same way before comparing.
fn collides(
    root: &Path,
    dataroot: &Path,
    dbprefix: &str,
    wwwroot: &str,
    prod: &SiteSettings,
) -> bool {
    let prod_prefix = prod.dbprefix.as_deref().unwrap_or("");
    let prod_www = prod.wwwroot.as_deref().unwrap_or("");
    dbprefix == prod_prefix
        || wwwroot.trim_end_matches('/') == prod_www.trim_end_matches('/')
        || prod
            .dataroot
            .as_deref()
            .is_some_and(|p| same_path(dataroot, &crate::paths::resolve(root, p)))
}

fn same_path(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (canonical(a), canonical(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn canonical(path: &Path) -> Option<PathBuf> {
    std::fs::canonicalize(path).ok()
}

/// Both the mode bits and `access(2)` must allow writing. root passes
/// `access(2)` for every directory, so the mode bits are what catch a
/// read-only dataroot there.
fn is_writable_dir(path: &Path) -> bool {
    let Some(path) = canonical(path) else {
        return false;
    };
    match std::fs::metadata(&path) {
        Ok(meta) => meta.is_dir() && !meta.permissions().readonly() && can_write(&path),
        Err(_) => false,
    }
}

#[cfg(unix)]
fn can_write(path: &Path) -> bool {
    use nix::unistd::{access, AccessFlags};
    access(path, AccessFlags::W_OK).is_ok()
}

#[cfg(not(unix))]
fn can_write(_path: &Path) -> bool {
    true
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CommandSpec;
    use crate::error::{Result, TestSiteError};
    use crate::process::ProcessOutcome;
    use std::cell::Cell;
    use tempfile::TempDir;

    /// Answers every command with a fixed exit code.
    struct FixedRunner {
        exit_code: i32,
        calls: Cell<usize>,
    }

    impl FixedRunner {
        fn exiting(exit_code: i32) -> Self {
            Self {
                exit_code,
                calls: Cell::new(0),
            }
        }
    }

    impl CommandRunner for FixedRunner {
        fn run(&self, _command: &CommandSpec, _cwd: &Path) -> Result<ProcessOutcome> {
            self.calls.set(self.calls.get() + 1);
            Ok(ProcessOutcome {
                exit_code: self.exit_code,
                output: Vec::new(),
            })
        }
    }

    struct NoSpawnRunner;

    impl CommandRunner for NoSpawnRunner {
        fn run(&self, command: &CommandSpec, _cwd: &Path) -> Result<ProcessOutcome> {
            Err(TestSiteError::Spawn {
                command: command.to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
        }
    }

    struct Env {
        root: TempDir,
        data: TempDir,
        config: Config,
    }

    /// A harness root with tooling present and a fully valid config.
    fn ready_env() -> Env {
        let root = TempDir::new().unwrap();
        let data = TempDir::new().unwrap();
        std::fs::write(root.path().join("composer.phar"), b"").unwrap();
        std::fs::create_dir_all(root.path().join("vendor/behat")).unwrap();
        let yaml = format!(
            r#"
app_root: app
test:
  dataroot: {}
  dbprefix: test_
  wwwroot: http://localhost:8000
production:
  dataroot: /var/lib/site
  dbprefix: ""
  wwwroot: http://localhost
dependencies:
  manager: composer.phar
  runtime_dir: vendor/behat
commands:
  self_check: {{ program: bin/behat, args: ["--help"] }}
  install: {{ program: "true" }}
  uninstall: {{ program: "true" }}
"#,
            data.path().display()
        );
        let config = serde_yaml::from_str(&yaml).unwrap();
        Env { root, data, config }
    }

    fn check(env: &Env, runner: &impl CommandRunner) -> PreflightResult {
        PreflightChecker::new(env.root.path(), &env.config, runner)
            .check()
            .result
    }

    #[test]
    fn valid_environment_is_ok() {
        let env = ready_env();
        let runner = FixedRunner::exiting(0);
        assert_eq!(check(&env, &runner), PreflightResult::Ok);
        assert_eq!(runner.calls.get(), 1);
    }

    #[test]
    fn missing_manager_short_circuits() {
        let mut env = ready_env();
        env.config.dependencies.manager = "no-such-manager.phar".to_string();
        let runner = FixedRunner::exiting(0);
        assert_eq!(check(&env, &runner), PreflightResult::MissingDependency);
        assert_eq!(runner.calls.get(), 0, "self-check must not run");
    }

    #[test]
    fn missing_runtime_dir() {
        let env = ready_env();
        std::fs::remove_dir_all(env.root.path().join("vendor/behat")).unwrap();
        assert_eq!(
            check(&env, &FixedRunner::exiting(0)),
            PreflightResult::MissingRuntimeSupport
        );
    }

    #[test]
    fn failing_self_check() {
        let env = ready_env();
        assert_eq!(
            check(&env, &FixedRunner::exiting(1)),
            PreflightResult::MissingRuntimeSupport
        );
        assert_eq!(
            check(&env, &NoSpawnRunner),
            PreflightResult::MissingRuntimeSupport
        );
    }

    #[test]
    fn unset_alternate_is_misconfigured() {
        let mut env = ready_env();
        env.config.test.wwwroot = Some("  ".to_string());
        assert_eq!(
            check(&env, &FixedRunner::exiting(0)),
            PreflightResult::Misconfigured
        );

        let mut env = ready_env();
        env.config.test.dbprefix = None;
        assert_eq!(
            check(&env, &FixedRunner::exiting(0)),
            PreflightResult::Misconfigured
        );
    }

    #[test]
    fn dataroot_equal_to_production_is_misconfigured() {
        let mut env = ready_env();
        env.config.production.dataroot = env.config.test.dataroot.clone();
        assert_eq!(
            check(&env, &FixedRunner::exiting(0)),
            PreflightResult::Misconfigured
        );
    }

    #[test]
    fn equal_prefix_or_url_is_misconfigured() {
        let mut env = ready_env();
        env.config.production.dbprefix = Some("test_".to_string());
        assert_eq!(
            check(&env, &FixedRunner::exiting(0)),
            PreflightResult::Misconfigured
        );

        let mut env = ready_env();
        env.config.production.wwwroot = Some("http://localhost:8000/".to_string());
        assert_eq!(
            check(&env, &FixedRunner::exiting(0)),
            PreflightResult::Misconfigured
        );
    }

    #[test]
    fn missing_dataroot_is_not_writable() {
        let mut env = ready_env();
        env.config.test.dataroot = Some(env.data.path().join("absent"));
        assert_eq!(
            check(&env, &FixedRunner::exiting(0)),
            PreflightResult::NotWritable
        );
    }

    #[cfg(unix)]
    #[test]
    fn read_only_dataroot_is_not_writable() {
        use std::os::unix::fs::PermissionsExt;

        let env = ready_env();
        std::fs::set_permissions(env.data.path(), std::fs::Permissions::from_mode(0o555)).unwrap();
        let result = check(&env, &FixedRunner::exiting(0));
        std::fs::set_permissions(env.data.path(), std::fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(result, PreflightResult::NotWritable);
    }

    #[test]
    fn relative_dataroot_equal_to_production_is_misconfigured() {
        let mut env = ready_env();
        let shared = env.root.path().join("data");
        std::fs::create_dir_all(&shared).unwrap();
        env.config.test.dataroot = Some(PathBuf::from("data"));
        env.config.production.dataroot = Some(shared);
        assert_eq!(
            check(&env, &FixedRunner::exiting(0)),
            PreflightResult::Misconfigured
        );
    }

    #[test]
    fn relative_dataroot_resolves_against_harness_root() {
        let mut env = ready_env();
        std::fs::create_dir_all(env.root.path().join("data")).unwrap();
        env.config.test.dataroot = Some(PathBuf::from("data"));
        assert_eq!(check(&env, &FixedRunner::exiting(0)), PreflightResult::Ok);
    }

    #[cfg(unix)]
    #[test]
    fn dataroot_owned_by_someone_else_is_not_writable() {
        // only meaningful for an unprivileged user; root may write anywhere
        if nix::unistd::geteuid().is_root() {
            return;
        }
        let mut env = ready_env();
        env.config.test.dataroot = Some(PathBuf::from("/"));
        assert_eq!(
            check(&env, &FixedRunner::exiting(0)),
            PreflightResult::NotWritable
        );
    }

    #[test]
    fn failure_report_carries_remediation() {
        let mut env = ready_env();
        env.config.test.dbprefix = None;
        let report = PreflightChecker::new(env.root.path(), &env.config, &FixedRunner::exiting(0))
            .check();
        assert!(!report.is_ok());
        assert!(report.to_string().contains("testsite --setup"));
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(PreflightResult::Ok.code(), 0);
        assert_eq!(PreflightResult::MissingDependency.code(), 255);
        assert_eq!(PreflightResult::MissingRuntimeSupport.code(), 254);
        assert_eq!(PreflightResult::Misconfigured.code(), 248);
        assert_eq!(PreflightResult::NotWritable.code(), 250);
    }
}
