use crate::error::{Result, TestSiteError};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// CommandSpec
// ---------------------------------------------------------------------------

/// An external program plus its fixed arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SiteSettings
// ---------------------------------------------------------------------------

/// Data directory, storage prefix and base URL of one site.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteSettings {
    #[serde(default)]
    pub dataroot: Option<PathBuf>,
    #[serde(default)]
    pub dbprefix: Option<String>,
    #[serde(default)]
    pub wwwroot: Option<String>,
}

// ---------------------------------------------------------------------------
// AdminConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_password")]
    pub password: String,
    #[serde(default = "default_admin_email")]
    pub email: String,
}

fn default_admin_password() -> String {
    "Password1".to_string()
}

fn default_admin_email() -> String {
    "behat@example.org".to_string()
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            password: default_admin_password(),
            email: default_admin_email(),
        }
    }
}

// ---------------------------------------------------------------------------
// DependencyConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyConfig {
    /// File under the harness root, or a program name looked up on `PATH`.
    pub manager: String,
    /// Directory under the harness root that exists once the test
    /// automation libraries are installed.
    pub runtime_dir: PathBuf,
    /// Fetches the dependency manager itself when it is missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootstrap: Option<CommandSpec>,
    /// Installs or updates the test automation libraries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<CommandSpec>,
    /// Removes the test automation libraries after an uninstall.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prune: Option<CommandSpec>,
}

// ---------------------------------------------------------------------------
// CommandsConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandsConfig {
    /// Runs in the harness root; must exit 0 when the test runner works.
    pub self_check: CommandSpec,
    /// Runs in the application root with admin credentials appended.
    pub install: CommandSpec,
    /// Runs in the application root.
    pub uninstall: CommandSpec,
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_site_name")]
    pub site_name: String,
    /// Working directory for the installer and uninstaller. Relative paths
    /// are taken from the harness root.
    pub app_root: PathBuf,
    #[serde(default)]
    pub production: SiteSettings,
    #[serde(default)]
    pub test: SiteSettings,
    #[serde(default)]
    pub admin: AdminConfig,
    pub dependencies: DependencyConfig,
    pub commands: CommandsConfig,
    /// Entries of the test data directory that are never removed.
    #[serde(default = "default_keep")]
    pub keep: Vec<String>,
}

fn default_version() -> u32 {
    1
}

fn default_site_name() -> String {
    "Acceptance test site".to_string()
}

fn default_keep() -> Vec<String> {
    paths::DEFAULT_KEEP.iter().map(|s| s.to_string()).collect()
}

impl Config {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(TestSiteError::ConfigNotFound(path));
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn app_root(&self, root: &Path) -> PathBuf {
        paths::resolve(root, &self.app_root)
    }

    /// Installer command with the admin credentials and site name appended.
    pub fn install_command(&self) -> CommandSpec {
        self.commands
            .install
            .clone()
            .arg(format!("--adminpassword={}", self.admin.password))
            .arg(format!("--adminemail={}", self.admin.email))
            .arg(format!("--sitename={}", self.site_name))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
