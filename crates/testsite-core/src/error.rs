use crate::preflight::PreflightReport;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TestSiteError {
    #[error("config not found at {0}: create testsite.yaml in the harness root")]
    ConfigNotFound(PathBuf),

    #[error("test site is not ready: {0}")]
    NotReady(PreflightReport),

    #[error("the status file of the test site holds an unknown value: {0:?}")]
    CorruptStatus(String),

    #[error("the status file {path} is not writable: {source}")]
    StatusNotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with code {exit_code}")]
    ExternalCommandFailed {
        command: String,
        exit_code: i32,
        output: Vec<String>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

/// Coarse failure family, used by callers to pick an exit code and a hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Dependency,
    Filesystem,
    ExternalCommand,
}

impl TestSiteError {
    pub fn kind(&self) -> ErrorKind {
        use crate::preflight::PreflightResult as P;
        match self {
            TestSiteError::ConfigNotFound(_) | TestSiteError::Yaml(_) => ErrorKind::Configuration,
            TestSiteError::NotReady(report) => match report.result {
                P::MissingDependency | P::MissingRuntimeSupport => ErrorKind::Dependency,
                P::NotWritable => ErrorKind::Filesystem,
                P::Ok | P::Misconfigured => ErrorKind::Configuration,
            },
            TestSiteError::CorruptStatus(_)
            | TestSiteError::StatusNotWritable { .. }
            | TestSiteError::Io(_) => ErrorKind::Filesystem,
            TestSiteError::Spawn { .. } => ErrorKind::Dependency,
            TestSiteError::ExternalCommandFailed { .. } => ErrorKind::ExternalCommand,
        }
    }
}

pub type Result<T> = std::result::Result<T, TestSiteError>;
