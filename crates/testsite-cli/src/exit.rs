use testsite_core::preflight::REMEDIATION;
use testsite_core::{ErrorKind, Operation, TestSiteError};

pub const UNINSTALL_FAILED: i32 = 246;
pub const INSTALL_FAILED: i32 = 247;
pub const CONFIG: i32 = 248;
pub const REQUIREMENT: i32 = 249;
pub const PERMISSIONS: i32 = 250;
pub const NO_DEPENDENCIES: i32 = 254;

/// Process exit code for a failed command.
pub fn code(operation: Option<Operation>, err: &anyhow::Error) -> i32 {
    let Some(err) = err.downcast_ref::<TestSiteError>() else {
        return 1;
    };
    if let TestSiteError::NotReady(report) = err {
        return report.result.code();
    }
    if let TestSiteError::CorruptStatus(_) = err {
        return REQUIREMENT;
    }
    match err.kind() {
        ErrorKind::ExternalCommand | ErrorKind::Dependency => match operation {
            Some(Operation::Uninstall) => UNINSTALL_FAILED,
            Some(_) => INSTALL_FAILED,
            None => NO_DEPENDENCIES,
        },
        ErrorKind::Configuration => CONFIG,
        ErrorKind::Filesystem => PERMISSIONS,
    }
}

/// What the user can do about it, when there is something to say.
pub fn hint(err: &anyhow::Error) -> Option<String> {
    let err = err.downcast_ref::<TestSiteError>()?;
    let hint = match err {
        // the report already carries its remediation
        TestSiteError::NotReady(_) => return None,
        TestSiteError::CorruptStatus(_) => {
            "inspect or delete the status file, then run `testsite --reset`".to_string()
        }
        TestSiteError::ExternalCommandFailed { output, .. } if !output.is_empty() => {
            format!("command output:\n{}", output.join("\n"))
        }
        _ => match err.kind() {
            ErrorKind::Filesystem => "check the permissions of the harness root".to_string(),
            ErrorKind::Configuration => REMEDIATION.to_string(),
            _ => return None,
        },
    };
    Some(hint)
}
