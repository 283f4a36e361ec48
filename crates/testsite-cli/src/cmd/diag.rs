use crate::output::print_json;
use std::path::Path;
use testsite_core::preflight::REMEDIATION;
use testsite_core::site;

/// Run the preflight checks only. The returned value is the process exit
/// code: 0 when ready, otherwise the code of the first failing check.
pub fn run(root: &Path, json: bool) -> anyhow::Result<i32> {
    let ctl = super::controller(root)?;
    let report = ctl.preflight();
    // a corrupt status file must not mask the readiness code
    let status = ctl.status().ok();

    if json {
        let reachable = ctl
            .config()
            .test
            .wwwroot
            .as_deref()
            .is_some_and(site::is_running);
        let value = serde_json::json!({
            "result": report.result,
            "code": report.result.code(),
            "problem": report.problem,
            "status": status,
            "reachable": reachable,
        });
        print_json(&value)?;
    } else if let Some(problem) = &report.problem {
        println!("Error: {problem}\n");
        println!("Make sure {REMEDIATION}");
    }

    Ok(report.result.code())
}
