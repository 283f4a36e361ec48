use crate::output::print_json;
use anyhow::Context;
use std::path::Path;
use testsite_core::{site, LifecycleStatus};

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let ctl = super::controller(root)?;
    let status = ctl.status().context("failed to read the test site status")?;
    let wwwroot = ctl.config().test.wwwroot.clone().unwrap_or_default();
    let reachable = site::is_running(&wwwroot);

    if json {
        let value = serde_json::json!({
            "status": status,
            "code": status.code(),
            "wwwroot": wwwroot,
            "reachable": reachable,
        });
        print_json(&value)?;
        return Ok(());
    }

    println!("status:    {status}");
    if !wwwroot.is_empty() {
        let answer = if reachable { "responding" } else { "not responding" };
        println!("wwwroot:   {wwwroot} ({answer})");
    }
    if status == LifecycleStatus::Installing {
        println!("\nA previous install did not finish. Run `testsite --reset` to start over.");
    }
    Ok(())
}
