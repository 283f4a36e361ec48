use crate::output::print_json;
use anyhow::Context;
use std::path::Path;
use testsite_core::{LifecycleStatus, Operation, Outcome};

pub fn run(root: &Path, operation: Operation, json: bool) -> anyhow::Result<()> {
    let ctl = super::controller(root)?;
    let outcome = ctl
        .handle(operation)
        .with_context(|| format!("{operation} failed"))?;

    if json {
        let value = serde_json::json!({
            "operation": operation,
            "result": outcome,
            "status": outcome.status(),
        });
        print_json(&value)?;
    } else {
        println!("{}", message(operation, outcome));
    }
    Ok(())
}

fn message(operation: Operation, outcome: Outcome) -> String {
    match outcome {
        Outcome::Unchanged { status } => format!("Test site has already been {}", past(status)),
        Outcome::Changed { .. } => match operation {
            Operation::Install => "Acceptance test site is installed".to_string(),
            Operation::Enable => "Acceptance test site is enabled".to_string(),
            Operation::Disable => "Acceptance test site is disabled".to_string(),
            Operation::Uninstall => "Acceptance test site is uninstalled".to_string(),
            Operation::Reset => {
                "Acceptance test site database and dataroot are reset".to_string()
            }
            Operation::Setup => "Acceptance test site is installed and enabled".to_string(),
        },
    }
}

fn past(status: LifecycleStatus) -> &'static str {
    match status {
        LifecycleStatus::NotInstalled => "uninstalled",
        other => other.as_str(),
    }
}
