pub mod diag;
pub mod lifecycle;
pub mod status;

use anyhow::Context;
use std::path::Path;
use testsite_core::config::Config;
use testsite_core::process::SystemRunner;
use testsite_core::Controller;

fn controller(root: &Path) -> anyhow::Result<Controller<SystemRunner>> {
    let config = Config::load(root).context("failed to load testsite.yaml")?;
    Ok(Controller::new(root, config, SystemRunner))
}
