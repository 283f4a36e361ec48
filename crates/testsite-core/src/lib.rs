pub mod config;
pub mod controller;
pub mod error;
pub mod io;
pub mod paths;
pub mod preflight;
pub mod process;
pub mod site;
pub mod status;

pub use controller::{Controller, Operation, Outcome};
pub use error::{ErrorKind, Result, TestSiteError};
pub use status::LifecycleStatus;
