mod cmd;
mod exit;
mod output;
mod root;

use clap::{ArgGroup, Parser};
use std::path::PathBuf;
use testsite_core::Operation;

#[derive(Parser)]
#[command(
    name = "testsite",
    about = "Manage the acceptance test site: install, enable, disable, reset, uninstall",
    version
)]
#[command(group(
    ArgGroup::new("operation")
        .required(true)
        .args(["install", "enable", "disable", "uninstall", "reset", "diag", "setup", "status"]),
))]
struct Cli {
    /// Harness root holding testsite.yaml (default: search upward from cwd)
    #[arg(long, env = "TESTSITE_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, short = 'j')]
    json: bool,

    /// Install the test site for acceptance tests
    #[arg(long, short = 'i')]
    install: bool,

    /// Turn the test mode on
    #[arg(long, short = 'e')]
    enable: bool,

    /// Turn the test mode off
    #[arg(long, short = 'd')]
    disable: bool,

    /// Drop the test site database and dataroot
    #[arg(long, short = 'u')]
    uninstall: bool,

    /// Reinstall the test site database and dataroot from scratch
    #[arg(long, short = 'r')]
    reset: bool,

    /// Exit with the environment readiness code (0 = ready)
    #[arg(long)]
    diag: bool,

    /// Fetch missing tooling, install if needed, then enable
    #[arg(long)]
    setup: bool,

    /// Show the current lifecycle status
    #[arg(long)]
    status: bool,
}

/// What the user asked for, decided once from the flags.
#[derive(Debug, Clone, Copy)]
enum Command {
    Lifecycle(Operation),
    Diag,
    Status,
}

impl Cli {
    fn command(&self) -> Command {
        // clap's group guarantees exactly one flag is set
        if self.install {
            Command::Lifecycle(Operation::Install)
        } else if self.enable {
            Command::Lifecycle(Operation::Enable)
        } else if self.disable {
            Command::Lifecycle(Operation::Disable)
        } else if self.uninstall {
            Command::Lifecycle(Operation::Uninstall)
        } else if self.reset {
            Command::Lifecycle(Operation::Reset)
        } else if self.setup {
            Command::Lifecycle(Operation::Setup)
        } else if self.diag {
            Command::Diag
        } else {
            Command::Status
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let command = cli.command();

    let default_level = match command {
        Command::Lifecycle(Operation::Setup | Operation::Install | Operation::Reset) => {
            tracing::Level::INFO
        }
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match command {
        Command::Lifecycle(op) => cmd::lifecycle::run(&root, op, cli.json).map(|()| 0),
        Command::Diag => cmd::diag::run(&root, cli.json),
        Command::Status => cmd::status::run(&root, cli.json).map(|()| 0),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            let operation = match command {
                Command::Lifecycle(op) => Some(op),
                _ => None,
            };
            println!("error: {e:#}");
            if let Some(hint) = exit::hint(&e) {
                println!("{hint}");
            }
            std::process::exit(exit::code(operation, &e));
        }
    }
}
