//! Command-line interface.

use std::fmt;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "smig",
    version,
    about = "Migrate per-owner video files to Bunny Stream"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Selected command; no subcommand means `migrate`.
    pub fn selected(&self) -> Command {
        self.command.unwrap_or(Command::Migrate)
    }
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Rename files under the root directory and write the queue file
    Scan,
    /// Upload every row of an existing queue file
    Run,
    /// Scan, then run (default)
    Migrate,
}

impl Command {
    /// Whether the command talks to the hosting service.
    pub fn needs_remote(&self) -> bool {
        matches!(self, Command::Run | Command::Migrate)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::Scan => "scan",
            Command::Run => "run",
            Command::Migrate => "migrate",
        };
        f.write_str(name)
    }
}
