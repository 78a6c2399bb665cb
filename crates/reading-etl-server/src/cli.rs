//! Command-line interface

use clap::{Parser, Subcommand};

/// Mongo-to-Postgres reading synchronizer
#[derive(Parser, Debug)]
#[command(name = "reading-etl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute (defaults to `serve`)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP service and the optional interval trigger
    Serve,

    /// Run exactly one sync cycle and print the outcome as JSON
    Sync {
        /// Override BATCH_SIZE for this run
        #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
        batch_size: Option<u64>,
    },
}

impl Cli {
    pub fn command(&self) -> &Commands {
        self.command.as_ref().unwrap_or(&Commands::Serve)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_serve() {
        let cli = Cli::try_parse_from(["reading-etl"]).unwrap();
        assert_eq!(cli.command(), &Commands::Serve);
    }

    #[test]
    fn test_sync_batch_size() {
        let cli = Cli::try_parse_from(["reading-etl", "sync", "--batch-size", "5"]).unwrap();
        assert_eq!(cli.command(), &Commands::Sync { batch_size: Some(5) });

        assert!(Cli::try_parse_from(["reading-etl", "sync", "--batch-size", "0"]).is_err());
    }
}
