//! Virtual Photobooth CLI - Database migrations and record inspection.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! photobooth-cli migrate
//!
//! # List departments with records
//! photobooth-cli departments
//!
//! # Show the latest records of a department
//! photobooth-cli records Engineering --limit 20
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "photobooth-cli")]
#[command(author, version, about = "Virtual Photobooth CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// List departments that have received uploads
    Departments,
    /// Show the newest records of a department
    Records {
        /// Department name, exactly as registered
        department: String,

        /// Maximum number of records to show
        #[arg(short, long, default_value_t = 20, value_parser = clap::value_parser!(i64).range(1..))]
        limit: i64,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Departments => commands::records::departments().await?,
        Commands::Records { department, limit } => {
            commands::records::list(&department, limit).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_records_limit_defaults() {
        let cli = Cli::try_parse_from(["photobooth-cli", "records", "Engineering"]).unwrap();
        match cli.command {
            Commands::Records { department, limit } => {
                assert_eq!(department, "Engineering");
                assert_eq!(limit, 20);
            }
            _ => panic!("expected records command"),
        }
    }

    #[test]
    fn test_records_rejects_zero_limit() {
        assert!(Cli::try_parse_from(["photobooth-cli", "records", "Engineering", "--limit", "0"]).is_err());
    }
}
