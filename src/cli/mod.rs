//! Command line entry points
//!
//! - `serve`: run the HTTP API
//! - `migrate`: apply PostgreSQL migrations and exit
//! - `promote-admin`: grant admin rights to an existing account

pub mod migrate;
pub mod promote_admin;
pub mod serve;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Hackathon registration API
#[derive(Parser)]
#[command(name = "hackathon-api")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Apply pending database migrations and exit
    Migrate,

    /// Grant admin rights to a registered user
    PromoteAdmin(promote_admin::PromoteAdminArgs),
}

/// Load `.env` and configuration, then install the log subscriber
pub(crate) fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging);

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["hackathon-api", "serve"]).unwrap();
        assert!(matches!(cli.command, Command::Serve));

        let cli =
            Cli::try_parse_from(["hackathon-api", "promote-admin", "--email", "ada@example.com"])
                .unwrap();
        match cli.command {
            Command::PromoteAdmin(args) => assert_eq!(args.email, "ada@example.com"),
            _ => panic!("expected promote-admin"),
        }

        assert!(Cli::try_parse_from(["hackathon-api", "promote-admin"]).is_err());
    }
}
