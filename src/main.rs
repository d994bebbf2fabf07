use clap::Parser;
use hackathon_api::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => cli::serve::run().await,
        Command::Migrate => cli::migrate::run().await,
        Command::PromoteAdmin(args) => cli::promote_admin::run(args).await,
    }
}
