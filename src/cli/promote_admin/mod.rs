//! Promote-admin command - grants admin rights to a registered user

use clap::Args;
use tracing::info;

#[derive(Args, Debug)]
pub struct PromoteAdminArgs {
    /// Email address of the account to promote
    #[arg(long)]
    pub email: String,
}

pub async fn run(args: PromoteAdminArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let services = crate::create_services(&config).await?;

    let user = services.users.grant_admin(&args.email).await?;
    info!(user_id = %user.id(), email = %user.email(), "Account is now an admin");

    Ok(())
}
