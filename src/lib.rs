//! Hackathon registration API
//!
//! Participant accounts, teams with join tokens and invitations, caution
//! based team validity, voting and admin operations, served over HTTP with
//! JWT authentication.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use domain::{CvStorage, MembershipMutator, Notifier, TeamRepository, UserRepository};
use infrastructure::{
    auth::{AuthService, JwtConfig, JwtService, ResetTokenSigner},
    membership::{InMemoryMembershipStore, PostgresMembershipStore},
    notification::{HttpMailNotifier, LogNotifier, MailTemplates},
    storage::{run_migrations, InMemoryDatabase, PostgresConfig},
    team::{InMemoryTeamRepository, PostgresTeamRepository, TeamRules, TeamService},
    user::{
        Argon2Hasher, FsCvStorage, InMemoryUserRepository, PostgresUserRepository, UserService,
    },
};
use tracing::{info, warn};

use crate::config::StorageBackend;

/// Persistence collaborators shared by the services
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserRepository>,
    pub teams: Arc<dyn TeamRepository>,
    pub membership: Arc<dyn MembershipMutator>,
}

impl Stores {
    /// All three stores over one in-memory database
    pub fn in_memory() -> Self {
        let db = InMemoryDatabase::new();
        Self {
            users: Arc::new(InMemoryUserRepository::new(db.clone())),
            teams: Arc::new(InMemoryTeamRepository::new(db.clone())),
            membership: Arc::new(InMemoryMembershipStore::new(db)),
        }
    }

    /// PostgreSQL stores; pending migrations are applied first
    pub async fn postgres(config: &AppConfig) -> anyhow::Result<Self> {
        info!("Connecting to PostgreSQL...");
        let pool = PostgresConfig::from(&config.storage).connect().await?;
        let applied = run_migrations(&pool).await?;
        info!(applied, "PostgreSQL ready");

        Ok(Self {
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            teams: Arc::new(PostgresTeamRepository::new(pool.clone())),
            membership: Arc::new(PostgresMembershipStore::new(pool)),
        })
    }
}

/// Fully wired services
#[derive(Clone)]
pub struct Services {
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub teams: Arc<TeamService>,
    pub max_cv_bytes: usize,
}

impl Services {
    /// Wire services over the given stores, CV storage and notifier
    pub fn build(
        config: &AppConfig,
        stores: Stores,
        cv_storage: Arc<dyn CvStorage>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let hasher = Arc::new(Argon2Hasher::new());

        let teams = Arc::new(TeamService::new(
            stores.teams.clone(),
            stores.users.clone(),
            stores.membership.clone(),
            notifier.clone(),
            TeamRules {
                max_members: config.teams.max_members,
                owner_leave_policy: config.teams.owner_leave_policy,
            },
        ));

        let users = Arc::new(UserService::new(
            stores.users.clone(),
            stores.membership,
            teams.clone(),
            hasher.clone(),
            cv_storage,
            notifier.clone(),
            config.uploads.max_cv_bytes,
        ));

        let auth = Arc::new(AuthService::new(
            stores.users,
            hasher,
            Arc::new(JwtService::new(JwtConfig::from(&config.auth))),
            ResetTokenSigner::new(
                config.auth.jwt_secret.as_bytes(),
                config.auth.reset_token_ttl_minutes,
            ),
            notifier,
        ));

        Self {
            auth,
            users,
            teams,
            max_cv_bytes: config.uploads.max_cv_bytes,
        }
    }

    pub fn into_state(self) -> AppState {
        AppState {
            auth_service: self.auth,
            user_service: self.users,
            team_service: self.teams,
            max_cv_bytes: self.max_cv_bytes,
        }
    }
}

/// Pick the notifier: real mail when enabled, log-only otherwise
pub fn create_notifier(config: &AppConfig) -> anyhow::Result<Arc<dyn Notifier>> {
    let templates = MailTemplates {
        frontend_url: config.mail.frontend_url.clone(),
        caution_amount: config.mail.caution_amount.clone(),
        caution_account: config.mail.caution_account.clone(),
        max_members: config.teams.max_members,
    };

    if config.mail.enabled {
        info!(api_url = %config.mail.api_url, "Mail delivery enabled");
        Ok(Arc::new(HttpMailNotifier::from_config(&config.mail, templates)?))
    } else {
        warn!("Mail delivery disabled; messages will only be logged");
        Ok(Arc::new(LogNotifier::new(templates)))
    }
}

/// Build every service from configuration
pub async fn create_services(config: &AppConfig) -> anyhow::Result<Services> {
    info!(backend = ?config.storage.backend, "Storage backend");

    let stores = match config.storage.backend {
        StorageBackend::Memory => Stores::in_memory(),
        StorageBackend::Postgres => Stores::postgres(config).await?,
    };

    let cv_storage: Arc<dyn CvStorage> = Arc::new(FsCvStorage::new(&config.uploads.cv_dir));
    let notifier = create_notifier(config)?;

    Ok(Services::build(config, stores, cv_storage, notifier))
}

/// Create the application state with default configuration
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    Ok(create_services(config).await?.into_state())
}
