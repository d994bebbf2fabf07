//! Team infrastructure implementations

mod postgres_repository;
mod repository;
mod service;
mod token;

pub use postgres_repository::PostgresTeamRepository;
pub use repository::InMemoryTeamRepository;
pub use service::{
    CreateTeamRequest, LeaveOutcome, TeamRules, TeamService, TeamWithMembers, UpdateTeamRequest,
};
pub use token::generate_join_token;

pub(crate) use postgres_repository::{insert_team, team_write_error};
pub(crate) use repository::ensure_unique;
