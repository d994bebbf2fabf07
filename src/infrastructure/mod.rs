//! Infrastructure layer - storage backends, services and external integrations

pub mod auth;
pub mod logging;
pub mod membership;
pub mod notification;
pub mod observability;
pub mod storage;
pub mod team;
pub mod user;
