//! Outgoing participant notifications

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::team::Team;
use crate::domain::user::User;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Recipients of an announcement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    /// Every registered user
    #[default]
    All,
    /// Users who subscribed to training sessions
    Formation,
}

/// Outcome of a bulk announcement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncementReport {
    pub recipients: usize,
    pub delivered: usize,
    pub failed: usize,
}

impl AnnouncementReport {
    pub fn record(&mut self, delivered: bool) {
        self.recipients += 1;
        if delivered {
            self.delivered += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// Sends invitation, password reset and announcement messages
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Invite `email` to join `team` with its join token
    async fn send_invitation(&self, team: &Team, email: &str) -> Result<(), DomainError>;

    /// Send a password reset link
    async fn send_password_reset(&self, user: &User, token: &str) -> Result<(), DomainError>;

    /// Send the same message to every address; each address is attempted
    /// independently
    async fn send_announcement(
        &self,
        subject: &str,
        body: &str,
        emails: &[String],
    ) -> Result<AnnouncementReport, DomainError>;
}
