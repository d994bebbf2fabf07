//! Notifier that only writes messages to the log

use async_trait::async_trait;
use tracing::info;

use crate::domain::notification::{AnnouncementReport, Notifier};
use crate::domain::team::Team;
use crate::domain::user::User;
use crate::domain::DomainError;
use crate::infrastructure::observability::record_notification;

use super::templates::MailTemplates;

/// Used when no mail API is configured; every send succeeds
#[derive(Debug, Clone, Default)]
pub struct LogNotifier {
    templates: MailTemplates,
}

impl LogNotifier {
    pub fn new(templates: MailTemplates) -> Self {
        Self { templates }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_invitation(&self, team: &Team, email: &str) -> Result<(), DomainError> {
        let message = self.templates.invitation(team);
        info!(
            to = %email,
            subject = %message.subject,
            link = %self.templates.invitation_link(team.token()),
            "Mail delivery disabled, invitation logged"
        );
        record_notification("invitation", true);
        Ok(())
    }

    async fn send_password_reset(&self, user: &User, token: &str) -> Result<(), DomainError> {
        info!(
            to = %user.email(),
            link = %self.templates.reset_link(token),
            "Mail delivery disabled, password reset logged"
        );
        record_notification("password_reset", true);
        Ok(())
    }

    async fn send_announcement(
        &self,
        subject: &str,
        _body: &str,
        emails: &[String],
    ) -> Result<AnnouncementReport, DomainError> {
        let mut report = AnnouncementReport::default();
        for email in emails {
            info!(to = %email, subject = %subject, "Mail delivery disabled, announcement logged");
            report.record(true);
        }
        record_notification("announcement", true);
        Ok(report)
    }
}
