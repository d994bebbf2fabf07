//! Notifier backed by a transactional mail HTTP API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::MailConfig;
use crate::domain::notification::{AnnouncementReport, Notifier};
use crate::domain::team::Team;
use crate::domain::user::User;
use crate::domain::DomainError;
use crate::infrastructure::observability::record_notification;

use super::templates::{MailMessage, MailTemplates};

#[derive(Debug, Serialize)]
struct OutgoingMail<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
    html: &'a str,
}

/// Posts one JSON message per recipient to the mail API
#[derive(Debug, Clone)]
pub struct HttpMailNotifier {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
    templates: MailTemplates,
}

impl HttpMailNotifier {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        from: impl Into<String>,
        timeout: Duration,
        templates: MailTemplates,
    ) -> Result<Self, DomainError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            DomainError::configuration(format!("Failed to create mail HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
            from: from.into(),
            templates,
        })
    }

    pub fn from_config(config: &MailConfig, templates: MailTemplates) -> Result<Self, DomainError> {
        Self::new(
            config.api_url.clone(),
            config.api_key.clone(),
            config.from.clone(),
            Duration::from_secs(config.timeout_secs),
            templates,
        )
    }

    async fn deliver(&self, to: &str, message: &MailMessage) -> Result<(), DomainError> {
        let body = OutgoingMail {
            from: &self.from,
            to,
            subject: &message.subject,
            text: &message.text,
            html: &message.html,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() {
                    "request timed out".to_string()
                } else if e.is_connect() {
                    "connection failed".to_string()
                } else {
                    e.to_string()
                };
                DomainError::notification(format!("Mail API request failed: {}", reason))
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(200)
                .collect();
            return Err(DomainError::notification(format!(
                "Mail API returned {}: {}",
                status.as_u16(),
                detail
            )));
        }

        debug!(subject = %message.subject, "Mail accepted by API");
        Ok(())
    }
}

#[async_trait]
impl Notifier for HttpMailNotifier {
    async fn send_invitation(&self, team: &Team, email: &str) -> Result<(), DomainError> {
        let result = self.deliver(email, &self.templates.invitation(team)).await;
        record_notification("invitation", result.is_ok());
        result
    }

    async fn send_password_reset(&self, user: &User, token: &str) -> Result<(), DomainError> {
        let result = self
            .deliver(user.email(), &self.templates.password_reset(user, token))
            .await;
        record_notification("password_reset", result.is_ok());
        result
    }

    async fn send_announcement(
        &self,
        subject: &str,
        body: &str,
        emails: &[String],
    ) -> Result<AnnouncementReport, DomainError> {
        let message = self.templates.announcement(subject, body);
        let mut report = AnnouncementReport::default();

        for email in emails {
            let result = self.deliver(email, &message).await;
            if let Err(e) = &result {
                warn!(email = %email, error = %e, "Announcement delivery failed");
            }
            record_notification("announcement", result.is_ok());
            report.record(result.is_ok());
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::team::TeamId;
    use crate::domain::user::{UserId, UserProfile};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn notifier(server: &MockServer) -> HttpMailNotifier {
        HttpMailNotifier::new(
            format!("{}/v1/send", server.uri()),
            "test-key",
            "hackathon@example.com",
            Duration::from_secs(5),
            MailTemplates::default(),
        )
        .unwrap()
    }

    fn team() -> Team {
        Team::new(TeamId::generate(), "Rockets", "", "", "join-token").unwrap()
    }

    #[tokio::test]
    async fn test_invitation_posts_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/send"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "from": "hackathon@example.com",
                "to": "friend@example.com"
            })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        notifier(&server)
            .send_invitation(&team(), "friend@example.com")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_api_error_is_notification_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let user = User::new(
            UserId::generate(),
            "ada@example.com",
            "hash",
            UserProfile::default(),
        );

        let result = notifier(&server).send_password_reset(&user, "tok").await;
        match result {
            Err(DomainError::Notification { message }) => assert!(message.contains("500")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_announcement_counts_each_recipient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({ "to": "bounce@example.com" })))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let emails = vec![
            "a@example.com".to_string(),
            "bounce@example.com".to_string(),
            "b@example.com".to_string(),
        ];

        let report = notifier(&server)
            .send_announcement("News", "Hello", &emails)
            .await
            .unwrap();

        assert_eq!(
            report,
            AnnouncementReport {
                recipients: 3,
                delivered: 2,
                failed: 1
            }
        );
    }
}
