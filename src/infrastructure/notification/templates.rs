//! Mail bodies for invitations, password resets and announcements

use crate::domain::team::Team;
use crate::domain::user::User;

/// A rendered mail, ready to be sent to one recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Event details shared by every template
#[derive(Debug, Clone)]
pub struct MailTemplates {
    pub frontend_url: String,
    pub caution_amount: String,
    pub caution_account: String,
    pub max_members: usize,
}

impl Default for MailTemplates {
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:3000".to_string(),
            caution_amount: "20 EUR".to_string(),
            caution_account: String::new(),
            max_members: 5,
        }
    }
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

impl MailTemplates {
    fn base_url(&self) -> &str {
        self.frontend_url.trim_end_matches('/')
    }

    pub fn invitation_link(&self, token: &str) -> String {
        format!("{}/team/invite/{}", self.base_url(), token)
    }

    pub fn reset_link(&self, token: &str) -> String {
        format!("{}/reset-password/{}", self.base_url(), token)
    }

    pub fn invitation(&self, team: &Team) -> MailMessage {
        let link = self.invitation_link(team.token());
        let site = self.base_url();

        let text = format!(
            "You have been invited to join a team at the hackathon.\n\
             Official site: {site}\n\n\
             Team: {name}\n\
             Join the team by following {link} or by entering the invitation code \
             in the \"My team\" section of the site.\n\n\
             Invitation code: {token}\n\n\
             You will be asked to create an account before joining.\n\n\
             To confirm your participation, please pay the caution:\n\
             - Amount: {amount}\n\
             - Account: {account}\n\
             - Reference: LAST NAME First name\n\
             A team takes part once at least one of its members has paid.\n\
             A team has at most {max} members.",
            name = team.name(),
            token = team.token(),
            amount = self.caution_amount,
            account = self.caution_account,
            max = self.max_members,
        );

        let html = format!(
            "<h2>You have been invited to join a team at the hackathon</h2>\
             <p>Official site: <a href=\"{site}\">{site}</a></p>\
             <ul><li>Team: {name}</li></ul>\
             <p>Join the team by following this <a href=\"{link}\">link</a> or by entering \
             the invitation code in the \"My team\" section of the site.</p>\
             <p>Invitation code: <strong>{token}</strong></p>\
             <hr/>\
             <p>You will be asked to create an account before joining.</p>\
             <p>To confirm your participation, please pay the caution:</p>\
             <ul><li>Amount: {amount}</li><li>Account: <b>{account}</b></li>\
             <li>Reference: <b>LAST NAME First name</b></li></ul>\
             <p>A team takes part once at least one of its members has paid.</p>\
             <p>A team has at most {max} members.</p>",
            name = escape_html(team.name()),
            token = team.token(),
            amount = escape_html(&self.caution_amount),
            account = escape_html(&self.caution_account),
            max = self.max_members,
        );

        MailMessage {
            subject: format!("Hackathon - Invitation to join {}", team.name()),
            text,
            html,
        }
    }

    pub fn password_reset(&self, user: &User, token: &str) -> MailMessage {
        let link = self.reset_link(token);

        let text = format!(
            "Hello {name},\n\n\
             A password reset was requested for your account.\n\
             Choose a new password by following {link}\n\n\
             If you did not ask for this, you can ignore this message.",
            name = user.first_name(),
        );

        let html = format!(
            "<p>Hello {name},</p>\
             <p>A password reset was requested for your account.</p>\
             <p>Choose a new password by following this <a href=\"{link}\">link</a>.</p>\
             <p>If you did not ask for this, you can ignore this message.</p>",
            name = escape_html(user.first_name()),
        );

        MailMessage {
            subject: "Hackathon - Password reset".to_string(),
            text,
            html,
        }
    }

    pub fn announcement(&self, subject: &str, body: &str) -> MailMessage {
        let html = body
            .lines()
            .map(escape_html)
            .collect::<Vec<_>>()
            .join("<br/>");

        MailMessage {
            subject: subject.to_string(),
            text: body.to_string(),
            html: format!("<p>{}</p>", html),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::team::TeamId;
    use crate::domain::user::{UserId, UserProfile};

    fn templates() -> MailTemplates {
        MailTemplates {
            frontend_url: "https://hack.example.com/".to_string(),
            caution_amount: "20 EUR".to_string(),
            caution_account: "BE00 0000 0000 0000".to_string(),
            max_members: 5,
        }
    }

    fn team() -> Team {
        Team::new(
            TeamId::generate(),
            "Rockets <3",
            "",
            "",
            "tok_abc",
        )
        .unwrap()
    }

    #[test]
    fn test_invitation_contains_link_and_caution() {
        let message = templates().invitation(&team());

        assert!(message
            .text
            .contains("https://hack.example.com/team/invite/tok_abc"));
        assert!(message.text.contains("BE00 0000 0000 0000"));
        assert!(message.text.contains("20 EUR"));
        assert!(message.html.contains("Rockets &lt;3"));
        assert!(!message.html.contains("Rockets <3"));
    }

    #[test]
    fn test_reset_link() {
        let user = User::new(
            UserId::generate(),
            "ada@example.com",
            "hash",
            UserProfile {
                first_name: "Ada".to_string(),
                ..Default::default()
            },
        );

        let message = templates().password_reset(&user, "reset123");
        assert!(message
            .text
            .contains("https://hack.example.com/reset-password/reset123"));
        assert!(message.text.starts_with("Hello Ada"));
    }

    #[test]
    fn test_announcement_html() {
        let message = templates().announcement("News", "line one\n<b>two</b>");

        assert_eq!(message.subject, "News");
        assert_eq!(message.html, "<p>line one<br/>&lt;b&gt;two&lt;/b&gt;</p>");
    }
}
