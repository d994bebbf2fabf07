//! Notification infrastructure
//!
//! Mail rendering plus the two [`Notifier`](crate::domain::Notifier)
//! backends: the HTTP mail API client and a logging fallback.

mod http_mail;
mod log_notifier;
mod templates;

pub use http_mail::HttpMailNotifier;
pub use log_notifier::LogNotifier;
pub use templates::{MailMessage, MailTemplates};
