use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};
use std::env;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Failed to build email message: {0}")]
    MessageBuild(String),
    #[error("Failed to send email: {0}")]
    SendFailed(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send_activation_email(&self, to_email: &str, token: &str) -> Result<(), EmailError>;
    async fn send_password_reset_email(
        &self,
        to_email: &str,
        token: &str,
    ) -> Result<(), EmailError>;
}

pub fn activation_url(base_url: &str, token: &str) -> String {
    format!("{}/activate/{}", base_url.trim_end_matches('/'), token)
}

pub fn password_reset_url(base_url: &str, token: &str) -> String {
    format!("{}/reset-password/{}", base_url.trim_end_matches('/'), token)
}

/// Logs outgoing mail instead of sending it.
pub struct MockEmailService {
    base_url: String,
}

impl MockEmailService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl EmailService for MockEmailService {
    async fn send_activation_email(&self, to_email: &str, token: &str) -> Result<(), EmailError> {
        tracing::info!(
            to = %to_email,
            link = %activation_url(&self.base_url, token),
            "[mock email] account activation"
        );
        Ok(())
    }

    async fn send_password_reset_email(
        &self,
        to_email: &str,
        token: &str,
    ) -> Result<(), EmailError> {
        tracing::info!(
            to = %to_email,
            link = %password_reset_url(&self.base_url, token),
            "[mock email] password reset"
        );
        Ok(())
    }
}

pub struct SmtpEmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_email: String,
    from_name: String,
    base_url: String,
    token_ttl_hours: i64,
}

impl SmtpEmailService {
    pub fn from_env(base_url: &str, token_ttl_hours: i64) -> Result<Self, EmailError> {
        let smtp_host = env::var("SMTP_HOST")
            .map_err(|_| EmailError::ConfigError("SMTP_HOST not set".to_string()))?;
        let smtp_port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse::<u16>()
            .map_err(|_| EmailError::ConfigError("Invalid SMTP_PORT".to_string()))?;
        let smtp_username = env::var("SMTP_USERNAME")
            .map_err(|_| EmailError::ConfigError("SMTP_USERNAME not set".to_string()))?;
        let smtp_password = env::var("SMTP_PASSWORD")
            .map_err(|_| EmailError::ConfigError("SMTP_PASSWORD not set".to_string()))?;
        let from_email = env::var("SMTP_FROM_EMAIL")
            .map_err(|_| EmailError::ConfigError("SMTP_FROM_EMAIL not set".to_string()))?;
        let from_name = env::var("SMTP_FROM_NAME").unwrap_or_else(|_| "Accounts".to_string());
        let encryption = env::var("SMTP_ENCRYPTION").unwrap_or_else(|_| "starttls".to_string());

        let credentials = Credentials::new(smtp_username, smtp_password);

        let mailer = match encryption.to_lowercase().as_str() {
            "tls" => AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp_host)
                .map_err(|e| EmailError::ConfigError(format!("SMTP relay error: {}", e)))?
                .port(smtp_port)
                .credentials(credentials)
                .build(),
            "starttls" => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp_host)
                .map_err(|e| EmailError::ConfigError(format!("SMTP starttls error: {}", e)))?
                .port(smtp_port)
                .credentials(credentials)
                .build(),
            "none" => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp_host)
                .port(smtp_port)
                .credentials(credentials)
                .build(),
            other => {
                return Err(EmailError::ConfigError(format!(
                    "Invalid SMTP_ENCRYPTION value: {}. Use 'tls', 'starttls', or 'none'",
                    other
                )))
            }
        };

        Ok(Self {
            mailer,
            from_email,
            from_name,
            base_url: base_url.to_string(),
            token_ttl_hours,
        })
    }

    async fn deliver(
        &self,
        to_email: &str,
        subject: &str,
        html_body: String,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                format!("{} <{}>", self.from_name, self.from_email)
                    .parse()
                    .map_err(|e| {
                        EmailError::MessageBuild(format!("Invalid from address: {}", e))
                    })?,
            )
            .to(to_email
                .parse()
                .map_err(|e| EmailError::MessageBuild(format!("Invalid to address: {}", e)))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body)
            .map_err(|e| EmailError::MessageBuild(e.to_string()))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| EmailError::SendFailed(e.to_string()))?;

        Ok(())
    }
}

fn link_email_body(heading: &str, intro: &str, button: &str, url: &str, ttl_hours: i64) -> String {
    format!(
        r#"
<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
</head>
<body style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h1 style="color: #333;">{heading}</h1>
    <p>{intro}</p>
    <p style="text-align: center; margin: 30px 0;">
        <a href="{url}" style="background-color: #4CAF50; color: white; padding: 12px 24px; text-decoration: none; border-radius: 4px; display: inline-block;">{button}</a>
    </p>
    <p style="color: #666; font-size: 14px;">Or copy and paste this link into your browser:</p>
    <p style="color: #666; font-size: 14px; word-break: break-all;">{url}</p>
    <p style="color: #999; font-size: 12px; margin-top: 40px;">This link will expire in {ttl_hours} hours.</p>
</body>
</html>
"#
    )
}

#[async_trait]
impl EmailService for SmtpEmailService {
    async fn send_activation_email(&self, to_email: &str, token: &str) -> Result<(), EmailError> {
        let url = activation_url(&self.base_url, token);
        let body = link_email_body(
            "Activate your account",
            "Thank you for signing up. Please confirm your email address to activate your account:",
            "Activate Account",
            &url,
            self.token_ttl_hours,
        );
        self.deliver(to_email, "Activate your account", body).await
    }

    async fn send_password_reset_email(
        &self,
        to_email: &str,
        token: &str,
    ) -> Result<(), EmailError> {
        let url = password_reset_url(&self.base_url, token);
        let body = link_email_body(
            "Reset your password",
            "We received a request to reset your password. If it wasn't you, ignore this email.",
            "Reset Password",
            &url,
            self.token_ttl_hours,
        );
        self.deliver(to_email, "Reset your password", body).await
    }
}

pub fn create_email_service(base_url: &str, token_ttl_hours: i64) -> Arc<dyn EmailService> {
    if env::var("SMTP_HOST").is_ok() {
        match SmtpEmailService::from_env(base_url, token_ttl_hours) {
            Ok(service) => {
                tracing::info!("Using SMTP email service");
                Arc::new(service)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to initialize SMTP email service: {}. Falling back to mock service",
                    e
                );
                Arc::new(MockEmailService::new(base_url))
            }
        }
    } else {
        tracing::info!("SMTP not configured. Using mock email service (emails will be logged)");
        Arc::new(MockEmailService::new(base_url))
    }
}
