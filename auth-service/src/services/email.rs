use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, Message,
    SmtpTransport, Transport,
};
use service_core::async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

use crate::config::{ResetConfig, SmtpConfig};

#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send_password_reset_email(
        &self,
        to_email: &str,
        uid: &str,
        token: &str,
    ) -> Result<(), anyhow::Error>;
}

#[derive(Clone)]
pub struct SmtpEmailService {
    mailer: SmtpTransport,
    from_email: String,
    frontend_base_url: String,
}

impl SmtpEmailService {
    pub fn new(smtp: &SmtpConfig, reset: &ResetConfig) -> Result<Self, anyhow::Error> {
        let creds = Credentials::new(smtp.user.clone(), smtp.password.clone());

        let mailer = SmtpTransport::relay(&smtp.host)
            .map_err(|e| anyhow::anyhow!("SMTP relay setup failed: {}", e))?
            .credentials(creds)
            .port(587)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        tracing::info!(host = %smtp.host, "Email service initialized");

        Ok(Self {
            mailer,
            from_email: smtp.from_email.clone(),
            frontend_base_url: reset.frontend_base_url.clone(),
        })
    }

    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        plain_body: &str,
        html_body: &str,
    ) -> Result<(), anyhow::Error> {
        let email = Message::builder()
            .from(self
                .from_email
                .parse()
                .map_err(|e: lettre::address::AddressError| anyhow::Error::from(e))?)
            .to(to_email
                .parse()
                .map_err(|e: lettre::address::AddressError| anyhow::Error::from(e))?)
            .subject(subject)
            .multipart(
                lettre::message::MultiPart::alternative()
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(plain_body.to_string()),
                    )
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        // Send email in blocking thread pool to avoid blocking async runtime
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email)).await?;

        match result {
            Ok(_) => {
                tracing::info!(
                    to = %to_email,
                    subject = %subject,
                    "Email sent successfully"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    error = %e.to_string(),
                    to = %to_email,
                    "Failed to send email"
                );
                Err(anyhow::anyhow!("Failed to send email: {}", e))
            }
        }
    }
}

#[async_trait]
impl EmailProvider for SmtpEmailService {
    async fn send_password_reset_email(
        &self,
        to_email: &str,
        uid: &str,
        token: &str,
    ) -> Result<(), anyhow::Error> {
        let reset_link = format!("{}/reset-password/{}/{}/", self.frontend_base_url, uid, token);

        let html_body = format!(
            r###"<html>
                <body style="font-family: Arial, sans-serif;">
                    <h2>Password Reset Request</h2>
                    <p>We received a request to reset your password. Click the link below to set a new password:</p>
                    <p>
                        <a href="{}" style="background-color: #2196F3; color: white; padding: 14px 20px; text-decoration: none; border-radius: 4px;">
                            Reset Password
                        </a>
                    </p>
                    <p style="color: #666; font-size: 12px;">
                        This link will expire shortly. If you didn't request this, please ignore this email.
                    </p>
                </body>
            </html>
            "###,
            reset_link
        );

        let plain_body = format!(
            "Password Reset Request\n\nWe received a request to reset your password. Please visit the following link to set a new password:\n\n{}\n\nThis link will expire shortly. If you didn't request this, please ignore this email.",
            reset_link
        );

        self.send_email(to_email, "Reset Your Password", &plain_body, &html_body)
            .await
    }
}

/// Records the last reset email instead of sending it. Test use only.
#[derive(Default)]
pub struct MockEmailService {
    last_message: Mutex<Option<ResetEmail>>,
}

#[derive(Debug, Clone)]
pub struct ResetEmail {
    pub to: String,
    pub uid: String,
    pub token: String,
}

impl MockEmailService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_message(&self) -> Option<ResetEmail> {
        self.last_message
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl EmailProvider for MockEmailService {
    async fn send_password_reset_email(
        &self,
        to_email: &str,
        uid: &str,
        token: &str,
    ) -> Result<(), anyhow::Error> {
        let mut last = self
            .last_message
            .lock()
            .map_err(|_| anyhow::anyhow!("Mock email lock poisoned"))?;
        *last = Some(ResetEmail {
            to: to_email.to_string(),
            uid: uid.to_string(),
            token: token.to_string(),
        });
        Ok(())
    }
}
