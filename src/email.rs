use anyhow::Context;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use tracing::debug;

use crate::model::configuration::SmtpConfiguration;
use crate::services::digest::DigestError;

/// STARTTLS submission client for the digest mails.
///
/// One session per send: connect, upgrade, authenticate, send, close.
/// Delivery beyond the submission hand-off is not this crate's problem.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(configuration: &SmtpConfiguration) -> anyhow::Result<Self> {
        let credentials = Credentials::new(
            configuration.username.clone(),
            configuration.password.expose_secret().clone(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&configuration.host)
            .context("Could not build the SMTP transport")?
            .port(configuration.port)
            .credentials(credentials)
            .build();

        let from = configuration
            .from
            .parse()
            .with_context(|| format!("Invalid sender address {}", configuration.from))?;

        Ok(SmtpMailer { transport, from })
    }

    #[tracing::instrument(skip(self, body))]
    pub async fn send(&self, recipient: &str, subject: &str, body: String) -> Result<(), DigestError> {
        let to: Mailbox = recipient
            .parse()
            .map_err(|_| DigestError::InvalidRecipient(recipient.to_string()))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)?;

        self.transport.send(message).await?;
        debug!("Digest sent to {recipient}");

        Ok(())
    }
}
