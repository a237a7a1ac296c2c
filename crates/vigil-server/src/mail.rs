//! Mail transports: SMTP via `lettre`, and a log-only stand-in.

use lettre::{
  AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
  message::{Mailbox, header::ContentType},
  transport::smtp::authentication::Credentials,
};
use vigil_core::directory::{MailTransport, OutgoingMail};

use crate::{SmtpConfig, error::Result};

/// The transport the binary runs with, chosen at startup.
pub enum Mailer {
  Smtp(SmtpMailer),
  Log(LogMailer),
}

impl Mailer {
  /// SMTP when configured and not a dry run, otherwise log-only.
  pub fn from_config(smtp: Option<&SmtpConfig>, dry_run: bool) -> Result<Self> {
    match smtp {
      Some(config) if !dry_run => Ok(Self::Smtp(SmtpMailer::new(config)?)),
      _ => Ok(Self::Log(LogMailer)),
    }
  }
}

impl MailTransport for Mailer {
  async fn send(&self, mail: &OutgoingMail) -> vigil_core::Result<()> {
    match self {
      Self::Smtp(smtp) => smtp.send(mail).await,
      Self::Log(log) => log.send(mail).await,
    }
  }
}

// ─── SMTP ────────────────────────────────────────────────────────────────────

pub struct SmtpMailer {
  transport: AsyncSmtpTransport<Tokio1Executor>,
  from:      Mailbox,
}

impl SmtpMailer {
  /// STARTTLS relay on `config.port`. Credentials are sent only when a
  /// username is configured.
  pub fn new(config: &SmtpConfig) -> Result<Self> {
    let from: Mailbox = config.from.parse()?;
    let mut builder =
      AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?.port(config.port);
    if !config.username.is_empty() {
      builder = builder.credentials(Credentials::new(
        config.username.clone(),
        config.password.clone(),
      ));
    }
    Ok(Self {
      transport: builder.build(),
      from,
    })
  }

  fn build_message(&self, mail: &OutgoingMail) -> vigil_core::Result<Message> {
    let to: Mailbox = mail.to.parse().map_err(|e| {
      vigil_core::Error::Transport(format!("invalid recipient {:?}: {e}", mail.to))
    })?;
    Message::builder()
      .from(self.from.clone())
      .to(to)
      .subject(mail.subject.clone())
      .header(ContentType::TEXT_PLAIN)
      .body(mail.body.clone())
      .map_err(|e| vigil_core::Error::Transport(format!("could not build message: {e}")))
  }
}

impl MailTransport for SmtpMailer {
  async fn send(&self, mail: &OutgoingMail) -> vigil_core::Result<()> {
    let message = self.build_message(mail)?;
    self
      .transport
      .send(message)
      .await
      .map_err(|e| vigil_core::Error::Transport(e.to_string()))?;
    tracing::info!(to = %mail.to, subject = %mail.subject, "mail sent");
    Ok(())
  }
}

// ─── Log only ────────────────────────────────────────────────────────────────

/// Logs each message instead of sending it. Always succeeds.
pub struct LogMailer;

impl MailTransport for LogMailer {
  async fn send(&self, mail: &OutgoingMail) -> vigil_core::Result<()> {
    tracing::info!(
      to = %mail.to,
      subject = %mail.subject,
      body = %mail.body,
      "mail not sent (log-only transport)"
    );
    Ok(())
  }
}
