//! Weekly report email delivery over SMTP.

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::config::SmtpSettings;
use crate::error::ApiError;
use crate::report::{REPORT_TITLE, render_html_summary, render_pdf, weekly_report};
use crate::store::DocumentStore;

pub const ATTACHMENT_NAME: &str = "weekly_report.pdf";

/// SMTP sender built once at startup. Without SMTP settings the mailer is
/// disabled and every send fails with the "not configured" condition; it
/// never falls back to logging the report instead.
pub struct ReportMailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Option<Mailbox>,
}

impl ReportMailer {
    pub fn new(settings: Option<&SmtpSettings>) -> Result<Self, ApiError> {
        let Some(settings) = settings else {
            return Ok(Self::disabled());
        };
        let tls = TlsParameters::new(settings.host.clone())?;
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)?
            .port(settings.port)
            .tls(Tls::Required(tls));
        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }
        let from = settings.from.parse::<Mailbox>()?;
        info!(host = %settings.host, port = settings.port, "mail transport configured");
        Ok(Self { transport: Some(builder.build()), from: Some(from) })
    }

    pub fn disabled() -> Self {
        Self { transport: None, from: None }
    }

    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    async fn send(
        &self,
        to: &str,
        subject: &str,
        html_body: String,
        pdf: Vec<u8>,
    ) -> Result<(), ApiError> {
        let (Some(transport), Some(from)) = (&self.transport, &self.from) else {
            return Err(ApiError::MailNotConfigured);
        };
        let pdf_type = ContentType::parse("application/pdf")
            .map_err(|e| ApiError::Internal(format!("invalid attachment content type: {e}")))?;
        let message = Message::builder()
            .from(from.clone())
            .to(to.parse::<Mailbox>()?)
            .subject(subject)
            .multipart(
                MultiPart::mixed()
                    .singlepart(
                        SinglePart::builder().header(ContentType::TEXT_HTML).body(html_body),
                    )
                    .singlepart(Attachment::new(ATTACHMENT_NAME.to_string()).body(pdf, pdf_type)),
            )?;
        transport.send(message).await?;
        Ok(())
    }
}

/// Aggregate, render and email one parent's weekly report: HTML summary in
/// the body, the PDF as an attachment. Configuration is checked before any
/// store access so an unconfigured deployment fails fast.
pub async fn send_weekly_report_email(
    store: &dyn DocumentStore,
    mailer: &ReportMailer,
    parent_id: &str,
    to_email: &str,
) -> Result<(), ApiError> {
    if !mailer.is_configured() {
        return Err(ApiError::MailNotConfigured);
    }
    let report = weekly_report(store, parent_id).await?;
    let pdf = render_pdf(&report)?;
    let html = render_html_summary(&report);
    mailer.send(to_email, REPORT_TITLE, html, pdf).await?;
    info!(parent = %parent_id, to = %to_email, "weekly report email sent");
    Ok(())
}
