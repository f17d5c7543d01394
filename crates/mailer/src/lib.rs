//! SMTP delivery of rendered billing documents.
//!
//! The delivery adapter takes ownership of a rendered PDF buffer and
//! dispatches it to the recipient as an attachment over an STARTTLS SMTP
//! relay. The email body is a short personalised plain-text note carrying
//! the company's branding block; when a hosted download link is supplied
//! it is appended to the body as well.
//!
//! Failures are classified into distinct operator-facing causes
//! (authentication, connection, timeout, other) and are never retried.

pub mod error;

use crate::error::{ErrorKind, Result};
use billkit_config::{Branding, SmtpConfig};
use billkit_render::DocumentKind;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, Message, SmtpTransport, Transport};
use std::time::Duration;
use time::format_description::FormatItem;
use time::macros::format_description;
use tracing::instrument;

const SEND_TIMEOUT: Duration = Duration::from_secs(30);
/// Attachment filename date component: `20260807`.
const FILE_DATE: &[FormatItem<'static>] = format_description!("[year][month][day]");

/// Outcome of a successful delivery, echoed back to the caller.
#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    pub recipient: String,
    pub filename: String,
}

/// SMTP delivery adapter, constructed once at startup.
pub struct Mailer {
    transport: SmtpTransport,
    from: Mailbox,
}

impl Mailer {
    /// Builds the STARTTLS transport. Missing credentials are a
    /// configuration error, reported here rather than at first send.
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let (username, password) = match (&config.username, &config.password) {
            (Some(username), Some(password)) => (username.clone(), password.clone()),
            _ => exn::bail!(ErrorKind::MissingCredentials),
        };
        let sender = match config.sender() {
            Some(sender) => sender.to_string(),
            None => exn::bail!(ErrorKind::MissingCredentials),
        };
        let address = match sender.parse::<Address>() {
            Ok(address) => address,
            Err(_) => exn::bail!(ErrorKind::InvalidSender(sender)),
        };
        let builder = match SmtpTransport::starttls_relay(&config.host) {
            Ok(builder) => builder,
            Err(_) => exn::bail!(ErrorKind::Connection),
        };
        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(username, password))
            .timeout(Some(SEND_TIMEOUT))
            .build();
        Ok(Self { transport, from: Mailbox::new(Some(config.from_name.clone()), address) })
    }

    /// Checks that the relay accepts our credentials without sending
    /// anything.
    pub fn verify(&self) -> Result<()> {
        match self.transport.test_connection() {
            Ok(true) => Ok(()),
            Ok(false) => exn::bail!(ErrorKind::Connection),
            Err(err) => classify(err),
        }
    }

    /// Sends the rendered document to the recipient as a PDF attachment.
    #[instrument(skip_all, fields(kind = %kind, recipient = %recipient_email))]
    pub fn send_document(
        &self,
        recipient_email: &str,
        recipient_name: &str,
        kind: DocumentKind,
        branding: &Branding,
        pdf: Vec<u8>,
        download_link: Option<&str>,
    ) -> Result<DeliveryReceipt> {
        self.verify()?;
        tracing::debug!("smtp relay connection verified");
        let filename = attachment_filename(kind);
        let message = self.build_message(
            recipient_email,
            recipient_name,
            kind,
            branding,
            pdf,
            download_link,
            &filename,
        )?;
        if let Err(err) = self.transport.send(&message) {
            return classify(err);
        }
        tracing::info!(filename = %filename, "document email sent");
        Ok(DeliveryReceipt { recipient: recipient_email.to_string(), filename })
    }

    #[allow(clippy::too_many_arguments)]
    fn build_message(
        &self,
        recipient_email: &str,
        recipient_name: &str,
        kind: DocumentKind,
        branding: &Branding,
        pdf: Vec<u8>,
        download_link: Option<&str>,
        filename: &str,
    ) -> Result<Message> {
        let recipient = match recipient_email.parse::<Address>() {
            Ok(address) => Mailbox::new(Some(recipient_name.to_string()), address),
            Err(_) => exn::bail!(ErrorKind::InvalidRecipient(recipient_email.to_string())),
        };
        let content_type = match ContentType::parse("application/pdf") {
            Ok(content_type) => content_type,
            Err(err) => exn::bail!(ErrorKind::Message(err.to_string())),
        };
        let body = body_text(recipient_name, kind, branding, download_link);
        let result = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(format!("{} - {}", kind.label(), branding.name))
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(body))
                    .singlepart(Attachment::new(filename.to_string()).body(pdf, content_type)),
            );
        match result {
            Ok(message) => Ok(message),
            Err(err) => exn::bail!(ErrorKind::Message(err.to_string())),
        }
    }
}

/// `<type>_<YYYYMMDD>.pdf`
fn attachment_filename(kind: DocumentKind) -> String {
    let today = time::OffsetDateTime::now_utc().date();
    let stamp = today.format(&FILE_DATE).unwrap_or_else(|_| today.to_string());
    format!("{}_{}.pdf", kind.as_str(), stamp)
}

fn body_text(
    recipient_name: &str,
    kind: DocumentKind,
    branding: &Branding,
    download_link: Option<&str>,
) -> String {
    let mut body = format!(
        "Hi {recipient_name},\n\nPlease find your {} attached.\n",
        kind.label()
    );
    if let Some(link) = download_link {
        body.push_str(&format!("\nDownload PDF: {link}\n"));
    }
    body.push_str(&format!(
        "\n{}\n{}\n\n{}\n\nTel: {} | Email: {}\n\nThank you for your business!",
        branding.name, branding.tagline, branding.address, branding.phone, branding.email
    ));
    body
}

/// Maps a transport failure onto a distinct user-facing cause.
///
/// A permanent rejection at submission time is overwhelmingly a
/// credential problem with these relays, so it surfaces as an
/// authentication failure; transient rejections keep the server's own
/// wording.
fn classify<T>(err: lettre::transport::smtp::Error) -> Result<T> {
    if err.is_timeout() {
        exn::bail!(ErrorKind::Timeout);
    }
    if err.is_permanent() {
        exn::bail!(ErrorKind::Authentication);
    }
    if err.is_transient() {
        exn::bail!(ErrorKind::Send(err.to_string()));
    }
    exn::bail!(ErrorKind::Connection);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mailer() -> Mailer {
        let config = SmtpConfig {
            username: Some("billing@example.com".to_string()),
            password: Some("hunter2".to_string()),
            ..SmtpConfig::default()
        };
        Mailer::new(&config).expect("transport builds")
    }

    #[test]
    fn missing_credentials_fail_at_construction() {
        let result = Mailer::new(&SmtpConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn attachment_filename_embeds_kind_and_date() {
        let filename = attachment_filename(DocumentKind::Receipt);
        assert!(filename.starts_with("receipt_"));
        assert!(filename.ends_with(".pdf"));
        // receipt_YYYYMMDD.pdf
        assert_eq!(filename.len(), "receipt_".len() + 8 + ".pdf".len());
    }

    #[test]
    fn message_carries_subject_recipient_and_attachment() {
        let message = mailer()
            .build_message(
                "customer@example.com",
                "Jane",
                DocumentKind::Invoice,
                &Branding::default(),
                b"%PDF-1.7 fake".to_vec(),
                None,
                "invoice_20260807.pdf",
            )
            .expect("message builds");
        let formatted = String::from_utf8_lossy(&message.formatted()).to_string();
        assert!(formatted.contains("Subject: Invoice - KETHU GROUPS"));
        assert!(formatted.contains("customer@example.com"));
        assert!(formatted.contains("invoice_20260807.pdf"));
        assert!(formatted.contains("application/pdf"));
    }

    #[test]
    fn rejects_invalid_recipient_addresses() {
        let result = mailer().build_message(
            "not-an-address",
            "Jane",
            DocumentKind::Invoice,
            &Branding::default(),
            Vec::new(),
            None,
            "invoice.pdf",
        );
        assert!(result.is_err());
    }

    #[test]
    fn body_mentions_customer_and_optional_link() {
        let branding = Branding::default();
        let plain = body_text("Jane", DocumentKind::Quotation, &branding, None);
        assert!(plain.starts_with("Hi Jane,"));
        assert!(plain.contains("Please find your Quotation attached."));
        assert!(plain.contains(&branding.name));
        assert!(!plain.contains("Download PDF"));

        let linked =
            body_text("Jane", DocumentKind::Quotation, &branding, Some("https://x.test/doc.pdf"));
        assert!(linked.contains("Download PDF: https://x.test/doc.pdf"));
    }
}
