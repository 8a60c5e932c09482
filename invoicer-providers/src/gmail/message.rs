//! RFC 822 / MIME message composition.
//!
//! A draft with no attachments is a single `text/plain` part. With
//! attachments it becomes `multipart/mixed`: the text first, then one part
//! per file. All bodies are base64, wrapped at 76 columns; non-ASCII headers
//! use RFC 2047 encoded words.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use invoicer_core::Attachments;
use invoicer_store::MailSettings;
use rand::Rng;
use tracing::debug;

use super::error::GmailError;

const CRLF: &str = "\r\n";
const LINE_WIDTH: usize = 76;

// ============================================================================
// Message
// ============================================================================

/// A file attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailAttachment {
    /// Name shown to the recipient.
    pub filename: String,
    /// MIME type.
    pub content_type: &'static str,
    /// File contents.
    pub data: Vec<u8>,
}

impl MailAttachment {
    /// Reads `path` into an attachment.
    pub async fn read(path: &Path) -> Result<Self, GmailError> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|source| GmailError::Attachment {
                path: path.to_path_buf(),
                source,
            })?;
        let filename = path
            .file_name()
            .map_or_else(|| "attachment".to_string(), |n| n.to_string_lossy().into_owned());

        Ok(Self {
            content_type: content_type_for(path),
            filename,
            data,
        })
    }
}

fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("csv") => "text/csv",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// A plain-text mail with optional attachments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    /// Sender.
    pub from: String,
    /// Primary recipients. Never empty.
    pub to: Vec<String>,
    /// Copy recipients.
    pub cc: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// Text body.
    pub body: String,
    /// Attached files.
    pub attachments: Vec<MailAttachment>,
}

impl MailMessage {
    /// Renders the message with the given multipart boundary.
    pub fn to_rfc822(&self, boundary: &str) -> String {
        let mut out = String::new();
        header(&mut out, "From", &single_line(&self.from));
        header(&mut out, "To", &single_line(&self.to.join(", ")));
        if !self.cc.is_empty() {
            header(&mut out, "Cc", &single_line(&self.cc.join(", ")));
        }
        header(&mut out, "Subject", &encode_header(&single_line(&self.subject)));
        header(&mut out, "MIME-Version", "1.0");

        if self.attachments.is_empty() {
            text_part(&mut out, &self.body);
            return out;
        }

        header(
            &mut out,
            "Content-Type",
            &format!("multipart/mixed; boundary=\"{boundary}\""),
        );
        out.push_str(CRLF);

        out.push_str(&format!("--{boundary}{CRLF}"));
        text_part(&mut out, &self.body);

        for attachment in &self.attachments {
            out.push_str(&format!("--{boundary}{CRLF}"));
            header(&mut out, "Content-Type", attachment.content_type);
            header(
                &mut out,
                "Content-Disposition",
                &format!("attachment; filename=\"{}\"", quoted_filename(&attachment.filename)),
            );
            header(&mut out, "Content-Transfer-Encoding", "base64");
            out.push_str(CRLF);
            out.push_str(&wrapped_base64(&attachment.data));
        }

        out.push_str(&format!("--{boundary}--{CRLF}"));
        out
    }

    /// Gmail's `raw` field: the rendered message, base64url encoded.
    pub fn encode_raw(&self, boundary: &str) -> String {
        URL_SAFE.encode(self.to_rfc822(boundary))
    }
}

fn header(out: &mut String, name: &str, value: &str) {
    out.push_str(name);
    out.push_str(": ");
    out.push_str(value);
    out.push_str(CRLF);
}

fn text_part(out: &mut String, body: &str) {
    header(out, "Content-Type", "text/plain; charset=\"utf-8\"");
    header(out, "Content-Transfer-Encoding", "base64");
    out.push_str(CRLF);
    out.push_str(&wrapped_base64(body.as_bytes()));
}

fn wrapped_base64(data: &[u8]) -> String {
    let encoded = STANDARD.encode(data);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / LINE_WIDTH * 2 + 2);
    for chunk in encoded.as_bytes().chunks(LINE_WIDTH) {
        // base64 output is ASCII
        out.push_str(&String::from_utf8_lossy(chunk));
        out.push_str(CRLF);
    }
    out
}

/// Header values are one line; CR and LF become spaces.
fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

/// Content of a quoted `filename` parameter.
fn quoted_filename(name: &str) -> String {
    let name = single_line(name);
    if name.is_ascii() {
        name.replace('\\', "\\\\").replace('"', "\\\"")
    } else {
        encoded_word(&name)
    }
}

fn encoded_word(value: &str) -> String {
    if value.is_ascii() {
        value.to_string()
    } else {
        format!("=?UTF-8?B?{}?=", STANDARD.encode(value))
    }
}

/// RFC 2047 `B` encoding for non-ASCII header values.
pub fn encode_header(value: &str) -> String {
    if value.is_ascii() {
        return value.to_string();
    }

    // Keep each encoded word under the 75 character limit.
    const MAX_CHUNK_BYTES: usize = 45;
    let mut words = Vec::new();
    let mut chunk = String::new();
    for ch in value.chars() {
        if chunk.len() + ch.len_utf8() > MAX_CHUNK_BYTES {
            words.push(encoded_word(&chunk));
            chunk.clear();
        }
        chunk.push(ch);
    }
    if !chunk.is_empty() {
        words.push(encoded_word(&chunk));
    }
    words.join(&format!("{CRLF} "))
}

/// A boundary that will not occur in base64 bodies.
pub fn random_boundary() -> String {
    let n: u64 = rand::thread_rng().r#gen();
    format!("==============={n:019}==")
}

// ============================================================================
// Composition
// ============================================================================

/// Builds the invoice mail from settings, a template and attachments.
///
/// Fails without side effects when the template can't be read, no `To`
/// recipient is configured, or any attachment can't be read.
pub async fn compose(mail: &MailSettings, attachments: &Attachments) -> Result<MailMessage, GmailError> {
    let body = tokio::fs::read_to_string(&mail.template_path)
        .await
        .map_err(|source| GmailError::Template {
            path: mail.template_path.clone(),
            source,
        })?;

    let to = clean_addresses(&mail.to);
    if to.is_empty() {
        return Err(GmailError::NoRecipients);
    }

    let mut files = Vec::with_capacity(attachments.len());
    for path in attachments {
        files.push(MailAttachment::read(path).await?);
    }
    debug!(attachments = files.len(), "Mail composed");

    Ok(MailMessage {
        from: mail.from.clone(),
        to,
        cc: clean_addresses(&mail.cc),
        subject: mail.subject.clone(),
        body,
        attachments: files,
    })
}

fn clean_addresses(addresses: &[String]) -> Vec<String> {
    addresses
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .map(ToString::to_string)
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
