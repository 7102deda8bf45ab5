use mail_parser::MessageParser;
use thiserror::Error;

const NO_SUBJECT: &str = "(no subject)";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MailParseError {
    #[error("Malformed message: no RFC 5322 headers found")]
    MalformedMessage,
    #[error("Malformed message: no text body")]
    MissingText { subject: String },
}

/// Subject and readable text pulled out of a raw mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMail {
    pub subject: String,
    pub text: String,
}

impl ParsedMail {
    /// Extracts the subject and first text part from raw RFC 5322 bytes.
    ///
    /// # Errors
    /// Returns `MailParseError` when the bytes carry no headers or no text part.
    pub fn parse(raw: &[u8]) -> Result<Self, MailParseError> {
        let parsed = MessageParser::default().parse(raw).ok_or(MailParseError::MalformedMessage)?;
        if parsed.root_part().headers().is_empty() {
            return Err(MailParseError::MalformedMessage);
        }

        let subject = parsed.subject().unwrap_or(NO_SUBJECT).to_string();
        let text = parsed.body_text(0).map(std::borrow::Cow::into_owned).unwrap_or_default();
        if text.trim().is_empty() {
            return Err(MailParseError::MissingText { subject });
        }

        Ok(Self { subject, text })
    }
}

/// What the presentation layer shows for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayMail {
    pub subject: String,
    pub body: String,
    pub parsed: bool,
}

impl DisplayMail {
    /// Never fails: anything that does not parse is shown verbatim. A subject
    /// found in otherwise readable headers is kept.
    #[must_use]
    pub fn from_raw(raw: &[u8]) -> Self {
        match ParsedMail::parse(raw) {
            Ok(mail) => Self { subject: mail.subject, body: mail.text, parsed: true },
            Err(e) => {
                tracing::debug!(error = %e, "Falling back to raw message display");
                let subject = match e {
                    MailParseError::MissingText { subject } => subject,
                    MailParseError::MalformedMessage => NO_SUBJECT.to_string(),
                };
                Self { subject, body: String::from_utf8_lossy(raw).into_owned(), parsed: false }
            }
        }
    }
}
