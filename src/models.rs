//! Wire types returned by the pool service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A mailbox from the account pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Service-side account identifier.
    pub id: u64,
    /// Mailbox address.
    pub email: String,
}

/// A message as listed by the service.
///
/// Every field may be missing or `null` in the payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Subject line.
    #[serde(default)]
    pub subject: Option<String>,
    /// Full body (HTML or text, as stored by the service).
    #[serde(default)]
    pub body: Option<String>,
    /// Short preview text.
    #[serde(default)]
    pub body_preview: Option<String>,
    /// ISO-8601 receive timestamp, e.g. `2026-01-27T11:49:10Z`.
    #[serde(default)]
    pub received_time: Option<String>,
}

impl Message {
    /// Text scanned for a code: `body` followed by `body_preview`.
    #[must_use]
    pub fn scan_text(&self) -> String {
        let body = self.body.as_deref().unwrap_or_default();
        let preview = self.body_preview.as_deref().unwrap_or_default();
        let mut text = String::with_capacity(body.len() + preview.len());
        text.push_str(body);
        text.push_str(preview);
        text
    }

    /// Parsed `received_time`, if present and well-formed.
    #[must_use]
    pub fn received_at(&self) -> Option<DateTime<Utc>> {
        self.received_time
            .as_deref()
            .and_then(crate::scan::parse_timestamp)
    }

    /// Subject or empty string.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_deref().unwrap_or_default()
    }
}

/// Envelope of the message listing endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct MessageList {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub emails: Option<Vec<Message>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_tolerates_missing_and_null_fields() {
        let msg: Message =
            serde_json::from_str(r#"{"subject": null, "body": "Code 123456"}"#).unwrap();
        assert_eq!(msg.subject(), "");
        assert_eq!(msg.body.as_deref(), Some("Code 123456"));
        assert!(msg.received_time.is_none());
        assert!(msg.received_at().is_none());
    }

    #[test]
    fn test_scan_text_concatenates_body_and_preview() {
        let msg = Message {
            body: Some("abc".into()),
            body_preview: Some("def".into()),
            ..Message::default()
        };
        assert_eq!(msg.scan_text(), "abcdef");
        assert_eq!(Message::default().scan_text(), "");
    }

    #[test]
    fn test_message_list_envelope() {
        let list: MessageList = serde_json::from_str(r#"{"success": true, "emails": null}"#).unwrap();
        assert!(list.success);
        assert!(list.emails.is_none());

        let list: MessageList = serde_json::from_str("{}").unwrap();
        assert!(!list.success);
    }

    #[test]
    fn test_account_decodes() {
        let accounts: Vec<Account> =
            serde_json::from_str(r#"[{"id": 7, "email": "a@outlook.com", "extra": 1}]"#).unwrap();
        assert_eq!(accounts[0].id, 7);
        assert_eq!(accounts[0].email, "a@outlook.com");
    }
}
