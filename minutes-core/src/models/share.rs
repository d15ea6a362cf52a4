use serde::{Deserialize, Serialize};

pub const DEFAULT_SUBJECT: &str = "Meeting Summary";
pub const SHARE_ACK_MESSAGE: &str = "Summary shared successfully (no email sent).";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShareRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipients: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Acknowledgement echoed by the share endpoint. Nothing is delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareAck {
    pub ok: bool,
    pub message: String,
    pub recipients: Vec<String>,
    pub subject: String,
    pub summary: String,
}

impl ShareAck {
    /// Apply defaults to an already-validated request. `summary` is echoed unchanged.
    pub fn echo(recipients: Option<Vec<String>>, subject: Option<String>, summary: String) -> Self {
        Self {
            ok: true,
            message: SHARE_ACK_MESSAGE.to_string(),
            recipients: recipients.unwrap_or_default(),
            subject: subject
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
            summary,
        }
    }
}
