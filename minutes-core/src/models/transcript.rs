use serde::{Deserialize, Serialize};

/// Body returned by the upload endpoint: the decoded file contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub text: String,
}
