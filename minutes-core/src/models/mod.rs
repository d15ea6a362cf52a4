pub mod chat;
pub mod share;
pub mod summary;
pub mod transcript;

pub use chat::{ChatMessage, Role};
pub use share::{ShareAck, ShareRequest};
pub use summary::{SummarizeRequest, SummarizeResponse};
pub use transcript::UploadResponse;
