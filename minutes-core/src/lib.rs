pub mod completion;
pub mod config;
pub mod error;
pub mod models;
pub mod prompt;

pub use completion::{CompletionBackend, CompletionError, GroqCompletionClient};
pub use config::{CompletionConfig, HttpConfig, MinutesConfig, ServiceConfig, UploadConfig};
pub use error::MinutesError;
pub use prompt::{build_messages, resolve_instruction, DEFAULT_INSTRUCTION, SYSTEM_PROMPT};
