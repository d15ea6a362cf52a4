use thiserror::Error;

use crate::completion::CompletionError;

#[derive(Error, Debug)]
pub enum MinutesError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),
}
