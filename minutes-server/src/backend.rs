//! Startup wiring for the completion backend and upload storage.

use std::path::PathBuf;
use std::sync::Arc;

use minutes_core::{CompletionBackend, GroqCompletionClient, MinutesConfig, MinutesError};

/// Create the completion backend from the application config.
///
/// Fails when `completion.api_key` (usually `GROQ_API_KEY`) is empty.
pub fn create_backend_from_config(
    config: &MinutesConfig,
) -> Result<Arc<dyn CompletionBackend>, MinutesError> {
    let client = GroqCompletionClient::new(config.completion.clone())?;
    tracing::info!(
        backend = client.name(),
        model = client.model(),
        base_url = %config.completion.base_url,
        "Completion backend ready"
    );
    Ok(Arc::new(client))
}

/// Make sure the upload directory exists and return it.
pub fn prepare_upload_dir(config: &MinutesConfig) -> Result<PathBuf, MinutesError> {
    let dir = config.upload.resolved_temp_dir();
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_is_rejected() {
        let config = MinutesConfig::default();
        let err = create_backend_from_config(&config).err().expect("should fail");
        assert!(matches!(
            err,
            MinutesError::Completion(minutes_core::CompletionError::MissingApiKey)
        ));
    }

    #[test]
    fn test_backend_from_config_with_key() {
        let mut config = MinutesConfig::default();
        config.completion.api_key = "gsk_test".to_string();
        let backend = create_backend_from_config(&config).unwrap();
        assert_eq!(backend.name(), "groq");
    }

    #[test]
    fn test_prepare_upload_dir_creates_missing_dir() {
        let root = tempfile::tempdir().unwrap();
        let mut config = MinutesConfig::default();
        config.upload.temp_dir = Some(root.path().join("uploads"));

        let dir = prepare_upload_dir(&config).unwrap();

        assert!(dir.is_dir());
        assert_eq!(dir, root.path().join("uploads"));
    }
}
