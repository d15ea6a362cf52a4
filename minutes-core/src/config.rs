use config::{Config, Environment, File};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

use crate::error::MinutesError;

/// Default upload ceiling: 10 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Default JSON body ceiling: 5 MiB.
pub const DEFAULT_JSON_LIMIT_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MinutesConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServiceConfig {
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    /// `"*"` allows any origin.
    pub cors_origins: Vec<String>,
    pub json_limit_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: vec!["*".to_string()],
            json_limit_bytes: DEFAULT_JSON_LIMIT_BYTES,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UploadConfig {
    /// Multipart field carrying the transcript file
    pub field_name: String,
    pub max_file_bytes: usize,
    /// Where transient upload files are written; system temp dir when unset
    pub temp_dir: Option<PathBuf>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            field_name: "transcript".to_string(),
            max_file_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            temp_dir: None,
        }
    }
}

impl UploadConfig {
    pub fn resolved_temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct CompletionConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
    pub api_key: String,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama3-70b-8192".to_string(),
            temperature: 0.2,
            max_tokens: 1500,
            timeout_seconds: 60,
            api_key: String::new(),
        }
    }
}

// Keeps the key out of logs.
impl fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .finish()
    }
}

impl MinutesConfig {
    /// Load from an optional TOML file, then apply `MINUTES__SECTION__KEY`,
    /// `PORT` and `GROQ_API_KEY` environment overrides.
    pub fn load(path: &str) -> Result<Self, MinutesError> {
        Self::from_sources(
            path,
            Self::environment(),
            std::env::var("PORT").ok(),
            std::env::var("GROQ_API_KEY").ok(),
        )
    }

    /// `MINUTES__*` variables, e.g. `MINUTES__UPLOAD__MAX_FILE_BYTES`.
    pub fn environment() -> Environment {
        Environment::with_prefix("MINUTES")
            .separator("__")
            .try_parsing(true)
    }

    pub fn from_sources(
        path: &str,
        env: Environment,
        port: Option<String>,
        api_key: Option<String>,
    ) -> Result<Self, MinutesError> {
        let s = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(env)
            .set_override_option("http.port", port.filter(|p| !p.trim().is_empty()))?
            .set_override_option("completion.api_key", api_key)?
            .build()?;
        Ok(s.try_deserialize()?)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.http.host, self.http.port)
    }
}
