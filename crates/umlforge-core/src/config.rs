use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::ingest::ChunkSettings;

pub const DEFAULT_MIN_TEXT_LENGTH: usize = 50;
pub const DEFAULT_MAX_TEXT_LENGTH: usize = 10_000;
pub const DEFAULT_CHUNK_THRESHOLD: usize = 2_000;
pub const DEFAULT_CHUNK_SIZE: usize = 1_500;
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Tunables for the extraction pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub min_text_length: usize,
    pub max_text_length: usize,
    pub chunk_threshold: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub timeout_secs: u64,
    pub model_endpoint: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_text_length: DEFAULT_MIN_TEXT_LENGTH,
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
            chunk_threshold: DEFAULT_CHUNK_THRESHOLD,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            model_endpoint: None,
        }
    }
}

impl PipelineConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            min_text_length: env_or("UMLFORGE_MIN_TEXT_LENGTH", defaults.min_text_length),
            max_text_length: env_or("UMLFORGE_MAX_TEXT_LENGTH", defaults.max_text_length),
            chunk_threshold: env_or("UMLFORGE_CHUNK_THRESHOLD", defaults.chunk_threshold),
            chunk_size: env_or("UMLFORGE_CHUNK_SIZE", defaults.chunk_size),
            chunk_overlap: env_or("UMLFORGE_CHUNK_OVERLAP", defaults.chunk_overlap),
            timeout_secs: env_or("UMLFORGE_TIMEOUT_SECS", defaults.timeout_secs),
            model_endpoint: std::env::var("UMLFORGE_MODEL_ENDPOINT")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        }
    }

    #[must_use]
    pub fn with_model_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.model_endpoint = Some(endpoint.into());
        self
    }

    #[must_use]
    pub const fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    #[must_use]
    pub const fn with_text_limits(mut self, min: usize, max: usize) -> Self {
        self.min_text_length = min;
        self.max_text_length = max;
        self
    }

    #[must_use]
    pub const fn with_chunking(mut self, threshold: usize, size: usize, overlap: usize) -> Self {
        self.chunk_threshold = threshold;
        self.chunk_size = size;
        self.chunk_overlap = overlap;
        self
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn chunk_settings(&self) -> ChunkSettings {
        ChunkSettings::new(self.chunk_threshold, self.chunk_size, self.chunk_overlap)
    }

    pub fn model_endpoint(&self) -> Result<Option<Url>> {
        self.model_endpoint
            .as_deref()
            .map(|raw| {
                Url::parse(raw).map_err(|e| Error::Config(format!("model endpoint {raw}: {e}")))
            })
            .transpose()
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_text_length > self.max_text_length {
            return Err(Error::Config(format!(
                "minimum text length {} exceeds maximum {}",
                self.min_text_length, self.max_text_length
            )));
        }
        if self.chunk_size == 0 {
            return Err(Error::Config("chunk size must be positive".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::Config(format!(
                "chunk overlap {} must be smaller than chunk size {}",
                self.chunk_overlap, self.chunk_size
            )));
        }
        self.model_endpoint().map(|_| ())
    }
}

fn env_or<T: FromStr + Copy>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring unparseable setting");
            default
        }),
        Err(_) => default,
    }
}
