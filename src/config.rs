//! Configuration management for resolutes
//!
//! Settings are loaded from environment variables with defaults. Two cloud
//! variables are mandatory; a missing one is fatal before any pipeline work.
//!
//! # Environment Variables
//!
//! ## Required
//! - `GOOGLE_CLOUD_PROJECT`: cloud project id (Vision OCR parent, report metadata)
//! - `GOOGLE_CLOUD_LOCATION`: cloud location, e.g. `us-central1`
//!
//! ## Resolutes Configuration
//! - `RESOLUTES_PROVIDER`: gemini|openai|anthropic|ollama|xai|groq - default: "gemini"
//! - `RESOLUTES_MODEL`: analyzer model - default: "gemini-2.0-flash"
//! - `RESOLUTES_SYNTHESIS_MODEL`: synthesis model - default: same as `RESOLUTES_MODEL`
//! - `RESOLUTES_REQUEST_TIMEOUT`: per model call, seconds - default: "120"
//! - `RESOLUTES_ANALYZER_TIMEOUT`: per analyzer, seconds - default: "180"
//! - `RESOLUTES_PIPELINE_TIMEOUT`: whole run, seconds - default: "900"
//! - `RESOLUTES_MAX_ATTEMPTS`: generation attempts on malformed output - default: "2"
//! - `RESOLUTES_MAX_CONCURRENCY`: analyzers in flight - default: "6"
//! - `RESOLUTES_MAX_CONTEXT_SIZE`: document characters sent to the model - default: "30000"
//! - `RESOLUTES_MAX_TOKENS`: output token cap per call - default: "8192"
//! - `RESOLUTES_LOG_LEVEL`: logging level - default: "info"
//! - `RESOLUTES_STORE_DIR`: record store directory - default: ".resolutes"
//! - `RESOLUTES_FONT_DIR`: directory holding LiberationSans TTF files - optional
//! - `RESOLUTES_SEARCH_ENABLED`: allow web search (true|false) - default: "true"
//!
//! ## Provider credentials
//! Read by the genai library (`GOOGLE_API_KEY`, `OPENAI_API_KEY`, ...).
//! Vision OCR uses `GOOGLE_API_KEY` or, when set, `GOOGLE_OAUTH_ACCESS_TOKEN`.

use crate::ingest::VisionAuth;
use crate::llm::{BackendError, GenAIClient};
use crate::pipeline::PipelineConfig;
use genai::adapter::AdapterKind;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Variables that must be present before anything else runs
pub const REQUIRED_ENV_VARS: [&str; 2] = ["GOOGLE_CLOUD_PROJECT", "GOOGLE_CLOUD_LOCATION"];

const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
const DEFAULT_ANALYZER_TIMEOUT_SECS: u64 = 180;
const DEFAULT_PIPELINE_TIMEOUT_SECS: u64 = 900;
const DEFAULT_MAX_ATTEMPTS: u32 = 2;
const DEFAULT_MAX_CONCURRENCY: usize = 6;
const DEFAULT_MAX_CONTEXT_SIZE: usize = 30_000;
const DEFAULT_MAX_TOKENS: u32 = 8192;
const DEFAULT_STORE_DIR: &str = ".resolutes";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),

    #[error("Invalid provider: {0}. Valid options: gemini, openai, anthropic, ollama, xai, groq")]
    InvalidProvider(String),

    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Backend initialization failed: {0}")]
    BackendInitError(#[from] BackendError),
}

#[derive(Debug, Clone)]
pub struct ResolutesConfig {
    pub project_id: String,
    pub location: String,
    pub provider: AdapterKind,
    pub model: String,
    pub synthesis_model: Option<String>,
    pub request_timeout_secs: u64,
    pub analyzer_timeout_secs: u64,
    pub pipeline_timeout_secs: u64,
    pub max_attempts: u32,
    pub max_concurrency: usize,
    /// Maximum document characters forwarded to the model
    pub max_context_size: usize,
    pub max_tokens: u32,
    pub log_level: String,
    pub store_dir: PathBuf,
    pub font_dir: Option<PathBuf>,
    pub search_enabled: bool,
    pub vision_auth: Option<VisionAuth>,
}

pub fn parse_provider(value: &str) -> Result<AdapterKind, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "gemini" | "google" => Ok(AdapterKind::Gemini),
        "openai" => Ok(AdapterKind::OpenAI),
        "anthropic" | "claude" => Ok(AdapterKind::Anthropic),
        "ollama" => Ok(AdapterKind::Ollama),
        "xai" | "grok" => Ok(AdapterKind::Xai),
        "groq" => Ok(AdapterKind::Groq),
        other => Err(ConfigError::InvalidProvider(other.to_string())),
    }
}

impl ResolutesConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let required = |key: &str| get(key).ok_or_else(|| ConfigError::MissingEnv(key.to_string()));
        let project_id = required(REQUIRED_ENV_VARS[0])?;
        let location = required(REQUIRED_ENV_VARS[1])?;

        let provider = match get("RESOLUTES_PROVIDER") {
            Some(value) => parse_provider(&value)?,
            None => AdapterKind::Gemini,
        };

        let vision_auth = get("GOOGLE_OAUTH_ACCESS_TOKEN")
            .map(VisionAuth::BearerToken)
            .or_else(|| get("GOOGLE_API_KEY").map(VisionAuth::ApiKey));

        Ok(Self {
            project_id,
            location,
            provider,
            model: get("RESOLUTES_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            synthesis_model: get("RESOLUTES_SYNTHESIS_MODEL"),
            request_timeout_secs: parse_or(
                &get,
                "RESOLUTES_REQUEST_TIMEOUT",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?,
            analyzer_timeout_secs: parse_or(
                &get,
                "RESOLUTES_ANALYZER_TIMEOUT",
                DEFAULT_ANALYZER_TIMEOUT_SECS,
            )?,
            pipeline_timeout_secs: parse_or(
                &get,
                "RESOLUTES_PIPELINE_TIMEOUT",
                DEFAULT_PIPELINE_TIMEOUT_SECS,
            )?,
            max_attempts: parse_or(&get, "RESOLUTES_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?,
            max_concurrency: parse_or(&get, "RESOLUTES_MAX_CONCURRENCY", DEFAULT_MAX_CONCURRENCY)?,
            max_context_size: parse_or(
                &get,
                "RESOLUTES_MAX_CONTEXT_SIZE",
                DEFAULT_MAX_CONTEXT_SIZE,
            )?,
            max_tokens: parse_or(&get, "RESOLUTES_MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
            log_level: get("RESOLUTES_LOG_LEVEL")
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
                .to_lowercase(),
            store_dir: get("RESOLUTES_STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR)),
            font_dir: get("RESOLUTES_FONT_DIR").map(PathBuf::from),
            search_enabled: parse_or(&get, "RESOLUTES_SEARCH_ENABLED", true)?,
            vision_auth,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, secs) in [
            ("Request timeout", self.request_timeout_secs),
            ("Analyzer timeout", self.analyzer_timeout_secs),
            ("Pipeline timeout", self.pipeline_timeout_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::ValidationFailed(format!(
                    "{} must be at least 1 second",
                    name
                )));
            }
            if secs > 3600 {
                return Err(ConfigError::ValidationFailed(format!(
                    "{} cannot exceed 1 hour",
                    name
                )));
            }
        }

        if !(1..=5).contains(&self.max_attempts) {
            return Err(ConfigError::ValidationFailed(
                "Max attempts must be between 1 and 5".to_string(),
            ));
        }

        if !(1..=32).contains(&self.max_concurrency) {
            return Err(ConfigError::ValidationFailed(
                "Max concurrency must be between 1 and 32".to_string(),
            ));
        }

        if self.max_context_size < 1000 {
            return Err(ConfigError::ValidationFailed(
                "Max context size must be at least 1000 characters".to_string(),
            ));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Model name must not be empty".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::new()
            .with_max_concurrency(self.max_concurrency)
            .with_analyzer_timeout(Duration::from_secs(self.analyzer_timeout_secs))
            .with_max_attempts(self.max_attempts)
            .with_max_tokens(Some(self.max_tokens))
            .with_max_context_chars(self.max_context_size)
    }

    pub fn pipeline_timeout(&self) -> Duration {
        Duration::from_secs(self.pipeline_timeout_secs)
    }

    pub async fn create_client(&self) -> Result<Arc<GenAIClient>, ConfigError> {
        let timeout = Duration::from_secs(self.request_timeout_secs);
        let client = GenAIClient::new(self.provider, self.model.clone(), timeout).await?;
        Ok(Arc::new(client))
    }

    /// Client for the synthesis call, when a distinct model is configured
    pub async fn create_synthesis_client(&self) -> Result<Option<Arc<GenAIClient>>, ConfigError> {
        match &self.synthesis_model {
            Some(model) if model != &self.model => {
                let timeout = Duration::from_secs(self.request_timeout_secs);
                let client = GenAIClient::new(self.provider, model.clone(), timeout).await?;
                Ok(Some(Arc::new(client)))
            }
            _ => Ok(None),
        }
    }

    pub fn to_display_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();

        map.insert("project_id".to_string(), self.project_id.clone());
        map.insert("location".to_string(), self.location.clone());
        map.insert("provider".to_string(), self.provider.as_str().to_string());
        map.insert("model".to_string(), self.model.clone());
        if let Some(ref model) = self.synthesis_model {
            map.insert("synthesis_model".to_string(), model.clone());
        }
        map.insert(
            "request_timeout_secs".to_string(),
            self.request_timeout_secs.to_string(),
        );
        map.insert(
            "analyzer_timeout_secs".to_string(),
            self.analyzer_timeout_secs.to_string(),
        );
        map.insert(
            "pipeline_timeout_secs".to_string(),
            self.pipeline_timeout_secs.to_string(),
        );
        map.insert("max_attempts".to_string(), self.max_attempts.to_string());
        map.insert(
            "max_concurrency".to_string(),
            self.max_concurrency.to_string(),
        );
        map.insert(
            "max_context_size".to_string(),
            self.max_context_size.to_string(),
        );
        map.insert("max_tokens".to_string(), self.max_tokens.to_string());
        map.insert("log_level".to_string(), self.log_level.clone());
        map.insert("store_dir".to_string(), self.store_dir.display().to_string());
        if let Some(ref dir) = self.font_dir {
            map.insert("font_dir".to_string(), dir.display().to_string());
        }
        map.insert(
            "search_enabled".to_string(),
            self.search_enabled.to_string(),
        );
        map.insert(
            "vision_auth".to_string(),
            match self.vision_auth {
                Some(VisionAuth::ApiKey(_)) => "api key",
                Some(VisionAuth::BearerToken(_)) => "access token",
                None => "none",
            }
            .to_string(),
        );

        map
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::ParseError {
            field: key.to_string(),
            error: e.to_string(),
        }),
        None => Ok(default),
    }
}

impl fmt::Display for ResolutesConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Resolutes Configuration:")?;
        writeln!(f, "  Project: {} ({})", self.project_id, self.location)?;
        writeln!(f, "  Provider: {}", self.provider.as_str())?;
        writeln!(f, "  Model: {}", self.model)?;
        if let Some(ref model) = self.synthesis_model {
            writeln!(f, "  Synthesis Model: {}", model)?;
        }
        writeln!(
            f,
            "  Timeouts: request {}s, analyzer {}s, pipeline {}s",
            self.request_timeout_secs, self.analyzer_timeout_secs, self.pipeline_timeout_secs
        )?;
        writeln!(f, "  Max Attempts: {}", self.max_attempts)?;
        writeln!(f, "  Max Concurrency: {}", self.max_concurrency)?;
        writeln!(f, "  Max Context Size: {} chars", self.max_context_size)?;
        writeln!(f, "  Store Dir: {}", self.store_dir.display())?;
        writeln!(f, "  Search Enabled: {}", self.search_enabled)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}
