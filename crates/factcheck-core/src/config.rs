use std::env;

use crate::{FactCheckError, SecretValue};

pub const GOOGLE_API_KEY_ENV: &str = "GOOGLE_API_KEY";
pub const SERPER_API_KEY_ENV: &str = "SERPER_API_KEY";

/// Top-level configuration for the model client, search adapter and agents.
///
/// Credentials are captured as optional values; a missing key only surfaces
/// when a request actually reaches the corresponding remote service.
#[derive(Debug, Clone)]
pub struct Config {
    pub model: ModelConfig,
    pub search: SearchConfig,
    pub agents: AgentConfig,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub name: String,
    pub temperature: f32,
    pub base_url: String,
    pub api_key: Option<SecretValue>,
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub base_url: String,
    pub results: usize,
    pub api_key: Option<SecretValue>,
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub max_iterations: usize,
}

impl ModelConfig {
    pub const DEFAULT_MODEL: &'static str = "gemini-2.5-flash";
    pub const DEFAULT_TEMPERATURE: f32 = 0.5;
    pub const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com/v1beta";

    /// Clamp into `0.0..=2.0`; non-finite input falls back to the default.
    pub fn clamp_temperature(value: f32) -> f32 {
        if value.is_finite() {
            value.clamp(0.0, 2.0)
        } else {
            Self::DEFAULT_TEMPERATURE
        }
    }
}

impl SearchConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://google.serper.dev";
    pub const DEFAULT_RESULTS: usize = 10;
}

impl AgentConfig {
    pub const DEFAULT_MAX_ITERATIONS: usize = 15;
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: ModelConfig {
                name: ModelConfig::DEFAULT_MODEL.to_string(),
                temperature: ModelConfig::DEFAULT_TEMPERATURE,
                base_url: ModelConfig::DEFAULT_BASE_URL.to_string(),
                api_key: None,
            },
            search: SearchConfig {
                base_url: SearchConfig::DEFAULT_BASE_URL.to_string(),
                results: SearchConfig::DEFAULT_RESULTS,
                api_key: None,
            },
            agents: AgentConfig {
                max_iterations: AgentConfig::DEFAULT_MAX_ITERATIONS,
            },
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, FactCheckError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Recognised keys:
    /// - `GOOGLE_API_KEY`, `SERPER_API_KEY`
    /// - `FACTCHECK_MODEL`, `FACTCHECK_TEMPERATURE`
    /// - `FACTCHECK_MAX_ITERATIONS`, `FACTCHECK_SEARCH_RESULTS`
    /// - `GEMINI_BASE_URL`, `SERPER_BASE_URL`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, FactCheckError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let temperature = match read("FACTCHECK_TEMPERATURE") {
            Some(raw) => parse_temperature(&raw)?,
            None => defaults.model.temperature,
        };

        let max_iterations = match read("FACTCHECK_MAX_ITERATIONS") {
            Some(raw) => parse_positive("FACTCHECK_MAX_ITERATIONS", &raw)?,
            None => defaults.agents.max_iterations,
        };

        let results = match read("FACTCHECK_SEARCH_RESULTS") {
            Some(raw) => parse_positive("FACTCHECK_SEARCH_RESULTS", &raw)?,
            None => defaults.search.results,
        };

        Ok(Self {
            model: ModelConfig {
                name: read("FACTCHECK_MODEL").unwrap_or(defaults.model.name),
                temperature,
                base_url: read("GEMINI_BASE_URL").unwrap_or(defaults.model.base_url),
                api_key: SecretValue::from_optional(lookup(GOOGLE_API_KEY_ENV)),
            },
            search: SearchConfig {
                base_url: read("SERPER_BASE_URL").unwrap_or(defaults.search.base_url),
                results,
                api_key: SecretValue::from_optional(lookup(SERPER_API_KEY_ENV)),
            },
            agents: AgentConfig { max_iterations },
        })
    }

    pub fn with_model(mut self, name: impl Into<String>) -> Self {
        self.model.name = name.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.model.temperature = ModelConfig::clamp_temperature(temperature);
        self
    }
}

fn parse_temperature(raw: &str) -> Result<f32, FactCheckError> {
    raw.parse::<f32>()
        .ok()
        .filter(|value| value.is_finite())
        .map(ModelConfig::clamp_temperature)
        .ok_or_else(|| {
            FactCheckError::InvalidConfiguration(format!(
                "FACTCHECK_TEMPERATURE must be a number, got {raw:?}"
            ))
        })
}

fn parse_positive(key: &str, raw: &str) -> Result<usize, FactCheckError> {
    raw.parse::<usize>()
        .ok()
        .filter(|value| *value > 0)
        .ok_or_else(|| {
            FactCheckError::InvalidConfiguration(format!(
                "{key} must be a positive integer, got {raw:?}"
            ))
        })
}
