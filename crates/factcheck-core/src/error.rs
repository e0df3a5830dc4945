use thiserror::Error;

/// Core error type for the fact-check pipeline.
#[derive(Debug, Error)]
pub enum FactCheckError {
    #[error("Headline cannot be empty.")]
    EmptyHeadline,
    #[error("configuration error: {0}")]
    InvalidConfiguration(String),
    #[error("missing environment variable: {0}")]
    MissingSecret(String),
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{provider} returned {status}: {message}")]
    Provider {
        provider: &'static str,
        status: u16,
        message: String,
    },
    #[error("{0} returned no usable text")]
    EmptyCompletion(String),
    #[error("workflow error: {0}")]
    Workflow(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FactCheckError {
    pub fn provider(provider: &'static str, status: u16, message: impl Into<String>) -> Self {
        Self::Provider {
            provider,
            status,
            message: message.into(),
        }
    }
}
