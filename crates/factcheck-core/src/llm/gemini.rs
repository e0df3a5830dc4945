use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{ChatModel, ChatRole, CompletionRequest};
use crate::config::{GOOGLE_API_KEY_ENV, ModelConfig};
use crate::{FactCheckError, SecretValue};

const PROVIDER: &str = "gemini";

/// Gemini `generateContent` client.
pub struct GeminiModel {
    client: reqwest::Client,
    api_key: Option<SecretValue>,
    model: String,
    temperature: f32,
    base_url: String,
}

impl GeminiModel {
    pub fn new(api_key: Option<SecretValue>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model: model.into(),
            temperature: ModelConfig::clamp_temperature(temperature),
            base_url: ModelConfig::DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(config.api_key.clone(), config.name.clone(), config.temperature)
            .with_base_url(config.base_url.clone())
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl ChatModel for GeminiModel {
    fn model_name(&self) -> &str {
        &self.model
    }

    #[instrument(
        name = "llm.gemini",
        skip_all,
        fields(model = %self.model, turns = request.messages.len())
    )]
    async fn complete(&self, request: &CompletionRequest) -> Result<String, FactCheckError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| FactCheckError::MissingSecret(GOOGLE_API_KEY_ENV.to_string()))?;

        let body = GenerateContentRequest::from_completion(request, self.temperature);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key.expose())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            return Err(FactCheckError::provider(
                PROVIDER,
                status.as_u16(),
                error_message(&raw),
            ));
        }

        let payload: GenerateContentResponse = response.json().await?;
        let text = payload.into_text(&self.model)?;
        debug!(chars = text.len(), "gemini completion received");
        Ok(text)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    fn from_completion(request: &CompletionRequest, temperature: f32) -> Self {
        let contents = request
            .messages
            .iter()
            .map(|message| Content {
                role: Some(
                    match message.role {
                        ChatRole::User => "user",
                        ChatRole::Assistant => "model",
                    }
                    .to_string(),
                ),
                parts: vec![Part {
                    text: Some(message.content.clone()),
                }],
            })
            .collect();

        Self {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: Some(request.system.clone()),
                }],
            },
            contents,
            generation_config: GenerationConfig {
                temperature,
                stop_sequences: request.stop_sequences.clone(),
            },
        }
    }
}

#[derive(Serialize, Deserialize, Default)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop_sequences: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    fn into_text(self, model: &str) -> Result<String, FactCheckError> {
        if let Some(reason) = self.prompt_feedback.and_then(|feedback| feedback.block_reason) {
            return Err(FactCheckError::EmptyCompletion(format!(
                "{model} (prompt blocked: {reason})"
            )));
        }

        let text = self
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(FactCheckError::EmptyCompletion(model.to_string()));
        }
        Ok(text)
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

fn error_message(raw: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(raw)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| raw.trim().to_string())
}
