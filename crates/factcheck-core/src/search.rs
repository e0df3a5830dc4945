//! Web-search tool adapter.

use std::fmt::Write as _;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::{SERPER_API_KEY_ENV, SearchConfig};
use crate::{FactCheckError, SecretValue};

const PROVIDER: &str = "serper";

/// A tool an agent may invoke while working on a task.
#[async_trait]
pub trait SearchTool: Send + Sync {
    /// Name the model must use in its `Action:` line.
    fn name(&self) -> &str;

    /// One-line description shown in the tool catalogue.
    fn description(&self) -> &str;

    /// Run a query and return text to feed back as an observation.
    async fn search(&self, query: &str) -> Result<String, FactCheckError>;
}

/// Serper.dev Google search client.
pub struct SerperSearch {
    client: reqwest::Client,
    api_key: Option<SecretValue>,
    base_url: String,
    results: usize,
}

impl SerperSearch {
    pub const TOOL_NAME: &'static str = "search_the_internet";

    pub fn new(api_key: Option<SecretValue>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: SearchConfig::DEFAULT_BASE_URL.to_string(),
            results: SearchConfig::DEFAULT_RESULTS,
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(config.api_key.clone())
            .with_base_url(config.base_url.clone())
            .with_results(config.results)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_results(mut self, results: usize) -> Self {
        self.results = results.max(1);
        self
    }
}

#[async_trait]
impl SearchTool for SerperSearch {
    fn name(&self) -> &str {
        Self::TOOL_NAME
    }

    fn description(&self) -> &str {
        "Search the internet with a query and return titles, links and snippets of the top results."
    }

    #[instrument(name = "tool.serper", skip(self))]
    async fn search(&self, query: &str) -> Result<String, FactCheckError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| FactCheckError::MissingSecret(SERPER_API_KEY_ENV.to_string()))?;

        let url = format!("{}/search", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(url)
            .header("X-API-KEY", api_key.expose())
            .json(&SerperRequest {
                q: query,
                num: self.results,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(FactCheckError::provider(
                PROVIDER,
                status.as_u16(),
                message.trim(),
            ));
        }

        let payload: SerperResponse = response.json().await?;
        debug!(organic = payload.organic.len(), "serper results received");
        Ok(format_results(&payload))
    }
}

#[derive(Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    num: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SerperResponse {
    #[serde(default)]
    knowledge_graph: Option<KnowledgeGraph>,
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Debug, Default, Deserialize)]
struct KnowledgeGraph {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Default, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

fn format_results(payload: &SerperResponse) -> String {
    let mut output = String::new();

    if let Some(graph) = payload
        .knowledge_graph
        .as_ref()
        .filter(|graph| !graph.title.is_empty())
    {
        let _ = writeln!(output, "Knowledge Graph: {}", graph.title);
        if !graph.description.is_empty() {
            let _ = writeln!(output, "{}", graph.description);
        }
        output.push_str("---\n");
    }

    if payload.organic.is_empty() {
        output.push_str("No results found");
        return output;
    }

    let blocks: Vec<String> = payload
        .organic
        .iter()
        .map(|result| {
            format!(
                "Title: {}\nLink: {}\nSnippet: {}",
                result.title, result.link, result.snippet
            )
        })
        .collect();
    output.push_str(&blocks.join("\n---\n"));
    output
}
