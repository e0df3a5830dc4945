use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum_test::TestServer;
use factcheck_core::{
    ChatModel, CompletionRequest, Config, FactCheckError, ProviderFactory, SearchTool,
};
use factcheck_server::config::AppConfig;
use factcheck_server::routes::build_router;
use factcheck_server::state::AppState;
use serde_json::{Value, json};

const RESEARCH: &str = "Three outlets confirm the merger closed on Friday. https://example.com/merger";
const ANALYSIS: &str = "Verified. The merger is confirmed by official filings.";

#[derive(Default)]
struct MockModel {
    requests: Mutex<Vec<CompletionRequest>>,
}

#[async_trait]
impl ChatModel for MockModel {
    fn model_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, FactCheckError> {
        self.requests.lock().unwrap().push(request.clone());
        if request.system.contains("Senior News Researcher") {
            Ok(format!("Thought: done\nFinal Answer: {RESEARCH}"))
        } else {
            Ok(format!("Thought: done\nFinal Answer: {ANALYSIS}"))
        }
    }
}

struct MockSearch;

#[async_trait]
impl SearchTool for MockSearch {
    fn name(&self) -> &str {
        "search_the_internet"
    }

    fn description(&self) -> &str {
        "mock search"
    }

    async fn search(&self, _query: &str) -> Result<String, FactCheckError> {
        Ok("No results found".into())
    }
}

struct FailingModel;

#[async_trait]
impl ChatModel for FailingModel {
    fn model_name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<String, FactCheckError> {
        Err(FactCheckError::MissingSecret("GOOGLE_API_KEY".into()))
    }
}

#[derive(Default)]
struct MockProviders {
    model: Arc<MockModel>,
    builds: AtomicUsize,
    failing: bool,
}

impl ProviderFactory for MockProviders {
    fn chat_model(&self) -> Result<Arc<dyn ChatModel>, FactCheckError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Ok(Arc::new(FailingModel));
        }
        Ok(self.model.clone())
    }

    fn search_tool(&self) -> Result<Arc<dyn SearchTool>, FactCheckError> {
        Ok(Arc::new(MockSearch))
    }
}

fn base_config(static_dir: PathBuf) -> AppConfig {
    AppConfig {
        listen_addr: "127.0.0.1:0".into(),
        static_dir,
        factcheck: Config::default(),
    }
}

fn server_with(providers: Arc<MockProviders>) -> TestServer {
    let config = base_config(PathBuf::from("static"));
    let state = AppState::with_providers(&config, providers);
    TestServer::new(build_router(state)).unwrap()
}

#[tokio::test]
async fn empty_headline_returns_error_without_external_calls() {
    let providers = Arc::new(MockProviders::default());
    let server = server_with(providers.clone());

    let response = server
        .post("/fact-check")
        .json(&json!({ "headline": "" }))
        .await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(
        response.json::<Value>(),
        json!({ "error": "Headline cannot be empty." })
    );
    assert_eq!(providers.builds.load(Ordering::SeqCst), 0);
    assert!(providers.model.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_headline_is_rejected_before_business_logic() {
    let providers = Arc::new(MockProviders::default());
    let server = server_with(providers.clone());

    let response = server
        .post("/fact-check")
        .json(&json!({ "title": "Wrong field" }))
        .await;

    assert_eq!(response.status_code(), 422);
    assert!(response.json::<Value>()["error"].is_string());
    assert_eq!(providers.builds.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn headline_runs_both_stages_and_returns_analysis() {
    let providers = Arc::new(MockProviders::default());
    let server = server_with(providers.clone());

    let response = server
        .post("/fact-check")
        .json(&json!({ "headline": "Acme merger completed" }))
        .await;

    assert_eq!(response.status_code(), 200);
    let body = response.json::<Value>();
    assert_eq!(body, json!({ "analysis": ANALYSIS }));

    let requests = providers.model.requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].system.contains("Senior News Researcher"));
    assert!(requests[1].system.contains("Fact-Checking Analyst"));
    assert!(requests[1].user_text().contains(RESEARCH));
}

#[tokio::test]
async fn repeated_requests_reinvoke_the_model() {
    let providers = Arc::new(MockProviders::default());
    let server = server_with(providers.clone());

    for _ in 0..3 {
        let response = server
            .post("/fact-check")
            .json(&json!({ "headline": "Acme merger completed" }))
            .await;
        assert_eq!(response.json::<Value>(), json!({ "analysis": ANALYSIS }));
    }

    assert_eq!(providers.builds.load(Ordering::SeqCst), 3);
    assert_eq!(providers.model.requests.lock().unwrap().len(), 6);
}

#[tokio::test]
async fn pipeline_failure_surfaces_as_server_error() {
    let providers = Arc::new(MockProviders {
        failing: true,
        ..Default::default()
    });
    let server = server_with(providers);

    let response = server
        .post("/fact-check")
        .json(&json!({ "headline": "Acme merger completed" }))
        .await;

    assert_eq!(response.status_code(), 500);
    let body = response.json::<Value>();
    assert!(
        body["error"]
            .as_str()
            .map(|message| message.contains("GOOGLE_API_KEY"))
            .unwrap_or(false),
        "unexpected error body: {body}"
    );
}

#[tokio::test]
async fn static_root_serves_index_page() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>fact check</h1>").unwrap();

    let config = base_config(dir.path().to_path_buf());
    let state = AppState::with_providers(&config, Arc::new(MockProviders::default()));
    let server = TestServer::new(build_router(state)).unwrap();

    let response = server.get("/").await;
    assert_eq!(response.status_code(), 200);
    assert!(response.text().contains("fact check"));

    let missing = server.get("/nope.js").await;
    assert_eq!(missing.status_code(), 404);
}

#[tokio::test]
async fn liveness_reports_model() {
    let server = server_with(Arc::new(MockProviders::default()));

    let response = server.get("/health/live").await;
    assert_eq!(response.status_code(), 200);
    let body = response.json::<Value>();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["model"], "gemini-2.5-flash");
}
