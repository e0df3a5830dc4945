//! Fact-check core abstractions built directly on top of `graph_flow`.
//!
//! This crate provides the model client, the web-search tool adapter, the
//! Researcher and Analyst agents, and the two-stage sequential crew that
//! turns a news headline into a free-text verdict.

pub mod agent;
pub mod config;
pub mod error;
pub mod llm;
mod prompts;
pub mod search;
pub mod security;
pub mod tasks;
pub mod telemetry;
mod trace;
mod verdict;
pub mod workflow;

pub use agent::{Agent, AgentProfile};
pub use config::{AgentConfig, Config, ModelConfig, SearchConfig};
pub use error::FactCheckError;
pub use llm::{ChatMessage, ChatModel, ChatRole, CompletionRequest, GeminiModel};
pub use search::{SearchTool, SerperSearch};
pub use security::SecretValue;
pub use tasks::{AnalysisTask, ResearchTask, TaskSpec};
pub use telemetry::{TelemetryOptions, init_telemetry};
pub use trace::{TraceCollector, TraceEvent, TraceStep, TraceSummary};
pub use verdict::Verdict;
pub use workflow::{
    CrewOutput, FactCheckCrew, LiveProviders, ProviderFactory, build_crew, run_fact_check,
    validate_headline,
};
