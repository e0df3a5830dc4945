use std::sync::Arc;

use graph_flow::{
    ExecutionStatus, FlowRunner, GraphBuilder, InMemorySessionStorage, Session, SessionStorage,
    Task,
};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::agent::Agent;
use crate::llm::{ChatModel, GeminiModel};
use crate::search::{SearchTool, SerperSearch};
use crate::tasks::{
    ANALYSIS_OUTPUT_KEY, AnalysisTask, HEADLINE_KEY, RESEARCH_OUTPUT_KEY, ResearchTask, TRACE_KEY,
};
use crate::trace::{TraceCollector, TraceEvent};
use crate::{AgentConfig, Config, FactCheckError, Verdict};

/// Source of the remote clients a crew is built from.
///
/// Called once per fact-check so every request gets fresh handles.
pub trait ProviderFactory: Send + Sync {
    fn chat_model(&self) -> Result<Arc<dyn ChatModel>, FactCheckError>;
    fn search_tool(&self) -> Result<Arc<dyn SearchTool>, FactCheckError>;
}

/// Gemini + Serper clients built from [`Config`].
#[derive(Clone)]
pub struct LiveProviders {
    config: Arc<Config>,
}

impl LiveProviders {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

impl ProviderFactory for LiveProviders {
    fn chat_model(&self) -> Result<Arc<dyn ChatModel>, FactCheckError> {
        Ok(Arc::new(GeminiModel::from_config(&self.config.model)))
    }

    fn search_tool(&self) -> Result<Arc<dyn SearchTool>, FactCheckError> {
        Ok(Arc::new(SerperSearch::from_config(&self.config.search)))
    }
}

/// Everything a crew run produced.
#[derive(Debug, Clone, Serialize)]
pub struct CrewOutput {
    pub research: String,
    pub analysis: String,
    pub verdict: Option<Verdict>,
    pub trace: Vec<TraceEvent>,
}

impl CrewOutput {
    pub fn trace_collector(&self) -> TraceCollector {
        TraceCollector::from_events(self.trace.clone())
    }
}

/// Researcher and Analyst run as a strict two-stage sequence.
pub struct FactCheckCrew {
    researcher: Arc<Agent>,
    analyst: Arc<Agent>,
}

impl FactCheckCrew {
    pub fn new(researcher: Agent, analyst: Agent) -> Self {
        Self {
            researcher: Arc::new(researcher),
            analyst: Arc::new(analyst),
        }
    }

    fn build_graph(&self, headline: &str) -> Arc<graph_flow::Graph> {
        let research = Arc::new(ResearchTask::new(self.researcher.clone(), headline));
        let analysis = Arc::new(AnalysisTask::new(self.analyst.clone()));

        let graph = GraphBuilder::new("factcheck_crew")
            .add_task(research.clone())
            .add_task(analysis.clone())
            .add_edge(research.id(), analysis.id())
            .set_start_task(research.id())
            .build();

        Arc::new(graph)
    }

    /// Run research then analysis for `headline` and return both outputs.
    #[instrument(name = "crew.kickoff", skip(self))]
    pub async fn kickoff(&self, headline: &str) -> Result<CrewOutput, FactCheckError> {
        validate_headline(headline)?;

        let graph = self.build_graph(headline);
        let storage = Arc::new(InMemorySessionStorage::new());
        let runner = FlowRunner::new(graph, storage.clone());

        let session_id = format!("crew-{}", Uuid::new_v4());
        let session = Session::new_from_task(session_id.clone(), ResearchTask::ID);
        session.context.set(HEADLINE_KEY, headline.to_string()).await;

        storage
            .save(session)
            .await
            .map_err(|err| FactCheckError::Workflow(format!("failed to persist session: {err}")))?;

        info!(%session_id, "crew kickoff");

        loop {
            let result = runner
                .run(&session_id)
                .await
                .map_err(|err| FactCheckError::Workflow(err.to_string()))?;

            match result.status {
                ExecutionStatus::Completed => break,
                ExecutionStatus::Error(message) => return Err(FactCheckError::Workflow(message)),
                _ => continue,
            }
        }

        let session = storage
            .get(&session_id)
            .await
            .map_err(|err| FactCheckError::Workflow(format!("failed to reload session: {err}")))?
            .ok_or_else(|| FactCheckError::Workflow("session missing after execution".into()))?;

        let research: String = session
            .context
            .get(RESEARCH_OUTPUT_KEY)
            .await
            .ok_or_else(|| FactCheckError::Workflow("research stage recorded no output".into()))?;
        let analysis: String = session
            .context
            .get(ANALYSIS_OUTPUT_KEY)
            .await
            .ok_or_else(|| FactCheckError::Workflow("analysis stage recorded no output".into()))?;
        let trace: Vec<TraceEvent> = session.context.get(TRACE_KEY).await.unwrap_or_default();

        let verdict = Verdict::detect(&analysis);
        info!(
            %session_id,
            verdict = verdict.map(|v| v.as_str()).unwrap_or("unlabelled"),
            stages = trace.len(),
            "crew execution finished"
        );

        Ok(CrewOutput {
            research,
            analysis,
            verdict,
            trace,
        })
    }
}

/// Reject the empty headline; anything else is passed through untouched.
pub fn validate_headline(headline: &str) -> Result<(), FactCheckError> {
    if headline.is_empty() {
        return Err(FactCheckError::EmptyHeadline);
    }
    Ok(())
}

/// Build fresh clients, agents and crew from `providers`.
pub fn build_crew(
    providers: &dyn ProviderFactory,
    agents: &AgentConfig,
) -> Result<FactCheckCrew, FactCheckError> {
    let model = providers.chat_model()?;
    let search = providers.search_tool()?;

    let researcher = Agent::researcher(model.clone(), search, agents);
    let analyst = Agent::analyst(model, agents);

    Ok(FactCheckCrew::new(researcher, analyst))
}

/// Build a fresh crew from `providers` and run it on `headline`.
///
/// The headline is validated by [`FactCheckCrew::kickoff`] before any model call.
pub async fn run_fact_check(
    headline: &str,
    providers: &dyn ProviderFactory,
    agents: &AgentConfig,
) -> Result<CrewOutput, FactCheckError> {
    build_crew(providers, agents)?.kickoff(headline).await
}
