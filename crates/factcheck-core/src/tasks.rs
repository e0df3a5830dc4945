use std::sync::Arc;

use async_trait::async_trait;
use graph_flow::{Context, GraphError, NextAction, Task, TaskResult};
use tracing::{info, instrument};

use crate::agent::Agent;
use crate::prompts;
use crate::trace::TraceEvent;

pub(crate) const HEADLINE_KEY: &str = "headline";
pub(crate) const RESEARCH_OUTPUT_KEY: &str = "research.output";
pub(crate) const ANALYSIS_OUTPUT_KEY: &str = "analysis.output";
pub(crate) const TRACE_KEY: &str = "trace.events";

/// Prompted unit of work: what to do and what the answer should look like.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub name: String,
    pub description: String,
    pub expected_output: String,
}

impl TaskSpec {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        expected_output: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            expected_output: expected_output.into(),
        }
    }

    pub fn research(headline: &str) -> Self {
        Self::new(
            ResearchTask::ID,
            prompts::research_description(headline),
            prompts::RESEARCH_EXPECTED_OUTPUT,
        )
    }

    pub fn analysis() -> Self {
        Self::new(
            AnalysisTask::ID,
            prompts::ANALYSIS_DESCRIPTION,
            prompts::ANALYSIS_EXPECTED_OUTPUT,
        )
    }
}

async fn record_trace(context: &Context, task_id: &str, message: String) {
    let mut events: Vec<TraceEvent> = context.get(TRACE_KEY).await.unwrap_or_default();
    events.push(TraceEvent::new(task_id, message));
    context.set(TRACE_KEY, &events).await;
}

fn task_failure(task_id: &str, err: impl std::fmt::Display) -> GraphError {
    GraphError::TaskExecutionFailed(format!("{task_id}: {err}"))
}

/// First stage: the Researcher investigates the headline.
pub struct ResearchTask {
    agent: Arc<Agent>,
    spec: TaskSpec,
}

impl ResearchTask {
    pub const ID: &'static str = "research";

    pub fn new(agent: Arc<Agent>, headline: &str) -> Self {
        Self {
            agent,
            spec: TaskSpec::research(headline),
        }
    }

    pub fn spec(&self) -> &TaskSpec {
        &self.spec
    }
}

#[async_trait]
impl Task for ResearchTask {
    fn id(&self) -> &str {
        Self::ID
    }

    #[instrument(name = "task.research", skip(self, context))]
    async fn run(&self, context: Context) -> graph_flow::Result<TaskResult> {
        let report = self
            .agent
            .execute(&self.spec, None)
            .await
            .map_err(|err| task_failure(Self::ID, err))?;

        context.set(RESEARCH_OUTPUT_KEY, report.clone()).await;
        record_trace(
            &context,
            Self::ID,
            format!("{} reported ({} chars)", self.agent.role(), report.len()),
        )
        .await;

        info!(chars = report.len(), "research stage completed");

        Ok(TaskResult::new(
            Some(format!("Research completed by {}", self.agent.role())),
            NextAction::ContinueAndExecute,
        ))
    }
}

/// Second stage: the Analyst turns the research report into a verdict.
pub struct AnalysisTask {
    agent: Arc<Agent>,
    spec: TaskSpec,
}

impl AnalysisTask {
    pub const ID: &'static str = "analysis";

    pub fn new(agent: Arc<Agent>) -> Self {
        Self {
            agent,
            spec: TaskSpec::analysis(),
        }
    }

    pub fn spec(&self) -> &TaskSpec {
        &self.spec
    }
}

#[async_trait]
impl Task for AnalysisTask {
    fn id(&self) -> &str {
        Self::ID
    }

    #[instrument(name = "task.analysis", skip(self, context))]
    async fn run(&self, context: Context) -> graph_flow::Result<TaskResult> {
        let report: String = context
            .get(RESEARCH_OUTPUT_KEY)
            .await
            .ok_or_else(|| task_failure(Self::ID, "research output missing from context"))?;

        let verdict = self
            .agent
            .execute(&self.spec, Some(&report))
            .await
            .map_err(|err| task_failure(Self::ID, err))?;

        context.set(ANALYSIS_OUTPUT_KEY, verdict.clone()).await;
        record_trace(
            &context,
            Self::ID,
            format!("{} concluded ({} chars)", self.agent.role(), verdict.len()),
        )
        .await;

        info!(chars = verdict.len(), "analysis stage completed");

        Ok(TaskResult::new(Some(verdict), NextAction::End))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn research_spec_embeds_headline() {
        let spec = TaskSpec::research("Eiffel Tower to be sold for scrap");
        assert_eq!(spec.name, "research");
        assert!(
            spec.description
                .starts_with("Investigate the news headline: 'Eiffel Tower to be sold for scrap'.")
        );
        assert!(spec.expected_output.contains("URLs of the sources"));
    }

    #[test]
    fn analysis_spec_lists_verdict_vocabulary() {
        let spec = TaskSpec::analysis();
        for label in crate::Verdict::ALL {
            assert!(
                spec.expected_output.contains(&format!("'{label}'")),
                "missing {label}"
            );
        }
    }
}
