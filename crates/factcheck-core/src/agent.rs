//! Agents: a role profile bound to a chat model and an optional tool set.
//!
//! An agent works on a task through a bounded reason/act loop. Each model
//! reply either names a tool (`Action:` / `Action Input:`), whose output is
//! fed back as an `Observation:`, or carries the `Final Answer:`.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::llm::{ChatMessage, ChatModel, CompletionRequest};
use crate::prompts;
use crate::search::SearchTool;
use crate::tasks::TaskSpec;
use crate::{AgentConfig, FactCheckError};

static FINAL_ANSWER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)Final Answer\s*:\s*(.*)").expect("final answer pattern"));

static ACTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)Action\s*\d*\s*:\s*(.*?)\s*\n\s*Action\s*\d*\s*Input\s*\d*\s*:\s*(.*)")
        .expect("action pattern")
});

/// Role label, goal and backstory describing an agent's persona.
#[derive(Debug, Clone)]
pub struct AgentProfile {
    pub role: String,
    pub goal: String,
    pub backstory: String,
    pub allow_delegation: bool,
}

impl AgentProfile {
    pub fn new(
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            allow_delegation: false,
        }
    }

    pub fn researcher() -> Self {
        Self::new(
            prompts::RESEARCHER_ROLE,
            prompts::RESEARCHER_GOAL,
            prompts::RESEARCHER_BACKSTORY,
        )
    }

    pub fn analyst() -> Self {
        Self::new(
            prompts::ANALYST_ROLE,
            prompts::ANALYST_GOAL,
            prompts::ANALYST_BACKSTORY,
        )
    }
}

pub struct Agent {
    profile: AgentProfile,
    model: Arc<dyn ChatModel>,
    tools: Vec<Arc<dyn SearchTool>>,
    max_iterations: usize,
}

impl Agent {
    pub fn new(profile: AgentProfile, model: Arc<dyn ChatModel>) -> Self {
        Self {
            profile,
            model,
            tools: Vec::new(),
            max_iterations: AgentConfig::DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Researcher bound to the model and the search tool.
    pub fn researcher(
        model: Arc<dyn ChatModel>,
        search: Arc<dyn SearchTool>,
        config: &AgentConfig,
    ) -> Self {
        Self::new(AgentProfile::researcher(), model)
            .with_tool(search)
            .with_max_iterations(config.max_iterations)
    }

    /// Analyst bound to the model only.
    pub fn analyst(model: Arc<dyn ChatModel>, config: &AgentConfig) -> Self {
        Self::new(AgentProfile::analyst(), model).with_max_iterations(config.max_iterations)
    }

    pub fn with_tool(mut self, tool: Arc<dyn SearchTool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    pub fn role(&self) -> &str {
        &self.profile.role
    }

    pub fn can_search(&self) -> bool {
        !self.tools.is_empty()
    }

    /// Work on `task` until the model produces a final answer.
    ///
    /// `context` is the output of earlier tasks, appended verbatim to the
    /// task prompt.
    #[instrument(
        name = "agent.execute",
        skip_all,
        fields(role = %self.profile.role, task = %task.name)
    )]
    pub async fn execute(
        &self,
        task: &TaskSpec,
        context: Option<&str>,
    ) -> Result<String, FactCheckError> {
        let system = prompts::system_prompt(
            &self.profile.role,
            &self.profile.goal,
            &self.profile.backstory,
            &self.tools,
        );
        let mut request = CompletionRequest::new(system).with_message(ChatMessage::user(
            prompts::task_prompt(&task.description, &task.expected_output, context),
        ));
        if self.can_search() {
            request = request.with_stop_sequence(prompts::OBSERVATION_STOP);
        }

        info!(
            model = self.model.model_name(),
            tools = self.tools.len(),
            has_context = context.is_some(),
            "agent started task"
        );

        for iteration in 1..=self.max_iterations {
            let reply = self.model.complete(&request).await?;

            match parse_reply(&reply) {
                AgentStep::Final(answer) => {
                    info!(iteration, chars = answer.len(), "agent produced final answer");
                    return non_empty(answer, self.model.model_name());
                }
                AgentStep::Action { tool, input } => {
                    let observation = self.use_tool(&tool, &input).await?;
                    request.messages.push(ChatMessage::assistant(reply.trim_end()));
                    request
                        .messages
                        .push(ChatMessage::user(format!("Observation: {observation}")));
                }
                AgentStep::Unstructured if !self.can_search() => {
                    debug!(iteration, "accepting unstructured reply as final answer");
                    return non_empty(reply.trim().to_string(), self.model.model_name());
                }
                AgentStep::Unstructured => {
                    warn!(iteration, "reply followed neither action nor answer format");
                    request.messages.push(ChatMessage::assistant(reply.trim_end()));
                    request
                        .messages
                        .push(ChatMessage::user(prompts::FORMAT_REMINDER));
                }
            }
        }

        warn!(
            max_iterations = self.max_iterations,
            "iteration budget exhausted, forcing final answer"
        );
        request.stop_sequences.clear();
        request
            .messages
            .push(ChatMessage::user(prompts::FORCE_FINAL_ANSWER));
        let reply = self.model.complete(&request).await?;
        let answer = match parse_reply(&reply) {
            AgentStep::Final(answer) => answer,
            _ => reply.trim().to_string(),
        };
        non_empty(answer, self.model.model_name())
    }

    async fn use_tool(&self, name: &str, raw_input: &str) -> Result<String, FactCheckError> {
        let Some(tool) = self
            .tools
            .iter()
            .find(|tool| tool.name().eq_ignore_ascii_case(name))
        else {
            warn!(tool = name, "model requested unknown tool");
            return Ok(prompts::unknown_tool_observation(name, &self.tools));
        };

        let query = tool_query(raw_input);
        info!(tool = tool.name(), %query, "agent invoking tool");
        tool.search(&query).await
    }
}

#[derive(Debug, PartialEq)]
enum AgentStep {
    Final(String),
    Action { tool: String, input: String },
    Unstructured,
}

fn parse_reply(reply: &str) -> AgentStep {
    let final_answer = FINAL_ANSWER.captures(reply);
    let action = ACTION.captures(reply);

    let action_first = match (&action, &final_answer) {
        (Some(action), Some(answer)) => {
            let action_at = action.get(0).map(|m| m.start());
            let answer_at = answer.get(0).map(|m| m.start());
            action_at < answer_at
        }
        (Some(_), None) => true,
        _ => false,
    };

    if action_first {
        if let Some(captures) = action {
            let tool = captures[1]
                .trim()
                .trim_matches(|c: char| c == '*' || c == '`')
                .trim()
                .to_string();
            let input = captures[2]
                .split("\nObservation")
                .next()
                .unwrap_or_default()
                .trim()
                .to_string();
            return AgentStep::Action { tool, input };
        }
    }

    match final_answer {
        Some(captures) => AgentStep::Final(captures[1].trim().to_string()),
        None => AgentStep::Unstructured,
    }
}

/// Extract the search query from an `Action Input`, which may be JSON or plain text.
///
/// Only the first JSON value is read, so a fenced block or trailing chatter
/// after the object does not leak into the query.
fn tool_query(raw: &str) -> String {
    let body = strip_code_fence(raw);
    let first = serde_json::Deserializer::from_str(body)
        .into_iter::<Value>()
        .next();

    match first {
        Some(Ok(Value::Object(map))) => ["search_query", "query", "q"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .or_else(|| map.values().find_map(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string()),
        Some(Ok(Value::String(query))) => query,
        _ => body
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or_default()
            .trim_matches('"')
            .to_string(),
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.trim_matches('`').trim();
    };
    // Skip the info string (`json`, `text`) when the fence opens its own line.
    let body = match rest.split_once('\n') {
        Some((info, body)) if !info.trim_start().starts_with(['{', '"']) => body,
        _ => rest,
    };
    body.split("```").next().unwrap_or(body).trim()
}

fn non_empty(answer: String, model: &str) -> Result<String, FactCheckError> {
    if answer.trim().is_empty() {
        Err(FactCheckError::EmptyCompletion(model.to_string()))
    } else {
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatRole;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedModel {
        replies: Mutex<VecDeque<String>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedModel {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<String, FactCheckError> {
            self.requests.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| FactCheckError::EmptyCompletion("script exhausted".into()))
        }
    }

    #[derive(Default)]
    struct RecordingSearch {
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SearchTool for RecordingSearch {
        fn name(&self) -> &str {
            "search_the_internet"
        }

        fn description(&self) -> &str {
            "test search"
        }

        async fn search(&self, query: &str) -> Result<String, FactCheckError> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(format!("Title: result for {query}\nLink: https://example.org"))
        }
    }

    fn spec() -> TaskSpec {
        TaskSpec::research("Scientists confirm water on Mars")
    }

    #[tokio::test]
    async fn returns_text_after_final_answer_marker() {
        let model = ScriptedModel::new(&["Thought: I now know\nFinal Answer: The report.\n"]);
        let agent = Agent::new(AgentProfile::analyst(), model.clone());

        let answer = agent.execute(&spec(), None).await.unwrap();

        assert_eq!(answer, "The report.");
        let requests = model.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].system.contains("Fact-Checking Analyst"));
        assert!(requests[0].stop_sequences.is_empty());
    }

    #[tokio::test]
    async fn tool_output_is_fed_back_as_observation() {
        let model = ScriptedModel::new(&[
            "Thought: search first\nAction: search_the_internet\nAction Input: {\"search_query\": \"water on Mars NASA\"}",
            "Thought: I now know the final answer\nFinal Answer: NASA confirmed hydrated salts.",
        ]);
        let search = Arc::new(RecordingSearch::default());
        let agent = Agent::researcher(
            model.clone(),
            search.clone(),
            &AgentConfig { max_iterations: 5 },
        );

        let answer = agent.execute(&spec(), None).await.unwrap();

        assert_eq!(answer, "NASA confirmed hydrated salts.");
        assert_eq!(
            search.queries.lock().unwrap().as_slice(),
            ["water on Mars NASA"]
        );

        let requests = model.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].stop_sequences, vec!["\nObservation:".to_string()]);
        let last = requests[1].messages.last().unwrap();
        assert_eq!(last.role, ChatRole::User);
        assert!(
            last.content
                .starts_with("Observation: Title: result for water on Mars NASA")
        );
    }

    #[tokio::test]
    async fn unknown_tool_lists_available_actions() {
        let model = ScriptedModel::new(&[
            "Action: browse\nAction Input: https://example.org",
            "Final Answer: done",
        ]);
        let search = Arc::new(RecordingSearch::default());
        let agent = Agent::researcher(
            model.clone(),
            search.clone(),
            &AgentConfig { max_iterations: 3 },
        );

        agent.execute(&spec(), None).await.unwrap();

        assert!(search.queries.lock().unwrap().is_empty());
        let requests = model.requests();
        let observation = &requests[1].messages.last().unwrap().content;
        assert!(observation.contains("[search_the_internet]"));
    }

    #[tokio::test]
    async fn exhausted_budget_forces_final_answer() {
        let model = ScriptedModel::new(&[
            "I am thinking about it.",
            "Still thinking.",
            "Everything points to a hoax.",
        ]);
        let search = Arc::new(RecordingSearch::default());
        let agent = Agent::researcher(model.clone(), search, &AgentConfig { max_iterations: 2 });

        let answer = agent.execute(&spec(), None).await.unwrap();

        assert_eq!(answer, "Everything points to a hoax.");
        let requests = model.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[2].stop_sequences.is_empty());
        let reminder = &requests[2].messages.last().unwrap().content;
        assert!(reminder.contains("MUST give your absolute best final answer"));
    }

    #[tokio::test]
    async fn toolless_agent_accepts_unstructured_reply() {
        let model = ScriptedModel::new(&["Verdict: False. The claim has no support."]);
        let agent = Agent::analyst(model, &AgentConfig { max_iterations: 3 });

        let answer = agent
            .execute(&TaskSpec::analysis(), Some("research report"))
            .await
            .unwrap();
        assert_eq!(answer, "Verdict: False. The claim has no support.");
    }

    #[tokio::test]
    async fn context_is_appended_to_task_prompt() {
        let model = ScriptedModel::new(&["Final Answer: Verified"]);
        let agent = Agent::analyst(model.clone(), &AgentConfig { max_iterations: 1 });

        agent
            .execute(&TaskSpec::analysis(), Some("REPORT-BODY-123"))
            .await
            .unwrap();

        let prompt = model.requests()[0].user_text();
        assert!(prompt.contains("This is the context you're working with:\nREPORT-BODY-123"));
    }

    #[tokio::test]
    async fn empty_final_answer_is_an_error() {
        let model = ScriptedModel::new(&["Final Answer:   "]);
        let agent = Agent::analyst(model, &AgentConfig { max_iterations: 1 });

        let err = agent.execute(&TaskSpec::analysis(), None).await.unwrap_err();
        assert!(matches!(err, FactCheckError::EmptyCompletion(_)));
    }

    #[test]
    fn parse_prefers_whichever_marker_comes_first() {
        let reply = "Action: search_the_internet\nAction Input: moon\nObservation: x\nFinal Answer: y";
        assert_eq!(
            parse_reply(reply),
            AgentStep::Action {
                tool: "search_the_internet".into(),
                input: "moon".into()
            }
        );
        assert_eq!(
            parse_reply("Final Answer: Action: none"),
            AgentStep::Final("Action: none".into())
        );
        assert_eq!(parse_reply("no markers"), AgentStep::Unstructured);
    }

    #[test]
    fn tool_query_accepts_json_or_plain_text() {
        assert_eq!(tool_query(r#"{"search_query": "a b"}"#), "a b");
        assert_eq!(tool_query(r#"{"other": "c"}"#), "c");
        assert_eq!(tool_query(r#""quoted""#), "quoted");
        assert_eq!(tool_query("plain words"), "plain words");
    }

    #[test]
    fn tool_query_reads_fenced_json() {
        let fenced = "```json\n{\"search_query\": \"moon landing hoax\"}\n```";
        assert_eq!(tool_query(fenced), "moon landing hoax");
        assert_eq!(tool_query("```\n\"mars water\"\n```"), "mars water");
        assert_eq!(tool_query("`{\"q\": \"inline\"}`"), "inline");
    }

    #[test]
    fn tool_query_ignores_text_after_the_input() {
        assert_eq!(
            tool_query("{\"search_query\": \"moon hoax\"}\nThought: wait"),
            "moon hoax"
        );
        assert_eq!(tool_query("moon hoax\nThought: wait"), "moon hoax");
    }

    #[tokio::test]
    async fn fenced_action_input_reaches_search_as_query() {
        let model = ScriptedModel::new(&[
            "Action: search_the_internet\nAction Input: ```json\n{\"search_query\": \"acme merger\"}\n```",
            "Final Answer: merger confirmed",
        ]);
        let search = Arc::new(RecordingSearch::default());
        let agent = Agent::researcher(model, search.clone(), &AgentConfig { max_iterations: 3 });

        agent.execute(&spec(), None).await.unwrap();

        assert_eq!(search.queries.lock().unwrap().as_slice(), ["acme merger"]);
    }
}
