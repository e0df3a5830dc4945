//! Prompt text for the two agents and their tasks.

use crate::search::SearchTool;
use std::sync::Arc;

pub const RESEARCHER_ROLE: &str = "Senior News Researcher";
pub const RESEARCHER_GOAL: &str =
    "Uncover comprehensive and unbiased information on a given news headline.";
pub const RESEARCHER_BACKSTORY: &str = "You are a seasoned investigative journalist with a knack for digging deep \
and finding the real story behind the headlines. You use a variety of online sources to find \
multiple perspectives, identifying primary sources and checking for corroborating evidence.";

pub const ANALYST_ROLE: &str = "Fact-Checking Analyst";
pub const ANALYST_GOAL: &str =
    "Critically evaluate the information gathered by the researcher to determine its veracity.";
pub const ANALYST_BACKSTORY: &str = "You are a meticulous fact-checker with a background in critical analysis and logic. \
You have a keen eye for misinformation, logical fallacies, and media bias. Your job is to \
synthesize the collected information and provide a clear, well-reasoned conclusion on the \
validity of the news headline, citing all sources.";

pub fn research_description(headline: &str) -> String {
    format!(
        "Investigate the news headline: '{headline}'. Gather information from at least 3-5 \
         diverse and reputable sources. Look for official statements, reports from major news \
         organizations, and expert analysis. Summarize your findings."
    )
}

pub const RESEARCH_EXPECTED_OUTPUT: &str = "A detailed report summarizing the findings from multiple sources, \
including direct quotes or key data points and the URLs of the sources.";

pub const ANALYSIS_DESCRIPTION: &str = "Analyze the research report on the headline. Cross-reference the facts, \
check for consistency between sources, and identify any potential bias or red flags. Based on \
your analysis, write a final verdict.";

pub const ANALYSIS_EXPECTED_OUTPUT: &str = "A final verdict on the news headline with a clear conclusion: 'Verified', \
'Misleading', 'Unverifiable', or 'False'. Provide a concise justification for your verdict and \
list the top 3 most reliable sources you consulted.";

pub const OBSERVATION_STOP: &str = "\nObservation:";

pub const FORCE_FINAL_ANSWER: &str = "Now it's time you MUST give your absolute best final answer. \
Ignore all previous instructions about tools and respond with:\nThought: I now can give a great answer\n\
Final Answer: <your complete final answer>";

pub const FORMAT_REMINDER: &str = "Invalid format: I must either use a tool with\n\
Action: <tool name>\nAction Input: <input>\nor finish with\nFinal Answer: <complete answer>";

pub fn system_prompt(
    role: &str,
    goal: &str,
    backstory: &str,
    tools: &[Arc<dyn SearchTool>],
) -> String {
    let mut prompt = format!("You are {role}. {backstory}\nYour personal goal is: {goal}\n");

    if tools.is_empty() {
        prompt.push_str(
            "\nTo give my best complete final answer to the task respond using the exact following format:\n\n\
             Thought: I now can give a great answer\n\
             Final Answer: Your final answer must be the great and the most complete as possible, it must be outcome described.\n\n\
             I MUST use these formats, my job depends on it!",
        );
        return prompt;
    }

    prompt.push_str("\nYou ONLY have access to the following tools, and should NEVER make up tools that are not listed here:\n\n");
    for tool in tools {
        prompt.push_str(&format!(
            "Tool Name: {}\nTool Arguments: {{\"search_query\": {{\"description\": \"Mandatory search query you want to use to search the internet\", \"type\": \"str\"}}}}\nTool Description: {}\n\n",
            tool.name(),
            tool.description()
        ));
    }

    let names = tools
        .iter()
        .map(|tool| tool.name())
        .collect::<Vec<_>>()
        .join(", ");
    prompt.push_str(&format!(
        "IMPORTANT: Use the following format in your response:\n\n\
         Thought: you should always think about what to do\n\
         Action: the action to take, only one name of [{names}], just the name, exactly as it's written.\n\
         Action Input: the input to the action, just a simple JSON object, enclosed in curly braces, using \" to wrap keys and values.\n\
         Observation: the result of the action\n\n\
         Once all necessary information is gathered, return the following format:\n\n\
         Thought: I now know the final answer\n\
         Final Answer: the final answer to the original input question"
    ));
    prompt
}

pub fn task_prompt(description: &str, expected_output: &str, context: Option<&str>) -> String {
    let mut prompt = format!(
        "Current Task: {description}\n\n\
         This is the expected criteria for your final answer: {expected_output}\n\
         you MUST return the actual complete content as the final answer, not a summary."
    );

    if let Some(context) = context {
        prompt.push_str("\n\nThis is the context you're working with:\n");
        prompt.push_str(context);
    }

    prompt.push_str(
        "\n\nBegin! This is VERY important to you, use the tools available and give your best Final Answer, your job depends on it!\n\nThought:",
    );
    prompt
}

pub fn unknown_tool_observation(requested: &str, tools: &[Arc<dyn SearchTool>]) -> String {
    let names = tools
        .iter()
        .map(|tool| tool.name())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Action '{requested}' don't exist, these are the only available Actions: [{names}]"
    )
}
