//! Follow-up question suggestions.

use docchat_core::{ChatLlm, ChatMessage};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{debug, warn};

/// Placeholder replaced by the rendered conversation
pub const CONVERSATION_PLACEHOLDER: &str = "{conversation}";

/// Built-in prompt template for follow-up questions
pub const NEXT_QUESTION_PROMPT: &str = "You're a helpful assistant!
Your task is to suggest the next question that user might ask.
Here is the conversation history
---------------------
{conversation}
---------------------
Given the conversation history, please give me 3 questions that user might ask next!
Your answer should be wrapped in three sticks which follows the following format:
```
<question 1>
<question 2>
<question 3>
```
";

static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(.*?)```").expect("valid fenced block regex"));

/// Generates follow-up questions from a finished conversation
#[derive(Debug, Clone)]
pub struct SuggestionGenerator {
    llm: Arc<dyn ChatLlm>,
    prompt_template: String,
}

impl SuggestionGenerator {
    /// Create a generator using the built-in prompt
    pub fn new(llm: Arc<dyn ChatLlm>) -> Self {
        Self {
            llm,
            prompt_template: NEXT_QUESTION_PROMPT.to_string(),
        }
    }

    /// Use a custom prompt template; `None` keeps the built-in one
    pub fn with_prompt_template(mut self, template: Option<String>) -> Self {
        if let Some(template) = template {
            self.prompt_template = template;
        }
        self
    }

    /// Render the prompt for a conversation.
    ///
    /// Only the first `{conversation}` placeholder is substituted.
    pub fn build_prompt(&self, conversation: &[ChatMessage]) -> String {
        let text = conversation
            .iter()
            .map(|message| format!("{}: {}", message.role, message.content))
            .collect::<Vec<_>>()
            .join("\n");
        self.prompt_template
            .replacen(CONVERSATION_PLACEHOLDER, &text, 1)
    }

    /// Ask the model for follow-up questions.
    ///
    /// Failures are logged and yield an empty list.
    pub async fn generate(&self, conversation: &[ChatMessage]) -> Vec<String> {
        let prompt = self.build_prompt(conversation);
        match self.llm.generate_text(&prompt).await {
            Ok(text) => {
                let questions = extract_questions(&text);
                debug!(count = questions.len(), "Generated follow-up questions");
                questions
            }
            Err(err) => {
                warn!("Error when generating the next questions: {err}");
                Vec::new()
            }
        }
    }
}

/// Extract one question per non-blank line of the first fenced block
pub fn extract_questions(text: &str) -> Vec<String> {
    let Some(content) = FENCED_BLOCK.captures(text).and_then(|caps| caps.get(1)) else {
        return Vec::new();
    };

    content
        .as_str()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
