use serde::{Deserialize, Serialize};

use crate::errors::AiError;
use crate::model::InteractiveQuestion;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Usage,
}

impl ChatResponse {
    /// Extract the assistant text, or a parse error when the provider
    /// returned an empty choice list.
    pub fn into_text(self) -> Result<String, AiError> {
        self.choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| AiError::Parse("response contained no choices".to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: usize,
    pub message: Message,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: usize,
    #[serde(default)]
    pub completion_tokens: usize,
    #[serde(default)]
    pub total_tokens: usize,
}

/// One quiz item as emitted by the model. Field names follow the prompt's
/// requested JSON shape, hence the camelCase rename.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizItem {
    #[serde(default)]
    pub id: String,
    pub timestamp: f64,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

impl QuizItem {
    fn into_question(self, index: usize) -> InteractiveQuestion {
        let id = if self.id.is_empty() {
            format!("q{}", index + 1)
        } else {
            self.id
        };
        InteractiveQuestion {
            id,
            timestamp_secs: self.timestamp,
            question: self.question,
            options: self.options,
            correct_answer: self.correct_answer,
        }
    }
}

/// Parse model output into a validated question list.
///
/// Tolerates Markdown code fences around the JSON array. Items that fail
/// lesson validation (correct answer not among options, fewer than two
/// options, negative timestamp) make the whole parse fail so the caller
/// substitutes the placeholder set instead of serving a broken quiz.
pub fn parse_quiz(raw: &str) -> Result<Vec<InteractiveQuestion>, AiError> {
    let stripped = strip_code_fences(raw);
    let items: Vec<QuizItem> = serde_json::from_str(stripped)
        .map_err(|e| AiError::Parse(format!("quiz JSON: {e}")))?;

    let questions: Vec<InteractiveQuestion> = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| item.into_question(i))
        .collect();

    crate::model::validate_questions(&questions)
        .map_err(|e| AiError::Parse(format!("quiz validation: {e}")))?;
    Ok(questions)
}

fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}
