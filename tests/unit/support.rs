//! Shared fixtures for the unit test suite.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tutorkit::{AiError, InteractiveQuestion, Lesson, ModelClient};

/// Scripted model client: returns queued outcomes in order, then errors so
/// tests notice unexpected extra calls.
pub struct ScriptedClient {
    outcomes: Mutex<VecDeque<Result<String, AiError>>>,
    calls: AtomicUsize,
}

impl ScriptedClient {
    pub fn with_outcomes(outcomes: Vec<Result<String, AiError>>) -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::from(outcomes)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next(&self) -> Result<String, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcomes
            .lock()
            .expect("script lock poisoned")
            .pop_front()
            .unwrap_or_else(|| {
                Err(AiError::Network(
                    "ScriptedClient: no more outcomes queued".to_string(),
                ))
            })
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    async fn generate_text(&self, _prompt: &str) -> Result<String, AiError> {
        self.next()
    }

    async fn analyze_image(
        &self,
        _prompt: &str,
        _image_base64: &str,
        _media_type: &str,
    ) -> Result<String, AiError> {
        self.next()
    }
}

pub fn rate_limited() -> AiError {
    AiError::RateLimited {
        retry_after_secs: None,
    }
}

pub fn question(id: &str, timestamp_secs: f64) -> InteractiveQuestion {
    InteractiveQuestion {
        id: id.to_string(),
        timestamp_secs,
        question: format!("Question {id}?"),
        options: vec!["A".to_string(), "B".to_string(), "C".to_string()],
        correct_answer: "B".to_string(),
    }
}

pub fn lesson(id: &str, questions: Vec<InteractiveQuestion>) -> Lesson {
    let now = Utc::now();
    Lesson {
        id: id.to_string(),
        title: "Fractions".to_string(),
        content: "Halves and quarters".to_string(),
        subject: "Math".to_string(),
        grade_level: "4".to_string(),
        cover_image_url: None,
        video_link: None,
        attachments: vec![],
        interactive_questions: questions,
        created_at: now,
        updated_at: now,
    }
}
