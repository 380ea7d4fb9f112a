use thiserror::Error;

/// The central error type for the tutorkit system.
///
/// This hierarchy enables programmatic recovery and unified error handling
/// across the scheduler, AI gateway, store, and session layers.
#[derive(Error, Debug)]
pub enum TutorError {
    #[error("AI gateway error: {0}")]
    Ai(#[from] AiError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Lesson error: {0}")]
    Lesson(#[from] LessonError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failures from the generative-AI capability.
///
/// Classification happens exactly once, at the HTTP boundary
/// (`gateway::client`), so the retry policy never inspects message text.
#[derive(Error, Debug, Clone)]
pub enum AiError {
    #[error("Rate limit exceeded. Retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("AI request timed out")]
    Timeout,

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("AI API returned status {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Failed to parse AI response: {0}")]
    Parse(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("AI gateway shut down before the request completed")]
    GatewayClosed,
}

impl AiError {
    /// Rate-limit/quota classification consumed by the retry policy and the
    /// offline-fallback path. Everything else propagates without retry.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, AiError::RateLimited { .. })
    }

    /// Classify a non-success HTTP response into a typed error.
    ///
    /// 429 and quota-marked bodies become `RateLimited`; 401/403 become
    /// `Authentication`; the rest keep their status code.
    pub fn from_status(status: u16, message: &str) -> Self {
        let lowered = message.to_lowercase();
        if status == 429 || lowered.contains("quota") || lowered.contains("rate limit") {
            return AiError::RateLimited {
                retry_after_secs: None,
            };
        }
        match status {
            401 | 403 => AiError::Authentication(message.to_string()),
            _ => AiError::HttpStatus {
                status,
                message: message.to_string(),
            },
        }
    }
}

/// Failures from the consumed store contracts (lessons, mistakes, progress).
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

/// Lesson content validation failures.
///
/// Raised when a lesson is stored or a playback session starts; a lesson
/// that passes validation upholds the scheduler's invariants for the whole
/// session (`correct_answer` is always one of `options`, ids are unique).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LessonError {
    #[error("Duplicate question id within lesson: {id}")]
    DuplicateQuestionId { id: String },

    #[error("Question {id}: correct answer is not one of the options")]
    CorrectAnswerNotInOptions { id: String },

    #[error("Question {id}: needs at least 2 options, got {count}")]
    TooFewOptions { id: String, count: usize },

    #[error("Question {id}: negative timestamp {timestamp}")]
    NegativeTimestamp { id: String, timestamp: f64 },
}

/// Scheduler state violations surfaced to the embedding UI.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("No question is currently active")]
    NoActiveQuestion,

    #[error("A question overlay is already open")]
    QuestionOpen,

    #[error("Question index {index} out of range (lesson has {len} questions)")]
    IndexOutOfRange { index: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, TutorError>;
