//! AI Request Gateway
//!
//! Serializes every outbound generative-AI call through a single FIFO
//! queue with fixed inter-request spacing, retries rate-limited calls with
//! capped exponential backoff, and degrades to canned offline messages
//! when the capability stays unavailable.
//!
//! # Architecture
//!
//! ```text
//! caller ──submit──▶ mpsc queue ──▶ worker task ──▶ ModelClient
//!    ▲                                  │  one unit at a time,
//!    └──── oneshot result handle ◀──────┘  fixed sleep between units
//! ```
//!
//! The single worker task *is* the re-entrancy guard: units of work never
//! overlap and complete in strict submission order. Queue state is owned by
//! the worker (channel transfer), so no lock is needed around it.

pub mod client;
pub mod types;

pub use client::{encode_image, HttpModelClient, ModelClient};

use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::GatewayConfig;
use crate::errors::AiError;
use crate::model::InteractiveQuestion;

/// Which caller-facing feature a degraded response stands in for. Each
/// context has its own offline message so the UI copy stays appropriate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackContext {
    Chat,
    Question,
    Explanation,
    ImageAnalysis,
}

impl FallbackContext {
    /// Canned response substituted when retries exhaust on a rate-limit or
    /// quota classification. Resolved, never rejected.
    pub fn offline_message(&self) -> &'static str {
        match self {
            FallbackContext::Chat => {
                "The AI tutor is taking a short break. Your lesson keeps going — \
                 try asking again in a minute."
            }
            FallbackContext::Question => {
                "The AI question generator is temporarily unavailable. \
                 A practice set has been prepared for you instead."
            }
            FallbackContext::Explanation => {
                "A detailed explanation isn't available right now."
            }
            FallbackContext::ImageAnalysis => {
                "Image analysis is temporarily unavailable. Please try again \
                 in a few minutes."
            }
        }
    }
}

/// Deterministic explanation shown when the AI cannot produce one. Always
/// references what the learner picked and what was expected.
pub fn explanation_fallback(user_answer: &str, correct_answer: &str) -> String {
    format!(
        "{} You answered \"{}\", but the correct answer is \"{}\". \
         Review this part of the lesson and try the question again.",
        FallbackContext::Explanation.offline_message(),
        user_answer,
        correct_answer
    )
}

/// The fixed practice set substituted when quiz generation fails to parse.
pub fn placeholder_quiz() -> Vec<InteractiveQuestion> {
    let spec = [
        (
            "q1",
            30.0,
            "What is the main topic introduced at the start of this lesson?",
        ),
        (
            "q2",
            120.0,
            "Which statement best summarizes the section you just watched?",
        ),
        (
            "q3",
            300.0,
            "How would you apply what this lesson covered?",
        ),
    ];
    spec.iter()
        .map(|(id, timestamp_secs, question)| InteractiveQuestion {
            id: id.to_string(),
            timestamp_secs: *timestamp_secs,
            question: question.to_string(),
            options: vec![
                "Option A".to_string(),
                "Option B".to_string(),
                "Option C".to_string(),
                "Option D".to_string(),
            ],
            correct_answer: "Option A".to_string(),
        })
        .collect()
}

/// Backoff policy applied to rate-limited units of work.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, first try included.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    /// Delay before retry number `retry` (0-based): `2^retry * base`,
    /// capped at `max_delay`.
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as u64;
        let exp = base_ms.saturating_mul(2u64.saturating_pow(retry));
        Duration::from_millis(exp.min(self.max_delay.as_millis() as u64))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&GatewayConfig::default())
    }
}

/// Run one unit of work under the retry policy. Only rate-limit
/// classifications are retried; any other error propagates on first sight.
async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, AiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AiError>>,
{
    let mut last: Option<AiError> = None;
    for attempt in 0..policy.max_attempts {
        if attempt > 0 {
            let delay = policy.delay_for_retry(attempt - 1);
            warn!(
                "Rate limited; retry {}/{} after {:?}",
                attempt,
                policy.max_attempts - 1,
                delay
            );
            tokio::time::sleep(delay).await;
        }
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_rate_limited() => last = Some(e),
            Err(e) => return Err(e),
        }
    }
    Err(last.unwrap_or(AiError::RateLimited {
        retry_after_secs: None,
    }))
}

type Job = BoxFuture<'static, ()>;

/// Owns the request queue and its single drain worker. Construct once per
/// process and share via `Arc`; dropping the gateway aborts the worker and
/// pending handles resolve with `AiError::GatewayClosed`.
pub struct AiGateway {
    jobs: mpsc::UnboundedSender<Job>,
    worker: JoinHandle<()>,
    client: Arc<dyn ModelClient>,
    retry: RetryPolicy,
}

impl AiGateway {
    pub fn new(client: Arc<dyn ModelClient>, config: &GatewayConfig) -> Self {
        let (jobs, mut rx) = mpsc::unbounded_channel::<Job>();
        let spacing = config.queue_delay();

        let worker = tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                job.await;
                // Enforced minimum spacing between completions, success or not.
                tokio::time::sleep(spacing).await;
            }
            debug!("AI gateway queue closed; worker exiting");
        });

        Self {
            jobs,
            worker,
            client,
            retry: RetryPolicy::from_config(config),
        }
    }

    /// Append a unit of work to the FIFO queue and await its outcome.
    async fn submit<T, F>(&self, work: F) -> Result<T, AiError>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, AiError>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::pin(async move {
            let result = work.await;
            // Receiver may have been dropped (caller gave up); the unit
            // still ran to completion, its result is simply discarded.
            let _ = tx.send(result);
        });

        self.jobs.send(job).map_err(|_| AiError::GatewayClosed)?;
        rx.await.map_err(|_| AiError::GatewayClosed)?
    }

    fn resolve_or_fallback(
        result: Result<String, AiError>,
        context: FallbackContext,
    ) -> Result<String, AiError> {
        match result {
            Ok(text) => Ok(text),
            Err(e) if e.is_rate_limited() => {
                info!("AI capability exhausted retries ({e}); serving {context:?} fallback");
                Ok(context.offline_message().to_string())
            }
            Err(e) => Err(e),
        }
    }

    /// Generate free text from a prompt.
    pub async fn generate_text(&self, prompt: &str) -> Result<String, AiError> {
        let client = Arc::clone(&self.client);
        let retry = self.retry.clone();
        let prompt = prompt.to_string();
        let result = self
            .submit(async move {
                with_retry(&retry, || {
                    let client = Arc::clone(&client);
                    let prompt = prompt.clone();
                    async move { client.generate_text(&prompt).await }
                })
                .await
            })
            .await;
        Self::resolve_or_fallback(result, FallbackContext::Chat)
    }

    /// Analyze a base64-encoded image and return descriptive text.
    pub async fn analyze_image(
        &self,
        prompt: &str,
        image_base64: &str,
        media_type: &str,
    ) -> Result<String, AiError> {
        let client = Arc::clone(&self.client);
        let retry = self.retry.clone();
        let prompt = prompt.to_string();
        let image = image_base64.to_string();
        let media = media_type.to_string();
        let result = self
            .submit(async move {
                with_retry(&retry, || {
                    let client = Arc::clone(&client);
                    let prompt = prompt.clone();
                    let image = image.clone();
                    let media = media.clone();
                    async move { client.analyze_image(&prompt, &image, &media).await }
                })
                .await
            })
            .await;
        Self::resolve_or_fallback(result, FallbackContext::ImageAnalysis)
    }

    /// Generate a remediation explanation for an incorrect answer.
    ///
    /// Never fails on availability: rate-limit exhaustion, empty output,
    /// and gateway shutdown all degrade to the deterministic fallback that
    /// references the learner's answer and the correct one. Other errors
    /// propagate.
    pub async fn explain_mistake(
        &self,
        question: &InteractiveQuestion,
        user_answer: &str,
    ) -> Result<String, AiError> {
        let prompt = format!(
            "A student answered a quiz question incorrectly.\n\
             Question: {}\n\
             Options: {}\n\
             Correct answer: {}\n\
             Student's answer: {}\n\n\
             In 2-3 encouraging sentences, explain why the correct answer is \
             right and where the student's choice goes wrong. \
             Address the student directly.",
            question.question,
            question.options.join(", "),
            question.correct_answer,
            user_answer
        );

        let client = Arc::clone(&self.client);
        let retry = self.retry.clone();
        let result = self
            .submit(async move {
                with_retry(&retry, || {
                    let client = Arc::clone(&client);
                    let prompt = prompt.clone();
                    async move { client.generate_text(&prompt).await }
                })
                .await
            })
            .await;

        match result {
            Ok(text) if !text.trim().is_empty() => Ok(text),
            Ok(_) => {
                warn!("AI explanation came back empty; using deterministic fallback");
                Ok(explanation_fallback(user_answer, &question.correct_answer))
            }
            Err(e) if e.is_rate_limited() => {
                info!("AI explanation unavailable ({e}); using deterministic fallback");
                Ok(explanation_fallback(user_answer, &question.correct_answer))
            }
            Err(e) => Err(e),
        }
    }

    /// Generate a timestamped quiz from lesson content.
    ///
    /// The model is asked for a JSON array; unparsable output and
    /// availability failures substitute the fixed 3-question placeholder
    /// set (timestamps 30, 120, 300). Other errors propagate.
    pub async fn generate_quiz(
        &self,
        lesson_content: &str,
        count: usize,
    ) -> Result<Vec<InteractiveQuestion>, AiError> {
        let prompt = format!(
            "Create {} multiple-choice quiz questions for the lesson below. \
             Spread the timestamps across the lesson's runtime.\n\
             Respond with ONLY a JSON array, no prose, where each element is \
             {{\"id\": string, \"timestamp\": number (seconds), \
             \"question\": string, \"options\": [string, ...], \
             \"correctAnswer\": string}} and correctAnswer is one of options.\n\n\
             Lesson content:\n{}",
            count, lesson_content
        );

        let client = Arc::clone(&self.client);
        let retry = self.retry.clone();
        let result = self
            .submit(async move {
                with_retry(&retry, || {
                    let client = Arc::clone(&client);
                    let prompt = prompt.clone();
                    async move { client.generate_text(&prompt).await }
                })
                .await
            })
            .await;

        let raw = match Self::resolve_or_fallback(result, FallbackContext::Question) {
            Ok(text) => text,
            Err(e) => return Err(e),
        };

        match types::parse_quiz(&raw) {
            Ok(quiz) => Ok(quiz),
            Err(e) => {
                warn!("Quiz output unparsable ({e}); substituting placeholder set");
                Ok(placeholder_quiz())
            }
        }
    }
}

impl Drop for AiGateway {
    fn drop(&mut self) {
        self.worker.abort();
    }
}
