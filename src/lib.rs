//! Tutorkit - Interactive Lesson Engine
//!
//! The coordination core of a video-lesson tutoring app: timestamped
//! in-video questions that pause playback, an AI gateway that keeps the
//! tutor responsive under rate limits, and the progress rules (XP, levels,
//! streaks) that make practice stick.
//!
//! - **Scheduler**: triggers questions near their timestamps, at most one
//!   open at a time, answered questions never re-trigger
//! - **Gateway**: single FIFO queue with fixed spacing, exponential backoff
//!   on rate limits, canned offline fallbacks instead of hard failures
//! - **Stores**: trait seams for lessons, mistake records, and progress,
//!   with in-memory reference implementations
//! - **Session**: the per-user flow wiring all of the above together
//!
//! # Quick Start
//!
//! ```ignore
//! use tutorkit::{Config, AiGateway, HttpModelClient, LessonSession};
//! use std::sync::Arc;
//!
//! let config = Config::load(None)?;
//! let client = Arc::new(HttpModelClient::new(&config)?);
//! let gateway = Arc::new(AiGateway::new(client, &config.gateway));
//! let session = LessonSession::start(
//!     user_id, lesson, gateway, mistakes, progress, &config.scheduler,
//! )?;
//! ```

// ─── Core modules ──────────────────────────────────────────────────
pub mod config;
pub mod errors;
pub mod model;
pub mod telemetry;

// ─── Playback & AI coordination ────────────────────────────────────
pub mod gateway;
pub mod scheduler;
pub mod session;

// ─── Persistence & progress ────────────────────────────────────────
pub mod progress;
pub mod store;

pub use config::{Config, GatewayConfig, SchedulerConfig};
pub use errors::{AiError, LessonError, Result, SchedulerError, StoreError, TutorError};
pub use gateway::{AiGateway, HttpModelClient, ModelClient};
pub use model::{
    InteractiveQuestion, LeaderboardEntry, Lesson, LessonDraft, MistakeRecord, UserProfile,
};
pub use scheduler::{PlaybackSurface, QuestionScheduler, SchedulerTicker};
pub use session::{AnswerFeedback, LessonSession};
pub use store::{LessonStore, MistakeStore, ProgressStore};
