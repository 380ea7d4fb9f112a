//! Domain model
//!
//! Serde-backed entities shared across the scheduler, gateway, stores, and
//! session layers:
//! - `Lesson` and its embedded `InteractiveQuestion` list
//! - `MistakeRecord` snapshots written once per incorrect answer
//! - `UserProfile` / `LeaderboardEntry` for XP, levels, and streaks
//!
//! Lessons are read-only from this crate's perspective; validation here is
//! what lets the scheduler assume its invariants hold for a whole session.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

use crate::errors::LessonError;

/// A quiz prompt bound to a video timestamp. Playback pauses when it
/// triggers and resumes only after the learner answers (or dismisses the
/// explanation for a wrong answer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractiveQuestion {
    pub id: String,
    /// Seconds from the start of the video; non-negative.
    pub timestamp_secs: f64,
    pub question: String,
    /// Ordered answer options; at least 2.
    pub options: Vec<String>,
    /// Must equal one of `options`.
    pub correct_answer: String,
}

impl InteractiveQuestion {
    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer == answer
    }
}

/// Reference to an uploaded attachment (object storage is external).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRef {
    pub path: String,
    pub public_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub title: String,
    pub content: String,
    pub subject: String,
    pub grade_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_link: Option<String>,
    #[serde(default)]
    pub attachments: Vec<FileRef>,
    #[serde(default)]
    pub interactive_questions: Vec<InteractiveQuestion>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for `LessonStore::create` / `update`; ids and timestamps are
/// assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonDraft {
    pub title: String,
    pub content: String,
    pub subject: String,
    pub grade_level: String,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub video_link: Option<String>,
    #[serde(default)]
    pub attachments: Vec<FileRef>,
    #[serde(default)]
    pub interactive_questions: Vec<InteractiveQuestion>,
}

/// Append-only record of an incorrect answer, with the question snapshot
/// and the explanation the learner saw. Never mutated after insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MistakeRecord {
    pub user_id: String,
    pub lesson_id: String,
    pub question: InteractiveQuestion,
    pub user_answer: String,
    pub correct_answer: String,
    pub ai_explanation: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub display_name: String,
    pub xp: u64,
    pub level: u32,
    pub streak_days: u32,
    /// UTC day of the most recent activity; drives streak accounting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_active: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub display_name: String,
    pub xp: u64,
    pub level: u32,
}

/// Validate a lesson's question list.
///
/// Checks, in order per question: timestamp sign, option count, membership
/// of the correct answer, id uniqueness. The first violation is returned.
pub fn validate_questions(questions: &[InteractiveQuestion]) -> Result<(), LessonError> {
    let mut seen = HashSet::new();
    for q in questions {
        if q.timestamp_secs < 0.0 {
            return Err(LessonError::NegativeTimestamp {
                id: q.id.clone(),
                timestamp: q.timestamp_secs,
            });
        }
        if q.options.len() < 2 {
            return Err(LessonError::TooFewOptions {
                id: q.id.clone(),
                count: q.options.len(),
            });
        }
        if !q.options.contains(&q.correct_answer) {
            return Err(LessonError::CorrectAnswerNotInOptions { id: q.id.clone() });
        }
        if !seen.insert(q.id.clone()) {
            return Err(LessonError::DuplicateQuestionId { id: q.id.clone() });
        }
    }
    Ok(())
}

/// Normalize a lesson's video link.
///
/// Malformed links are recovered as "no video" with a warning; they are
/// never surfaced as a failure to the caller.
pub fn normalize_video_link(link: &str) -> Option<String> {
    let trimmed = link.trim();
    if trimmed.is_empty() {
        return None;
    }
    match url::Url::parse(trimmed) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
            Some(parsed.to_string())
        }
        Ok(parsed) => {
            warn!(scheme = parsed.scheme(), "Rejecting non-http video link");
            None
        }
        Err(e) => {
            warn!("Malformed video link dropped: {}", e);
            None
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_question(id: &str, timestamp_secs: f64) -> InteractiveQuestion {
    InteractiveQuestion {
        id: id.to_string(),
        timestamp_secs,
        question: format!("Question {id}?"),
        options: vec!["A".to_string(), "B".to_string(), "C".to_string()],
        correct_answer: "B".to_string(),
    }
}
