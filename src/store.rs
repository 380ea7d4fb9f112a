//! Store contracts
//!
//! Async trait seams for the three persistence concerns this crate
//! consumes, plus in-memory implementations used in tests and for running
//! without a backing service:
//! - `LessonStore`: lesson CRUD and attachment upload
//! - `MistakeStore`: append-only incorrect-answer records
//! - `ProgressStore`: XP, levels, streaks, leaderboard
//!
//! The in-memory stores are the reference semantics a real backend must
//! match: validation on write, `NotFound` on missing ids, newest-first
//! mistake queries, deterministic leaderboard ordering.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::StoreError;
use crate::model::{
    normalize_video_link, validate_questions, FileRef, LeaderboardEntry, Lesson, LessonDraft,
    MistakeRecord, UserProfile,
};
use crate::progress::{apply_xp_delta, level_for_xp, rank_leaderboard, record_activity};

type StoreResult<T> = Result<T, StoreError>;

// ============================================================================
// Contracts
// ============================================================================

#[async_trait]
pub trait LessonStore: Send + Sync {
    /// All lessons, newest first.
    async fn get_all(&self) -> StoreResult<Vec<Lesson>>;

    async fn get_by_id(&self, id: &str) -> StoreResult<Lesson>;

    /// Validate and persist a new lesson; the store assigns id and
    /// timestamps.
    async fn create(&self, draft: LessonDraft) -> StoreResult<Lesson>;

    /// Replace a lesson's content; `created_at` is preserved, `updated_at`
    /// refreshed.
    async fn update(&self, id: &str, draft: LessonDraft) -> StoreResult<Lesson>;

    async fn delete(&self, id: &str) -> StoreResult<()>;

    /// Store an attachment and return its reference with a public URL.
    async fn upload_file(&self, path: &str, bytes: Vec<u8>) -> StoreResult<FileRef>;

    async fn delete_file(&self, path: &str) -> StoreResult<()>;
}

#[async_trait]
pub trait MistakeStore: Send + Sync {
    /// Append one record. Records are never mutated afterwards.
    async fn insert(&self, record: MistakeRecord) -> StoreResult<()>;

    /// A user's mistakes for one lesson, newest first.
    async fn query_by_lesson_and_user(
        &self,
        lesson_id: &str,
        user_id: &str,
    ) -> StoreResult<Vec<MistakeRecord>>;
}

#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn get_user(&self, user_id: &str) -> StoreResult<UserProfile>;

    /// Create or replace a profile wholesale.
    async fn upsert_profile(&self, profile: UserProfile) -> StoreResult<()>;

    /// Apply a signed XP delta (floored at zero), recompute the level, and
    /// record today's activity for streak accounting. Returns the updated
    /// profile.
    async fn add_xp(&self, user_id: &str, delta: i64) -> StoreResult<UserProfile>;

    /// Top `limit` users by XP (ties broken by user id).
    async fn leaderboard(&self, limit: usize) -> StoreResult<Vec<LeaderboardEntry>>;
}

// ============================================================================
// In-memory lesson store
// ============================================================================

pub struct InMemoryLessonStore {
    lessons: RwLock<HashMap<String, Lesson>>,
    files: RwLock<HashMap<String, Vec<u8>>>,
    public_base_url: String,
}

impl InMemoryLessonStore {
    pub fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            lessons: RwLock::new(HashMap::new()),
            files: RwLock::new(HashMap::new()),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Default for InMemoryLessonStore {
    fn default() -> Self {
        Self::new("memory://files")
    }
}

#[async_trait]
impl LessonStore for InMemoryLessonStore {
    async fn get_all(&self) -> StoreResult<Vec<Lesson>> {
        let lessons = self.lessons.read().await;
        let mut all: Vec<Lesson> = lessons.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Lesson> {
        self.lessons
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("lesson", id))
    }

    async fn create(&self, draft: LessonDraft) -> StoreResult<Lesson> {
        validate_questions(&draft.interactive_questions)
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        let now = Utc::now();
        let lesson = Lesson {
            id: Uuid::new_v4().to_string(),
            title: draft.title,
            content: draft.content,
            subject: draft.subject,
            grade_level: draft.grade_level,
            cover_image_url: draft.cover_image_url,
            video_link: draft.video_link.as_deref().and_then(normalize_video_link),
            attachments: draft.attachments,
            interactive_questions: draft.interactive_questions,
            created_at: now,
            updated_at: now,
        };
        info!(lesson_id = %lesson.id, title = %lesson.title, "Lesson created");
        self.lessons
            .write()
            .await
            .insert(lesson.id.clone(), lesson.clone());
        Ok(lesson)
    }

    async fn update(&self, id: &str, draft: LessonDraft) -> StoreResult<Lesson> {
        validate_questions(&draft.interactive_questions)
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        let mut lessons = self.lessons.write().await;
        let existing = lessons
            .get(id)
            .ok_or_else(|| StoreError::not_found("lesson", id))?;

        let updated = Lesson {
            id: existing.id.clone(),
            title: draft.title,
            content: draft.content,
            subject: draft.subject,
            grade_level: draft.grade_level,
            cover_image_url: draft.cover_image_url,
            video_link: draft.video_link.as_deref().and_then(normalize_video_link),
            attachments: draft.attachments,
            interactive_questions: draft.interactive_questions,
            created_at: existing.created_at,
            updated_at: Utc::now(),
        };
        lessons.insert(id.to_string(), updated.clone());
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.lessons
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("lesson", id))
    }

    async fn upload_file(&self, path: &str, bytes: Vec<u8>) -> StoreResult<FileRef> {
        if path.trim().is_empty() {
            return Err(StoreError::Storage("empty file path".to_string()));
        }
        debug!(path, size = bytes.len(), "Storing attachment");
        self.files.write().await.insert(path.to_string(), bytes);
        Ok(FileRef {
            path: path.to_string(),
            public_url: format!("{}/{}", self.public_base_url, path.trim_start_matches('/')),
        })
    }

    async fn delete_file(&self, path: &str) -> StoreResult<()> {
        self.files
            .write()
            .await
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("file", path))
    }
}

// ============================================================================
// In-memory mistake store
// ============================================================================

#[derive(Default)]
pub struct InMemoryMistakeStore {
    records: RwLock<Vec<MistakeRecord>>,
}

impl InMemoryMistakeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MistakeStore for InMemoryMistakeStore {
    async fn insert(&self, record: MistakeRecord) -> StoreResult<()> {
        debug!(
            user_id = %record.user_id,
            lesson_id = %record.lesson_id,
            question_id = %record.question.id,
            "Mistake recorded"
        );
        self.records.write().await.push(record);
        Ok(())
    }

    async fn query_by_lesson_and_user(
        &self,
        lesson_id: &str,
        user_id: &str,
    ) -> StoreResult<Vec<MistakeRecord>> {
        let records = self.records.read().await;
        let mut found: Vec<MistakeRecord> = records
            .iter()
            .filter(|r| r.lesson_id == lesson_id && r.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }
}

// ============================================================================
// In-memory progress store
// ============================================================================

#[derive(Default)]
pub struct InMemoryProgressStore {
    profiles: RwLock<HashMap<String, UserProfile>>,
}

impl InMemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an XP delta attributing the activity to an explicit day. The
    /// trait method delegates here with the current UTC day; tests drive
    /// streak scenarios directly.
    pub async fn add_xp_on(
        &self,
        user_id: &str,
        delta: i64,
        day: chrono::NaiveDate,
    ) -> StoreResult<UserProfile> {
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .get_mut(user_id)
            .ok_or_else(|| StoreError::not_found("user", user_id))?;

        profile.xp = apply_xp_delta(profile.xp, delta);
        profile.level = level_for_xp(profile.xp);
        record_activity(profile, day);
        info!(
            user_id,
            delta,
            xp = profile.xp,
            level = profile.level,
            streak = profile.streak_days,
            "XP updated"
        );
        Ok(profile.clone())
    }
}

#[async_trait]
impl ProgressStore for InMemoryProgressStore {
    async fn get_user(&self, user_id: &str) -> StoreResult<UserProfile> {
        self.profiles
            .read()
            .await
            .get(user_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("user", user_id))
    }

    async fn upsert_profile(&self, profile: UserProfile) -> StoreResult<()> {
        self.profiles
            .write()
            .await
            .insert(profile.user_id.clone(), profile);
        Ok(())
    }

    async fn add_xp(&self, user_id: &str, delta: i64) -> StoreResult<UserProfile> {
        self.add_xp_on(user_id, delta, Utc::now().date_naive())
            .await
    }

    async fn leaderboard(&self, limit: usize) -> StoreResult<Vec<LeaderboardEntry>> {
        let profiles = self.profiles.read().await;
        let mut entries: Vec<LeaderboardEntry> = profiles
            .values()
            .map(|p| LeaderboardEntry {
                user_id: p.user_id.clone(),
                display_name: p.display_name.clone(),
                xp: p.xp,
                level: p.level,
            })
            .collect();
        rank_leaderboard(&mut entries);
        entries.truncate(limit);
        Ok(entries)
    }
}
