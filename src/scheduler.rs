//! Question Scheduler
//!
//! Decides when an interactive question interrupts lesson playback and
//! coordinates the overlay with the player:
//! - `QuestionScheduler` is the pure state machine: position samples in,
//!   triggers and answer outcomes out. Tests drive it with simulated
//!   position sweeps, no timers involved.
//! - `SchedulerTicker` is the periodic driver: it polls a `PlaybackSurface`
//!   at a fixed cadence, pauses playback on trigger, and forwards the due
//!   question over a channel. The ticker task is aborted on `stop()` and on
//!   `Drop`, so no orphaned timer survives the lesson view.
//!
//! At most one question is active at any time. A question that was answered
//! correctly never re-triggers in the same session, including after seeking
//! backward past its timestamp. When two questions fall within tolerance of
//! one sample, the first in list order wins; the other may trigger on a
//! later sample once the overlay closes.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::SchedulerConfig;
use crate::errors::{LessonError, SchedulerError};
use crate::model::{validate_questions, InteractiveQuestion};

/// Overlay sub-state while a question is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the learner to pick an option.
    Asking,
    /// Wrong answer given; explanation shown until dismissed.
    Explaining,
}

/// Snapshot of an incorrect submission, carried to the mistake store.
#[derive(Debug, Clone, PartialEq)]
pub struct MistakeSnapshot {
    pub question: InteractiveQuestion,
    pub user_answer: String,
    pub correct_answer: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnswerOutcome {
    /// Overlay closed, playback resumed, XP award due.
    Correct { question_id: String },
    /// Overlay stays open in `Phase::Explaining`; the caller fetches an
    /// explanation and later calls `dismiss_explanation`.
    Incorrect { snapshot: MistakeSnapshot },
}

/// Per-session trigger and answer-gating state machine.
pub struct QuestionScheduler {
    questions: Vec<InteractiveQuestion>,
    answered: HashSet<String>,
    active: Option<(usize, Phase)>,
    playing: bool,
    tolerance_secs: f64,
}

impl QuestionScheduler {
    /// Build a scheduler for one lesson-viewing session. The question list
    /// is validated up front so trigger and answer paths can rely on the
    /// lesson invariants.
    pub fn new(
        questions: Vec<InteractiveQuestion>,
        config: &SchedulerConfig,
    ) -> Result<Self, LessonError> {
        validate_questions(&questions)?;
        Ok(Self {
            questions,
            answered: HashSet::new(),
            active: None,
            playing: true,
            tolerance_secs: config.tolerance_secs,
        })
    }

    /// Feed one playback position sample.
    ///
    /// Returns the newly triggered question, if any. On trigger the
    /// scheduler marks itself paused; the caller pauses the actual player.
    pub fn sample(&mut self, position_secs: f64) -> Option<&InteractiveQuestion> {
        if self.active.is_some() {
            return None;
        }
        let idx = self.questions.iter().position(|q| {
            (position_secs - q.timestamp_secs).abs() < self.tolerance_secs
                && !self.answered.contains(&q.id)
        })?;
        self.active = Some((idx, Phase::Asking));
        self.playing = false;
        debug!(
            question_id = %self.questions[idx].id,
            position_secs,
            "Interactive question triggered"
        );
        Some(&self.questions[idx])
    }

    /// Force-activate the question at `index`, ignoring timestamp
    /// proximity. Submission rules are identical to a timed trigger.
    pub fn jump_to(&mut self, index: usize) -> Result<&InteractiveQuestion, SchedulerError> {
        if self.active.is_some() {
            return Err(SchedulerError::QuestionOpen);
        }
        if index >= self.questions.len() {
            return Err(SchedulerError::IndexOutOfRange {
                index,
                len: self.questions.len(),
            });
        }
        self.active = Some((index, Phase::Asking));
        self.playing = false;
        Ok(&self.questions[index])
    }

    /// Submit the learner's selected option for the active question.
    ///
    /// Only accepted in `Phase::Asking`; while an explanation is open the
    /// overlay must be dismissed first.
    pub fn submit_answer(&mut self, selected: &str) -> Result<AnswerOutcome, SchedulerError> {
        let (idx, phase) = self.active.ok_or(SchedulerError::NoActiveQuestion)?;
        if phase == Phase::Explaining {
            return Err(SchedulerError::QuestionOpen);
        }

        let question = &self.questions[idx];
        if question.is_correct(selected) {
            let question_id = question.id.clone();
            self.answered.insert(question_id.clone());
            self.active = None;
            self.playing = true;
            info!(%question_id, "Question answered correctly");
            Ok(AnswerOutcome::Correct { question_id })
        } else {
            let snapshot = MistakeSnapshot {
                question: question.clone(),
                user_answer: selected.to_string(),
                correct_answer: question.correct_answer.clone(),
            };
            self.active = Some((idx, Phase::Explaining));
            info!(question_id = %question.id, "Question answered incorrectly");
            Ok(AnswerOutcome::Incorrect { snapshot })
        }
    }

    /// Close the explanation overlay after a wrong answer and resume
    /// playback. The question stays unanswered and may trigger again.
    pub fn dismiss_explanation(&mut self) -> Result<(), SchedulerError> {
        match self.active {
            Some((_, Phase::Explaining)) => {
                self.active = None;
                self.playing = true;
                Ok(())
            }
            _ => Err(SchedulerError::NoActiveQuestion),
        }
    }

    pub fn active_question(&self) -> Option<&InteractiveQuestion> {
        self.active.map(|(idx, _)| &self.questions[idx])
    }

    pub fn phase(&self) -> Option<Phase> {
        self.active.map(|(_, phase)| phase)
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn answered_ids(&self) -> &HashSet<String> {
        &self.answered
    }

    pub fn questions(&self) -> &[InteractiveQuestion] {
        &self.questions
    }
}

/// What the ticker needs from the embedding video player.
#[async_trait]
pub trait PlaybackSurface: Send + Sync {
    /// Current playback position, or `None` when the player isn't ready.
    async fn position_secs(&self) -> Option<f64>;
    /// Pause playback (called on question trigger).
    async fn pause(&self);
    /// Resume playback (called after a question resolves).
    async fn resume(&self);
}

/// Periodic driver sampling the playback surface.
///
/// Holds the only handle to its tokio task; `stop()` and `Drop` both abort
/// it, so tearing down the lesson view cannot leak a timer.
pub struct SchedulerTicker {
    task: Option<JoinHandle<()>>,
}

impl SchedulerTicker {
    /// Start sampling `surface` every `poll_interval`, forwarding triggered
    /// questions to `triggers`. A lesson without questions starts no timer
    /// at all.
    pub fn spawn(
        scheduler: Arc<Mutex<QuestionScheduler>>,
        surface: Arc<dyn PlaybackSurface>,
        triggers: mpsc::UnboundedSender<InteractiveQuestion>,
        poll_interval: Duration,
    ) -> Self {
        if scheduler.lock().questions().is_empty() {
            debug!("Lesson has no interactive questions; ticker not started");
            return Self { task: None };
        }

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let Some(position) = surface.position_secs().await else {
                    continue;
                };
                // Lock is never held across an await point.
                let triggered = scheduler.lock().sample(position).cloned();
                if let Some(question) = triggered {
                    surface.pause().await;
                    if triggers.send(question).is_err() {
                        // Session side went away; stop sampling.
                        break;
                    }
                }
            }
        });
        Self { task: Some(task) }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Tear the timer down. Idempotent.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for SchedulerTicker {
    fn drop(&mut self) {
        self.stop();
    }
}
