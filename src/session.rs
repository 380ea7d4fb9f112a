//! Lesson session
//!
//! One `LessonSession` per user viewing one lesson. It wires the question
//! scheduler, AI gateway, and stores together behind the flow the UI
//! drives:
//! - ticker trigger → overlay opens, playback paused
//! - correct answer → XP award, playback resumes
//! - incorrect answer → AI explanation (degraded copy if the AI is down),
//!   mistake recorded, overlay stays open until dismissed
//! - lesson completion → completion XP, ticker torn down
//!
//! AI unavailability never fails the answer flow; store failures do
//! propagate, since silently dropping a mistake record or an XP award
//! would corrupt progress.

use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::SchedulerConfig;
use crate::errors::Result;
use crate::gateway::{explanation_fallback, AiGateway};
use crate::model::{InteractiveQuestion, Lesson, MistakeRecord, UserProfile};
use crate::progress::{XP_PER_CORRECT_ANSWER, XP_PER_LESSON_COMPLETED};
use crate::scheduler::{
    AnswerOutcome, PlaybackSurface, QuestionScheduler, SchedulerTicker,
};
use crate::store::{MistakeStore, ProgressStore};

/// What the UI renders after an answer submission.
#[derive(Debug)]
pub enum AnswerFeedback {
    /// Overlay closes, playback resumes.
    Correct { xp_awarded: i64, profile: UserProfile },
    /// Overlay switches to the explanation; playback stays paused until
    /// `dismiss_explanation`.
    Incorrect { explanation: String },
}

pub struct LessonSession {
    user_id: String,
    lesson: Lesson,
    scheduler: Arc<Mutex<QuestionScheduler>>,
    gateway: Arc<AiGateway>,
    mistakes: Arc<dyn MistakeStore>,
    progress: Arc<dyn ProgressStore>,
    poll_interval: std::time::Duration,
    surface: Option<Arc<dyn PlaybackSurface>>,
    ticker: Option<SchedulerTicker>,
}

impl LessonSession {
    /// Validate the lesson and set up per-session state. No timer runs
    /// until `begin_playback`.
    pub fn start(
        user_id: impl Into<String>,
        lesson: Lesson,
        gateway: Arc<AiGateway>,
        mistakes: Arc<dyn MistakeStore>,
        progress: Arc<dyn ProgressStore>,
        config: &SchedulerConfig,
    ) -> Result<Self> {
        let scheduler =
            QuestionScheduler::new(lesson.interactive_questions.clone(), config)?;
        let user_id = user_id.into();
        info!(user_id = %user_id, lesson_id = %lesson.id, "Lesson session started");
        Ok(Self {
            user_id,
            lesson,
            scheduler: Arc::new(Mutex::new(scheduler)),
            gateway,
            mistakes,
            progress,
            poll_interval: config.poll_interval(),
            surface: None,
            ticker: None,
        })
    }

    /// Attach the player and start the trigger ticker. Returns the channel
    /// on which triggered questions arrive. Replaces any previous ticker.
    pub fn begin_playback(
        &mut self,
        surface: Arc<dyn PlaybackSurface>,
    ) -> mpsc::UnboundedReceiver<InteractiveQuestion> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.ticker = Some(SchedulerTicker::spawn(
            Arc::clone(&self.scheduler),
            Arc::clone(&surface),
            tx,
            self.poll_interval,
        ));
        self.surface = Some(surface);
        rx
    }

    /// Feed one playback position sample directly, for hosts that drive
    /// their own polling loop instead of using `begin_playback`.
    pub fn sample(&self, position_secs: f64) -> Option<InteractiveQuestion> {
        self.scheduler.lock().sample(position_secs).cloned()
    }

    /// Force-open the question at `index` regardless of playback position.
    pub fn jump_to(&self, index: usize) -> Result<InteractiveQuestion> {
        let question = self.scheduler.lock().jump_to(index)?.clone();
        Ok(question)
    }

    /// Submit the learner's answer for the active question.
    pub async fn answer(&self, selected: &str) -> Result<AnswerFeedback> {
        let outcome = self.scheduler.lock().submit_answer(selected)?;
        match outcome {
            AnswerOutcome::Correct { question_id } => {
                let profile = self
                    .progress
                    .add_xp(&self.user_id, XP_PER_CORRECT_ANSWER)
                    .await?;
                info!(
                    user_id = %self.user_id,
                    question_id = %question_id,
                    xp = profile.xp,
                    "Correct answer"
                );
                if let Some(surface) = &self.surface {
                    surface.resume().await;
                }
                Ok(AnswerFeedback::Correct {
                    xp_awarded: XP_PER_CORRECT_ANSWER,
                    profile,
                })
            }
            AnswerOutcome::Incorrect { snapshot } => {
                // The answer flow survives any AI failure; the learner
                // always gets an explanation, canned if necessary.
                let explanation = match self
                    .gateway
                    .explain_mistake(&snapshot.question, &snapshot.user_answer)
                    .await
                {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("Explanation request failed ({e}); using fallback copy");
                        explanation_fallback(&snapshot.user_answer, &snapshot.correct_answer)
                    }
                };

                self.mistakes
                    .insert(MistakeRecord {
                        user_id: self.user_id.clone(),
                        lesson_id: self.lesson.id.clone(),
                        question: snapshot.question,
                        user_answer: snapshot.user_answer,
                        correct_answer: snapshot.correct_answer,
                        ai_explanation: explanation.clone(),
                        created_at: Utc::now(),
                    })
                    .await?;

                Ok(AnswerFeedback::Incorrect { explanation })
            }
        }
    }

    /// Close the explanation overlay and resume playback. The question
    /// stays unanswered.
    pub async fn dismiss_explanation(&self) -> Result<()> {
        self.scheduler.lock().dismiss_explanation()?;
        if let Some(surface) = &self.surface {
            surface.resume().await;
        }
        Ok(())
    }

    /// Award the completion bonus and tear the ticker down.
    pub async fn complete(&mut self) -> Result<UserProfile> {
        if let Some(ticker) = &mut self.ticker {
            ticker.stop();
        }
        let profile = self
            .progress
            .add_xp(&self.user_id, XP_PER_LESSON_COMPLETED)
            .await?;
        info!(
            user_id = %self.user_id,
            lesson_id = %self.lesson.id,
            xp = profile.xp,
            "Lesson completed"
        );
        Ok(profile)
    }

    /// This user's past mistakes for the current lesson, newest first.
    pub async fn review_mistakes(&self) -> Result<Vec<MistakeRecord>> {
        Ok(self
            .mistakes
            .query_by_lesson_and_user(&self.lesson.id, &self.user_id)
            .await?)
    }

    pub fn lesson(&self) -> &Lesson {
        &self.lesson
    }

    pub fn active_question(&self) -> Option<InteractiveQuestion> {
        self.scheduler.lock().active_question().cloned()
    }

    pub fn is_playing(&self) -> bool {
        self.scheduler.lock().is_playing()
    }

    pub fn ticker_running(&self) -> bool {
        self.ticker.as_ref().is_some_and(|t| t.is_running())
    }
}
