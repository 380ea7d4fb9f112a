//! Gamification rules
//!
//! Pure XP, level, streak, and leaderboard-ordering arithmetic. The
//! progress store applies these; nothing here does I/O.
//!
//! Rules:
//! - 10 XP per correctly answered interactive question
//! - 50 XP per completed lesson
//! - level = xp / 100 + 1 (every 100 XP advances one level, floor at 1)
//! - streak counts consecutive UTC days with at least one activity

use chrono::NaiveDate;

use crate::model::{LeaderboardEntry, UserProfile};

pub const XP_PER_CORRECT_ANSWER: i64 = 10;
pub const XP_PER_LESSON_COMPLETED: i64 = 50;
pub const XP_PER_LEVEL: u64 = 100;

/// Level derived from lifetime XP. 0 XP is level 1.
pub fn level_for_xp(xp: u64) -> u32 {
    (xp / XP_PER_LEVEL + 1).min(u64::from(u32::MAX)) as u32
}

/// Apply a signed XP delta. Balances never go below zero; a deduction
/// larger than the balance floors at 0.
pub fn apply_xp_delta(xp: u64, delta: i64) -> u64 {
    if delta >= 0 {
        xp.saturating_add(delta as u64)
    } else {
        xp.saturating_sub(delta.unsigned_abs())
    }
}

/// Fold one activity on `today` into the profile's streak.
///
/// Same-day repeat activity leaves the streak unchanged; the day after the
/// last active day extends it; any gap (or activity recorded out of order)
/// resets it to 1.
pub fn record_activity(profile: &mut UserProfile, today: NaiveDate) {
    profile.streak_days = match profile.last_active {
        Some(last) if last == today => profile.streak_days,
        Some(last) if last.succ_opt() == Some(today) => profile.streak_days + 1,
        _ => 1,
    };
    profile.last_active = Some(today);
}

/// Order leaderboard entries: XP descending, ties broken by user id
/// ascending so the ordering is deterministic.
pub fn rank_leaderboard(entries: &mut [LeaderboardEntry]) {
    entries.sort_by(|a, b| b.xp.cmp(&a.xp).then_with(|| a.user_id.cmp(&b.user_id)));
}
