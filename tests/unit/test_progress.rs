//! Unit tests for XP, levels, streaks, and the leaderboard
//!
//! Exercised through the progress store so the arithmetic and persistence
//! stay in agreement.

use chrono::NaiveDate;
use tutorkit::store::InMemoryProgressStore;
use tutorkit::{ProgressStore, UserProfile};

fn profile(user_id: &str, display_name: &str) -> UserProfile {
    UserProfile {
        user_id: user_id.to_string(),
        display_name: display_name.to_string(),
        xp: 0,
        level: 1,
        streak_days: 0,
        last_active: None,
    }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
}

#[test]
fn test_level_advances_every_hundred_xp() {
    tokio_test::block_on(async {
        let store = InMemoryProgressStore::new();
        store.upsert_profile(profile("u1", "Alex")).await.unwrap();

        // Nine correct answers and a lesson completion: 9*10 + 50 = 140 XP.
        for _ in 0..9 {
            store.add_xp("u1", 10).await.unwrap();
        }
        let after = store.add_xp("u1", 50).await.unwrap();
        assert_eq!(after.xp, 140);
        assert_eq!(after.level, 2);
    });
}

#[tokio::test]
async fn test_streak_survives_daily_practice_but_not_gaps() {
    let store = InMemoryProgressStore::new();
    store.upsert_profile(profile("u1", "Alex")).await.unwrap();

    for (d, expected) in [(1, 1), (2, 2), (3, 3), (3, 3), (6, 1), (7, 2)] {
        let updated = store.add_xp_on("u1", 10, day(d)).await.unwrap();
        assert_eq!(
            updated.streak_days, expected,
            "unexpected streak after activity on day {d}"
        );
    }
}

#[tokio::test]
async fn test_leaderboard_tracks_awards_across_users() {
    let store = InMemoryProgressStore::new();
    store.upsert_profile(profile("u-anna", "Anna")).await.unwrap();
    store.upsert_profile(profile("u-ben", "Ben")).await.unwrap();
    store.upsert_profile(profile("u-cleo", "Cleo")).await.unwrap();

    store.add_xp("u-anna", 30).await.unwrap();
    store.add_xp("u-ben", 120).await.unwrap();
    store.add_xp("u-cleo", 30).await.unwrap();

    let board = store.leaderboard(10).await.unwrap();
    let ids: Vec<&str> = board.iter().map(|e| e.user_id.as_str()).collect();
    // Ties resolve by user id so the ordering is stable across calls.
    assert_eq!(ids, vec!["u-ben", "u-anna", "u-cleo"]);
    assert_eq!(board[0].level, 2);
}

#[tokio::test]
async fn test_xp_deduction_floors_at_zero() {
    let store = InMemoryProgressStore::new();
    store.upsert_profile(profile("u1", "Alex")).await.unwrap();

    store.add_xp("u1", 30).await.unwrap();
    let updated = store.add_xp("u1", -100).await.unwrap();
    assert_eq!(updated.xp, 0);
    assert_eq!(updated.level, 1);
}

#[tokio::test]
async fn test_leaderboard_limit_zero_is_empty() {
    let store = InMemoryProgressStore::new();
    store.upsert_profile(profile("u1", "Alex")).await.unwrap();
    assert!(store.leaderboard(0).await.unwrap().is_empty());
}
