//! Unit tests for the lesson and mistake stores through their trait
//! objects, the way the embedding application consumes them.

use crate::support::question;
use chrono::Utc;
use std::sync::Arc;
use tutorkit::store::{InMemoryLessonStore, InMemoryMistakeStore};
use tutorkit::{LessonDraft, LessonStore, MistakeRecord, MistakeStore, StoreError};

fn draft(title: &str) -> LessonDraft {
    LessonDraft {
        title: title.to_string(),
        content: "Content".to_string(),
        subject: "Science".to_string(),
        grade_level: "6".to_string(),
        cover_image_url: None,
        video_link: None,
        attachments: vec![],
        interactive_questions: vec![question("q1", 12.0)],
    }
}

#[tokio::test]
async fn test_lesson_crud_through_trait_object() {
    let store: Arc<dyn LessonStore> = Arc::new(InMemoryLessonStore::default());

    let a = store.create(draft("Cells")).await.unwrap();
    let b = store.create(draft("Photosynthesis")).await.unwrap();
    assert_ne!(a.id, b.id);

    let all = store.get_all().await.unwrap();
    assert_eq!(all.len(), 2);

    store.delete(&a.id).await.unwrap();
    assert!(matches!(
        store.get_by_id(&a.id).await.unwrap_err(),
        StoreError::NotFound { .. }
    ));
    assert_eq!(store.get_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_rejects_broken_question_list() {
    let store = InMemoryLessonStore::default();
    let lesson = store.create(draft("Cells")).await.unwrap();

    let mut bad = draft("Cells v2");
    bad.interactive_questions = vec![question("dup", 5.0), question("dup", 9.0)];
    assert!(store.update(&lesson.id, bad).await.is_err());

    // Failed update leaves the stored lesson untouched.
    assert_eq!(store.get_by_id(&lesson.id).await.unwrap().title, "Cells");
}

#[tokio::test]
async fn test_upload_rejects_empty_path() {
    let store = InMemoryLessonStore::new("https://cdn.example.com");
    assert!(store.upload_file("  ", vec![1]).await.is_err());
}

#[tokio::test]
async fn test_mistakes_are_append_only_per_user_and_lesson() {
    let store: Arc<dyn MistakeStore> = Arc::new(InMemoryMistakeStore::new());
    for (user, lesson) in [("u1", "l1"), ("u1", "l1"), ("u1", "l2"), ("u2", "l1")] {
        store
            .insert(MistakeRecord {
                user_id: user.to_string(),
                lesson_id: lesson.to_string(),
                question: question("q1", 12.0),
                user_answer: "A".to_string(),
                correct_answer: "B".to_string(),
                ai_explanation: "Because.".to_string(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    assert_eq!(
        store.query_by_lesson_and_user("l1", "u1").await.unwrap().len(),
        2
    );
    assert_eq!(
        store.query_by_lesson_and_user("l2", "u1").await.unwrap().len(),
        1
    );
    assert!(store
        .query_by_lesson_and_user("l3", "u1")
        .await
        .unwrap()
        .is_empty());
}
