//! Unit tests for the AI request gateway
//!
//! Tests cover:
//! - FIFO draining with configurable spacing
//! - Rate-limit retry exhaustion and offline fallbacks
//! - Quiz generation end to end through the public API

use crate::support::{rate_limited, ScriptedClient};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tutorkit::{AiError, AiGateway, GatewayConfig};

fn gateway_with(
    outcomes: Vec<Result<String, AiError>>,
    config: &GatewayConfig,
) -> (AiGateway, Arc<ScriptedClient>) {
    let client = Arc::new(ScriptedClient::with_outcomes(outcomes));
    (AiGateway::new(client.clone(), config), client)
}

#[tokio::test(start_paused = true)]
async fn test_custom_spacing_is_honored() {
    let config = GatewayConfig {
        queue_delay_ms: 250,
        ..GatewayConfig::default()
    };
    let (gateway, _) = gateway_with(
        vec![Ok("one".to_string()), Ok("two".to_string())],
        &config,
    );
    let gateway = Arc::new(gateway);
    let started = Instant::now();

    let g1 = Arc::clone(&gateway);
    let g2 = Arc::clone(&gateway);
    let h1 = tokio::spawn(async move { g1.generate_text("a").await });
    let h2 = tokio::spawn(async move { (g2.generate_text("b").await, Instant::now()) });

    assert_eq!(h1.await.unwrap().unwrap(), "one");
    let (r2, t2) = h2.await.unwrap();
    assert_eq!(r2.unwrap(), "two");
    assert!(
        t2.duration_since(started) >= Duration::from_millis(250),
        "second unit ran before the spacing elapsed"
    );
}

#[tokio::test(start_paused = true)]
async fn test_single_attempt_config_never_retries() {
    let config = GatewayConfig {
        max_attempts: 1,
        ..GatewayConfig::default()
    };
    let (gateway, client) = gateway_with(vec![Err(rate_limited())], &config);

    // One attempt, then the offline fallback resolves the call.
    let text = gateway.generate_text("hello").await.unwrap();
    assert!(!text.is_empty());
    assert_eq!(client.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_zero_attempt_config_is_clamped_to_one() {
    let config = GatewayConfig {
        max_attempts: 0,
        ..GatewayConfig::default()
    };
    let (gateway, client) = gateway_with(vec![Ok("ran".to_string())], &config);

    assert_eq!(gateway.generate_text("hello").await.unwrap(), "ran");
    assert_eq!(client.call_count(), 1, "work must still run at least once");
}

#[tokio::test(start_paused = true)]
async fn test_mixed_workload_drains_in_submission_order() {
    let quiz_json = r#"[{"id": "g1", "timestamp": 15, "question": "Q?",
                         "options": ["x", "y"], "correctAnswer": "y"}]"#;
    let (gateway, _) = gateway_with(
        vec![
            Ok("chat reply".to_string()),
            Ok(quiz_json.to_string()),
            Ok("image description".to_string()),
        ],
        &GatewayConfig::default(),
    );
    let gateway = Arc::new(gateway);

    let g1 = Arc::clone(&gateway);
    let g2 = Arc::clone(&gateway);
    let g3 = Arc::clone(&gateway);
    let chat = tokio::spawn(async move { g1.generate_text("hi").await });
    let quiz = tokio::spawn(async move { g2.generate_quiz("lesson", 1).await });
    let image = tokio::spawn(async move { g3.analyze_image("what", "YWJj", "image/png").await });

    assert_eq!(chat.await.unwrap().unwrap(), "chat reply");
    let quiz = quiz.await.unwrap().unwrap();
    assert_eq!(quiz.len(), 1);
    assert_eq!(quiz[0].id, "g1");
    assert_eq!(image.await.unwrap().unwrap(), "image description");
}

#[tokio::test(start_paused = true)]
async fn test_retry_succeeds_mid_policy() {
    let (gateway, client) = gateway_with(
        vec![Err(rate_limited()), Ok("recovered".to_string())],
        &GatewayConfig::default(),
    );

    let started = Instant::now();
    assert_eq!(gateway.generate_text("hello").await.unwrap(), "recovered");
    assert_eq!(client.call_count(), 2);
    assert!(started.elapsed() >= Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn test_quiz_items_fill_missing_ids_positionally() {
    let raw = r#"[
        {"timestamp": 20, "question": "First?", "options": ["a", "b"], "correctAnswer": "a"},
        {"timestamp": 40, "question": "Second?", "options": ["c", "d"], "correctAnswer": "d"}
    ]"#;
    let (gateway, _) = gateway_with(vec![Ok(raw.to_string())], &GatewayConfig::default());

    let quiz = gateway.generate_quiz("lesson", 2).await.unwrap();
    assert_eq!(quiz[0].id, "q1");
    assert_eq!(quiz[1].id, "q2");
}
