//! Telemetry
//!
//! Structured logging setup for host applications embedding this crate.
//! Log levels come from `RUST_LOG`, falling back to a sensible default
//! that keeps tutorkit at `info` and dependencies at `warn`.

use std::sync::OnceLock;
use tracing::{info_span, Span};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: OnceLock<()> = OnceLock::new();

/// Install the global tracing subscriber. Safe to call more than once;
/// later calls are no-ops, as is calling it when the host already
/// installed its own subscriber.
pub fn init() {
    init_with_default("warn,tutorkit=info");
}

/// Install the subscriber with an explicit default filter, used when
/// `RUST_LOG` is unset.
pub fn init_with_default(default_filter: &str) {
    let default_filter = default_filter.to_string();
    INIT.get_or_init(move || {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter));
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init();
    });
}

/// Span covering one lesson-viewing session; all scheduler, gateway, and
/// store events inside it carry the user and lesson ids.
pub fn session_span(user_id: &str, lesson_id: &str) -> Span {
    info_span!("lesson_session", user_id, lesson_id)
}
