/*!
 * Tracing
 * Structured tracing for runs and commands using the tracing crate
 *
 * Features:
 * - Run IDs for correlating every command of one job stream
 * - JSON-formatted logs for structured parsing
 * - Per-command spans with duration and outcome
 */

use std::time::{Duration, Instant};
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Environment variable switching log output to JSON
pub const ENV_TRACE_JSON: &str = "EMS_TRACE_JSON";

/// Commands slower than this are reported at warn level
const SLOW_COMMAND: Duration = Duration::from_millis(100);

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - EMS_TRACE_JSON: Enable JSON output (default: false)
///
/// Calling it twice is harmless; the second subscriber is discarded.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var(ENV_TRACE_JSON)
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_span_events(FmtSpan::NONE)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    };

    if installed.is_ok() {
        info!(json = use_json, "Structured tracing initialized");
    }
}

/// Generate a unique run ID for log correlation
pub fn generate_run_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span covering the execution of one command by one worker
pub struct CommandSpan {
    span: tracing::Span,
    start: Instant,
    command: &'static str,
    worker: u32,
}

impl CommandSpan {
    pub fn new(command: &'static str, worker: u32) -> Self {
        let span = span!(
            Level::DEBUG,
            "command",
            command = command,
            worker = worker,
            duration_us = tracing::field::Empty,
            result = tracing::field::Empty,
            error = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            command,
            worker,
        }
    }

    /// Enter the span context
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }

    pub fn record_success(&self) {
        self.span.record("result", "success");
    }

    pub fn record_error(&self, error: &str) {
        self.span.record("error", error);
        self.span.record("result", "error");
    }
}

impl Drop for CommandSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();
        self.span.record("duration_us", duration.as_micros() as u64);

        if duration > SLOW_COMMAND {
            warn!(
                command = self.command,
                worker = self.worker,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow command"
            );
        } else {
            debug!(
                command = self.command,
                worker = self.worker,
                duration_us = duration.as_micros() as u64,
                "command completed"
            );
        }
    }
}
