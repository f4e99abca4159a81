//! Structured logging setup for the `receipts` binary
//!
//! The library only emits `tracing` events; installing a subscriber is the
//! binary's job.
//!
//! # Environment Variables
//!
//! - `LOG_FORMAT`: `json` for JSON output, `text` for human-readable output.
//!   Overrides the `log_format` setting.
//! - `RUST_LOG`: standard filter (default: `info`), e.g.
//!   `RUST_LOG=receipts_ledger=debug`

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::LogFormat;

/// Resolve the output format: `LOG_FORMAT` wins over the configured one
pub fn resolve_format(configured: LogFormat) -> LogFormat {
    match std::env::var("LOG_FORMAT") {
        Ok(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
        Ok(value) if value.eq_ignore_ascii_case("text") => LogFormat::Text,
        _ => configured,
    }
}

/// Install the global subscriber; later calls are ignored
pub fn init_logging(configured: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match resolve_format(configured) {
        LogFormat::Json => init_json_logging(env_filter),
        LogFormat::Text => init_text_logging(env_filter),
    }
}

fn init_json_logging(env_filter: EnvFilter) {
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_span_list(true)
                .with_target(true)
                .flatten_event(true)
                .with_span_events(FmtSpan::CLOSE),
        )
        .try_init();
}

fn init_text_logging(env_filter: EnvFilter) {
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_ansi(false),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_format_is_default() {
        if std::env::var("LOG_FORMAT").is_err() {
            assert_eq!(resolve_format(LogFormat::Json), LogFormat::Json);
            assert_eq!(resolve_format(LogFormat::Text), LogFormat::Text);
        }
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init_logging(LogFormat::Text);
        init_logging(LogFormat::Json);
    }
}
