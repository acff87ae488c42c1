//! Observability setup: structured logging and metrics recording.
//!
//! The library only records metrics through the `metrics` facade. Without an
//! installed recorder every call is a no-op, so embedding applications
//! choose their own exporter.

use std::time::Duration;

use anyhow::Result;
use tracing_subscriber::prelude::*;

use crate::config::{LogFormat, LoggingConfig};

/// Initialize structured logging with tracing and configuration
///
/// `RUST_LOG` directives are honoured on top of the configured level for
/// this crate. Calling it twice fails because a global subscriber is
/// already set.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("docnorm={}", config.level).parse()?)
        .add_directive(format!("ocr_preprocessing={}", config.level).parse()?)
        .add_directive(format!("text_correction={}", config.level).parse()?);

    match config.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            )
            .try_init()?,
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true),
            )
            .try_init()?,
    }

    tracing::info!(
        log_level = %config.level,
        log_format = ?config.format,
        "Tracing initialized with structured logging"
    );
    Ok(())
}

/// Create a span for one document run
pub fn document_span(source: &str) -> tracing::Span {
    tracing::info_span!("document", source = source, component = "docnorm")
}

/// Create a span for one phase of a document run
pub fn phase_span(phase: &'static str) -> tracing::Span {
    tracing::info_span!("phase", phase = phase)
}

/// Record the wall time of one preprocessing stage
pub fn record_stage_metrics(stage: &'static str, duration: Duration) {
    metrics::histogram!("preprocessing_stage_duration_seconds", "stage" => stage)
        .record(duration.as_secs_f64());
}

/// Record how many changes one correction stage applied
pub fn record_correction_metrics(stage: &'static str, changes: usize) {
    metrics::counter!("text_correction_runs_total", "stage" => stage).increment(1);
    metrics::counter!("text_corrections_total", "stage" => stage).increment(changes as u64);
}

/// Record the outcome of a full document run
pub fn record_document_metrics(success: bool, duration: Duration, input_bytes: usize) {
    metrics::counter!("documents_processed_total", "result" => if success { "success" } else { "failure" })
        .increment(1);
    metrics::histogram!("document_duration_seconds").record(duration.as_secs_f64());
    metrics::histogram!("document_input_size_bytes").record(input_bytes as f64);
}
