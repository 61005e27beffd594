/*!
 * Syscall Tracing
 * Structured tracing for system calls using the tracing crate
 *
 * Every system call runs inside a `syscall` span carrying the calling
 * pid/tid and a fresh trace id, so the events a call emits (pipe wakeups,
 * socket admissions, process teardown) can be correlated in the output.
 */

use crate::core::types::{Pid, Tid};
use std::fmt::Display;
use std::time::Instant;
use tracing::span::EnteredSpan;
use tracing::{debug, span, warn, Level};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Non-blocking calls slower than this are reported
const SLOW_SYSCALL_MS: u128 = 10;

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - KERNEL_TRACE_JSON: Enable JSON output (default: false)
///
/// A second call (or a subscriber installed elsewhere) is left alone.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("KERNEL_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_span_events(FmtSpan::NONE)
                    .compact(),
            )
            .try_init()
    };

    if installed.is_ok() {
        debug!(json = use_json, "tracing initialized");
    }
}

/// Generate a unique trace ID for request correlation
pub fn generate_trace_id() -> String {
    Uuid::new_v4().to_string()
}

/// Entered span covering one system call
///
/// Dropping it records the duration and leaves the span.
pub struct SyscallSpan {
    span: EnteredSpan,
    start: Instant,
    name: &'static str,
    blocking: bool,
}

impl SyscallSpan {
    pub fn new(name: &'static str, pid: Pid, tid: Tid) -> Self {
        let trace_id = generate_trace_id();
        let span = span!(
            Level::DEBUG,
            "syscall",
            syscall = name,
            pid,
            tid,
            trace_id = %trace_id,
            result = tracing::field::Empty,
            error = tracing::field::Empty,
        );
        Self {
            span: span.entered(),
            start: Instant::now(),
            name,
            blocking: false,
        }
    }

    /// Calls that may sleep are never reported as slow
    pub fn blocking(mut self) -> Self {
        self.blocking = true;
        self
    }

    pub fn record_result<T, E: Display>(&self, result: &Result<T, E>) {
        match result {
            Ok(_) => {
                self.span.record("result", "success");
            }
            Err(e) => {
                self.span.record("result", "error");
                self.span.record("error", tracing::field::display(e));
            }
        }
    }
}

impl Drop for SyscallSpan {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        if !self.blocking && elapsed.as_millis() > SLOW_SYSCALL_MS {
            warn!(
                syscall = self.name,
                duration_ms = elapsed.as_millis() as u64,
                slow = true,
                "slow syscall detected"
            );
        } else {
            debug!(
                syscall = self.name,
                duration_us = elapsed.as_micros() as u64,
                "syscall completed"
            );
        }
    }
}
