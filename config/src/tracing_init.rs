//! Shared tracing-subscriber bootstrap: `RUST_LOG`-driven `EnvFilter` on
//! stdout plus a daily-rolling file appender, gated behind the
//! `tracing-init` feature so library crates never pull in the subscriber.

use std::path::Path;

use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Guard returned by [`init`]; drop it on process exit to flush buffered log
/// lines (`tracing_appender::non_blocking`'s worker thread writes async).
pub struct TracingGuard {
    _file_guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Installs a global subscriber: `RUST_LOG` (default `info`) filters both
/// sinks, stdout gets compact formatting, and `log_dir/<file_prefix>.log`
/// gets a daily-rolling plain-text copy. Call once, at process start.
pub fn init(log_dir: impl AsRef<Path>, file_prefix: &str) -> TracingGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_appender = tracing_appender::rolling::daily(log_dir, file_prefix);
    let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);

    let stdout_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stdout.and(non_blocking));

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .init();

    TracingGuard {
        _file_guard: file_guard,
    }
}
