//! Tracing subscriber setup for the command-line tool.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt::{self, format::FmtSpan}};

/// Filter used when neither `RUST_LOG` nor `--verbose` asks for more.
pub const DEFAULT_FILTER: &str = "info";

/// Installs the global subscriber. `RUST_LOG` wins over `verbose`; calibration
/// stage spans are reported on close whenever debug or trace output is enabled.
pub fn init(verbose: bool) {
    let fallback = if verbose { "debug" } else { DEFAULT_FILTER };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(fallback));

    let span_events = if reports_span_timings(&env_filter) {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_timer(fmt::time::uptime())
        .with_span_events(span_events);

    // A second init (e.g. from a test harness) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}

fn reports_span_timings(filter: &EnvFilter) -> bool {
    let directives = filter.to_string();
    directives.contains("debug") || directives.contains("trace")
}
