use tracing_subscriber::fmt::{self, format::FmtSpan};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Builds the filter from `RUST_LOG`, falling back to `info` (`debug` when verbose).
fn build_filter(rust_log: Option<&str>, verbose: bool) -> EnvFilter {
    let fallback = if verbose { "debug" } else { "info" };
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(fallback))
}

/// Span close events carry step durations, so they are only shown at debug level.
fn span_events(filter: &EnvFilter) -> FmtSpan {
    let directives = filter.to_string();
    if directives.contains("debug") || directives.contains("trace") {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    }
}

/// Installs the global subscriber for the CLI.
pub fn init(verbose: bool) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = build_filter(rust_log.as_deref(), verbose);

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_timer(fmt::time::uptime())
        .with_span_events(span_events(&filter));

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_enables_span_timings() {
        assert_eq!(span_events(&build_filter(None, true)), FmtSpan::CLOSE);
        assert_eq!(span_events(&build_filter(None, false)), FmtSpan::NONE);
    }

    #[test]
    fn test_rust_log_overrides_verbose() {
        let filter = build_filter(Some("dem_to_topo=trace"), false);
        assert_eq!(span_events(&filter), FmtSpan::CLOSE);

        let filter = build_filter(Some("warn"), true);
        assert_eq!(filter.to_string(), "warn");
        assert_eq!(span_events(&filter), FmtSpan::NONE);
    }

    #[test]
    fn test_invalid_rust_log_falls_back() {
        let filter = build_filter(Some("dem_to_topo=loud"), false);
        assert_eq!(filter.to_string(), "info");
    }
}
