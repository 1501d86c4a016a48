use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initializes the global tracing subscriber with sensible defaults.
///
/// `RUST_LOG` directives are honoured; `tally=info` is added on top. A
/// subscriber installed earlier by the host is left in place.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let mut filter = EnvFilter::from_default_env();
        if let Ok(directive) = "tally=info".parse() {
            filter = filter.add_directive(directive);
        }

        let _ = fmt().with_env_filter(filter).try_init();
    });
}
