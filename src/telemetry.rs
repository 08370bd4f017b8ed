//! Telemetry initialization.
//!
//! Controlled by `TESTDEX_LOG` (an `EnvFilter` directive, default `warn`):
//! recoverable per-file trouble is logged at `warn`, per-file progress at
//! `debug`. Set `TESTDEX_LOG_FORMAT=json` for JSON events on stderr.

use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber. Call once from `main()`.
pub fn init() {
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::util::SubscriberInitExt as _;

    let filter = EnvFilter::try_from_env("TESTDEX_LOG")
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("TESTDEX_LOG_FORMAT").as_deref() == Ok("json") {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
