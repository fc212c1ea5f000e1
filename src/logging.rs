use tracing_subscriber::{fmt, EnvFilter};

/// Initializes the global subscriber.
///
/// The level is read from `RUST_LOG` and defaults to `info`.
/// Events go to stderr so stdout only carries the JSON output.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Initializes a verbose subscriber capturing output per test.
/// Safe to call from every test.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
