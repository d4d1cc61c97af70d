use tracing::Level;
use tracing_subscriber::fmt;

/// Route crate logs to the test harness's captured output. Safe to call
/// from every test; returns true for the call that installed the
/// subscriber.
pub fn init_logging() -> bool {
    let format = fmt::format()
        .with_level(true)
        .with_line_number(true)
        .with_ansi(false)
        .without_time()
        .compact();
    fmt()
        .with_max_level(Level::TRACE)
        .with_test_writer()
        .event_format(format)
        .try_init()
        .is_ok()
}
