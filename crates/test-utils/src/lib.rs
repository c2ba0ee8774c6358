pub mod builders;
pub mod fake_backend;

use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

/// Upper bound for a single scheduler-driving test.
///
/// Generous: the fake backend completes instantly and the local fork
/// backend only runs `true`/`exit N`, so anything near this limit is a
/// wedged loop, not a slow machine.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

static TRACING: Once = Once::new();

/// Set up tracing once per test binary, routed through the test writer so
/// output only appears for failing tests.
///
/// Level selection follows `RUST_LOG`, defaulting to `info`. When chasing a
/// stuck scheduler, `RUST_LOG=fanout=debug cargo test -- --nocapture` shows
/// every allocate/wait/epilogue transition.
pub fn init_tracing() {
    TRACING.call_once(|| {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, panicking if it outlives [`TEST_TIMEOUT`].
///
/// Scheduler bugs tend to surface as a loop parked in `wait_any` forever;
/// this turns that hang into a test failure instead of a stalled run.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    match tokio::time::timeout(TEST_TIMEOUT, f).await {
        Ok(value) => value,
        Err(_) => panic!("future did not finish within {TEST_TIMEOUT:?}"),
    }
}
