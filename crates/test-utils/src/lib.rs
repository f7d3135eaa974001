pub mod builders;
pub mod workers;

use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Install a test subscriber once per process.
///
/// Output goes through the test writer, so it only shows up for failing
/// tests (or under `-- --nocapture`). Set `RUST_LOG` to raise the level.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt().with_env_filter(filter).with_test_writer().init();
    });
}

/// Cap a future at five seconds so a deadlock fails the test instead of
/// hanging the suite.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("timed out after 5 seconds")
}
