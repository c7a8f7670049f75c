//! Process-wide log subscriber, filtered by `RUST_LOG`.

use tracing_subscriber::EnvFilter;

/// Installs the fmt subscriber. Fails if a global subscriber is already set.
pub fn init() -> Result<(), tracing_subscriber::util::TryInitError> {
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_thread_names(true)
        .finish()
        .try_init()
}

/// Like `init`, but a no-op when a subscriber is already installed.
pub fn try_init() {
    let _ = init();
}
