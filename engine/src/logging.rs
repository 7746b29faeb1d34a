use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing for a host binary or a test run.
///
/// Honors `RUST_LOG`; defaults to debug output for the engine itself.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "worktally_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
