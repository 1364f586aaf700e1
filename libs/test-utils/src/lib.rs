pub mod scripted;
pub mod stub_hub;

pub use scripted::{ChannelLog, ScriptedConnector, ScriptedHttp};
pub use stub_hub::{Hit, LoginReply, StubHub};

/// Install a test subscriber once; later calls are no-ops.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}
