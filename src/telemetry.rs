/// Logging setup for hosts that embed the mapper without their own subscriber
use crate::config::LoggingConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a global fmt subscriber.
///
/// `RUST_LOG` wins over the configured level. Returns false when a global
/// subscriber was already installed (by the host or an earlier call).
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(&config.level)))
        .unwrap_or_else(|_| EnvFilter::new("entra_group_names=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}

fn default_directive(level: &str) -> String {
    format!("entra_group_names={}", level.trim())
}
