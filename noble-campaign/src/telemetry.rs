//! Tracing subscriber setup for hosts that don't install their own.

use tracing_subscriber::EnvFilter;

use noble_core::config::GeneralConfig;

/// Build the filter: `RUST_LOG` wins, otherwise `general.log_level`.
#[must_use]
pub fn env_filter(general: &GeneralConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&general.log_level))
}

/// Install a global `fmt` subscriber, JSON-formatted if configured.
///
/// Returns `false` if a global subscriber was already set.
pub fn init_tracing(general: &GeneralConfig) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(general))
        .with_target(true);

    let installed = if general.json_logs {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };

    if installed {
        tracing::info!(level = %general.log_level, json = general.json_logs, "Noble society tracing ready");
    }
    installed
}
