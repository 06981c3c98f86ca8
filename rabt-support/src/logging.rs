//! Logging bootstrap.
//!
//! The container crates only emit `tracing` events. Applications (and the
//! demo) call [`init_logging`] once to see them.

use tracing_subscriber::EnvFilter;

/// Environment variable read for the log filter.
pub const LOG_ENV: &str = "RABT_LOG";

/// Installs a global `fmt` subscriber.
///
/// The filter comes from [`LOG_ENV`] when set, otherwise from
/// `default_directive` (e.g. `"rabt_container=debug"`).
///
/// Returns `false` when a global subscriber was already installed, so it is
/// safe to call from several tests or entry points.
pub fn init_logging(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(env = LOG_ENV, "Logging initialized");
    }
    installed
}
