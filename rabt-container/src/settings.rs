//! Container configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for a [`Container`](crate::container::Container).
///
/// ```
/// use rabt_container::settings::ContainerSettings;
///
/// let settings = ContainerSettings::default();
/// assert!(settings.allow_override);
/// assert_eq!(settings.cache_ttl().as_secs(), 3600);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerSettings {
    /// Rebinding an abstract replaces the old binding; when `false` it fails.
    pub allow_override: bool,
    /// TTL hint passed to the external cache when flushing resolved services.
    pub cache_ttl_secs: u64,
}

impl ContainerSettings {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for ContainerSettings {
    fn default() -> Self {
        Self {
            allow_override: true,
            cache_ttl_secs: 3600,
        }
    }
}
