//! Coordinator configuration.

/// Configuration for a [`crate::SyncCoordinator`].
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Guard updates with a store-side version check in addition to the
    /// cache check. Required when several processes write the same entity.
    pub conditional_writes: bool,

    /// Largest payload accepted by `submit_update`, in bytes.
    pub max_payload_bytes: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            conditional_writes: true,
            max_payload_bytes: 4 * 1024 * 1024, // 4 MB
        }
    }
}

impl CoordinatorConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether updates use the store-side version check.
    #[must_use]
    pub const fn conditional_writes(mut self, value: bool) -> Self {
        self.conditional_writes = value;
        self
    }

    /// Sets the maximum payload size.
    #[must_use]
    pub const fn max_payload_bytes(mut self, value: usize) -> Self {
        self.max_payload_bytes = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = CoordinatorConfig::default();
        assert!(config.conditional_writes);
        assert_eq!(config.max_payload_bytes, 4 * 1024 * 1024);
    }

    #[test]
    fn config_builder() {
        let config = CoordinatorConfig::new()
            .conditional_writes(false)
            .max_payload_bytes(128);
        assert!(!config.conditional_writes);
        assert_eq!(config.max_payload_bytes, 128);
    }
}
