//! Reconciler configuration.

use serde::{Deserialize, Serialize};

/// Options for [`Stitcher`](crate::Stitcher).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StitchConfig {
    /// Skip a patch whose `(reference, update_index)` was already applied.
    pub deduplicate: bool,
    /// Give up (no main patch) when more than one patch could be the root.
    /// When off, the oldest candidate wins.
    pub require_single_root: bool,
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            deduplicate: true,
            require_single_root: true,
        }
    }
}

/// Builder for stitch configuration.
pub struct StitchConfigBuilder {
    config: StitchConfig,
}

impl StitchConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: StitchConfig::default(),
        }
    }

    pub fn deduplicate(mut self, enabled: bool) -> Self {
        self.config.deduplicate = enabled;
        self
    }

    pub fn require_single_root(mut self, enabled: bool) -> Self {
        self.config.require_single_root = enabled;
        self
    }

    pub fn build(self) -> StitchConfig {
        self.config
    }
}

impl Default for StitchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_defaults() {
        let config = StitchConfigBuilder::new()
            .deduplicate(false)
            .require_single_root(false)
            .build();
        assert!(!config.deduplicate);
        assert!(!config.require_single_root);
        assert_eq!(StitchConfigBuilder::default().build(), StitchConfig::default());
    }

    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let config: StitchConfig = serde_json::from_str(r#"{ "deduplicate": false }"#).unwrap();
        assert!(!config.deduplicate);
        assert!(config.require_single_root);
    }
}
