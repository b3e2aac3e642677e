//! Ring configuration.
//!
//! Timing and retry budgets for a node. Every field has a default, so an empty YAML file
//! (or none at all) yields a working configuration.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{ChordError, Result};

/// Hop bound for a single lookup chain.
pub const FAIL_TIMES: u32 = 32;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    /// Length of the successor list (fallback chain).
    pub successor_list_len: usize,
    pub stabilize_interval_ms: u64,
    pub fix_fingers_interval_ms: u64,
    pub check_predecessor_interval_ms: u64,

    /// Per-request timeout for node-to-node calls.
    pub rpc_timeout_ms: u64,
    /// Dial attempts before a peer is reported unreachable.
    pub rpc_attempts: usize,
    /// Initial backoff between dial attempts (doubled per attempt, capped).
    pub rpc_backoff_ms: u64,
    pub ping_timeout_ms: u64,

    pub fix_finger_attempts: usize,
    pub get_attempts: usize,
    pub lookup_retry_delay_ms: u64,
    /// How long `MoveKeyRange` waits for its own predecessor, in stabilize intervals.
    pub join_wait_attempts: usize,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            successor_list_len: 8,
            stabilize_interval_ms: 250,
            fix_fingers_interval_ms: 250,
            check_predecessor_interval_ms: 250,
            rpc_timeout_ms: 1000,
            rpc_attempts: 3,
            rpc_backoff_ms: 150,
            ping_timeout_ms: 300,
            fix_finger_attempts: 5,
            get_attempts: 3,
            lookup_retry_delay_ms: 100,
            join_wait_attempts: 32,
        }
    }
}

impl RingConfig {
    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(text).map_err(|e| ChordError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.successor_list_len == 0 {
            return Err(ChordError::Config(
                "successor_list_len must be at least 1".to_string(),
            ));
        }
        if self.rpc_attempts == 0 || self.fix_finger_attempts == 0 || self.get_attempts == 0 {
            return Err(ChordError::Config(
                "retry budgets must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn stabilize_interval(&self) -> Duration {
        Duration::from_millis(self.stabilize_interval_ms)
    }

    pub fn fix_fingers_interval(&self) -> Duration {
        Duration::from_millis(self.fix_fingers_interval_ms)
    }

    pub fn check_predecessor_interval(&self) -> Duration {
        Duration::from_millis(self.check_predecessor_interval_ms)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout_ms)
    }

    pub fn lookup_retry_delay(&self) -> Duration {
        Duration::from_millis(self.lookup_retry_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = RingConfig::from_yaml("{}").unwrap();
        assert_eq!(config.successor_list_len, 8);
        assert_eq!(config.stabilize_interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_partial_yaml_overrides_fields() {
        let config = RingConfig::from_yaml("successor_list_len: 4\nrpc_attempts: 5\n").unwrap();
        assert_eq!(config.successor_list_len, 4);
        assert_eq!(config.rpc_attempts, 5);
        assert_eq!(config.get_attempts, 3);
    }

    #[test]
    fn test_zero_successor_list_rejected() {
        let err = RingConfig::from_yaml("successor_list_len: 0").unwrap_err();
        assert!(matches!(err, ChordError::Config(_)));
    }
}
