//! Tracker configuration with TOML file support.

use crate::consts;
use crate::TrackerError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for a [`crate::TxTracker`].
///
/// Can be loaded from a TOML file via [`TrackerConfig::from_toml_file`] or
/// built programmatically (e.g. for tests, where intervals are shrunk to
/// milliseconds).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Pending-bucket polling interval in milliseconds.
    #[serde(default = "default_pending_interval")]
    pub pending_interval_ms: u64,

    /// Executed-bucket polling interval in milliseconds.
    #[serde(default = "default_executed_interval")]
    pub executed_interval_ms: u64,

    /// Confirmed/temp-replaced bucket polling interval in milliseconds.
    #[serde(default = "default_confirmed_interval")]
    pub confirmed_interval_ms: u64,

    /// Resend attempts before replacement detection runs.
    #[serde(default = "default_check_replaced_count")]
    pub check_replaced_before_resend_count: u32,

    /// Hard cap on resend attempts.
    #[serde(default = "default_resend_limit")]
    pub tx_resend_limit: u32,

    /// Blocks/epochs past inclusion before Executed becomes Confirmed.
    #[serde(default = "default_confirmation_threshold")]
    pub confirmation_threshold: u64,

    /// Conflux Core epoch validity window.
    #[serde(default = "default_epoch_height_bound")]
    pub epoch_height_bound: u64,

    /// Per-RPC-call timeout in milliseconds.
    #[serde(default = "default_rpc_timeout")]
    pub rpc_timeout_ms: u64,
}

fn default_pending_interval() -> u64 {
    consts::DEFAULT_POLLING_PENDING_INTERVAL_MS
}
fn default_executed_interval() -> u64 {
    consts::DEFAULT_POLLING_EXECUTED_INTERVAL_MS
}
fn default_confirmed_interval() -> u64 {
    consts::DEFAULT_POLLING_CONFIRMED_INTERVAL_MS
}
fn default_check_replaced_count() -> u32 {
    consts::CHECK_REPLACED_BEFORE_RESEND_COUNT
}
fn default_resend_limit() -> u32 {
    consts::TX_RESEND_LIMIT
}
fn default_confirmation_threshold() -> u64 {
    consts::CONFIRMATION_THRESHOLD
}
fn default_epoch_height_bound() -> u64 {
    consts::CFX_EPOCH_HEIGHT_BOUND
}
fn default_rpc_timeout() -> u64 {
    consts::DEFAULT_RPC_TIMEOUT_MS
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            pending_interval_ms: default_pending_interval(),
            executed_interval_ms: default_executed_interval(),
            confirmed_interval_ms: default_confirmed_interval(),
            check_replaced_before_resend_count: default_check_replaced_count(),
            tx_resend_limit: default_resend_limit(),
            confirmation_threshold: default_confirmation_threshold(),
            epoch_height_bound: default_epoch_height_bound(),
            rpc_timeout_ms: default_rpc_timeout(),
        }
    }
}

impl TrackerConfig {
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, TrackerError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| TrackerError::Config(format!("cannot read config file: {e}")))?;
        toml::from_str(&contents).map_err(|e| TrackerError::Config(format!("invalid config: {e}")))
    }

    pub fn pending_interval(&self) -> Duration {
        Duration::from_millis(self.pending_interval_ms)
    }

    pub fn executed_interval(&self) -> Duration {
        Duration::from_millis(self.executed_interval_ms)
    }

    pub fn confirmed_interval(&self) -> Duration {
        Duration::from_millis(self.confirmed_interval_ms)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config: TrackerConfig = toml::from_str("pending_interval_ms = 100").unwrap();
        assert_eq!(config.pending_interval_ms, 100);
        assert_eq!(config.tx_resend_limit, consts::TX_RESEND_LIMIT);
        assert_eq!(
            config.confirmation_threshold,
            consts::CONFIRMATION_THRESHOLD
        );
    }

    #[test]
    fn empty_config_is_all_defaults() {
        let config: TrackerConfig = toml::from_str("").unwrap();
        assert_eq!(
            config.pending_interval_ms,
            consts::DEFAULT_POLLING_PENDING_INTERVAL_MS
        );
    }
}
