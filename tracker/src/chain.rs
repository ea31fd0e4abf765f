//! Chain-family specific tracking rules.
//!
//! Everything that differs between Ethereum-like and Conflux-Core-like
//! chains during tracking is concentrated here, keyed by
//! [`ChainKind`] — no per-chain subclasses, just a tagged variant.

use crate::TrackerConfig;
use std::sync::Arc;
use vela_rpc::{HeightTag, RpcError, RpcGateway};
use vela_store::TxPayload;
use vela_types::ChainKind;

/// Confirmation counting and validity-window rules for one chain family.
#[derive(Clone, Copy, Debug)]
pub struct ChainRules {
    kind: ChainKind,
    confirmation_threshold: u64,
    epoch_height_bound: u64,
}

impl ChainRules {
    pub fn new(kind: ChainKind, config: &TrackerConfig) -> Self {
        Self {
            kind,
            confirmation_threshold: config.confirmation_threshold,
            epoch_height_bound: config.epoch_height_bound,
        }
    }

    pub fn kind(&self) -> ChainKind {
        self.kind
    }

    /// Executed -> Confirmed: enough blocks/epochs on top of the inclusion
    /// height.
    pub fn is_confirmed(&self, inclusion_height: u64, latest_height: u64) -> bool {
        latest_height.saturating_sub(inclusion_height) >= self.confirmation_threshold
    }

    /// Confirmed -> Finalized: the finalized head has reached the
    /// inclusion height.
    pub fn is_finalized(&self, inclusion_height: u64, finalized_height: u64) -> bool {
        finalized_height >= inclusion_height
    }

    /// Whether the transaction's validity window has expired, meaning the
    /// chain can no longer include it and the record is terminally Failed.
    ///
    /// EVM transactions never expire. Conflux Core transactions carry an
    /// `epoch_height` anchor and become invalid once the chain moves more
    /// than the bound past it. At most one RPC round trip.
    pub async fn validity_window_expired(
        &self,
        payload: &TxPayload,
        gateway: &Arc<dyn RpcGateway>,
    ) -> Result<bool, RpcError> {
        match self.kind {
            ChainKind::Evm => Ok(false),
            ChainKind::ConfluxCore => {
                let Some(epoch_height) = payload.epoch_height else {
                    return Ok(false);
                };
                let current = gateway.chain_height(HeightTag::Latest).await?;
                Ok(current.saturating_sub(epoch_height) > self.epoch_height_bound)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(kind: ChainKind) -> ChainRules {
        ChainRules::new(kind, &TrackerConfig::default())
    }

    #[test]
    fn confirmation_counting() {
        let r = rules(ChainKind::Evm);
        assert!(!r.is_confirmed(100, 104));
        assert!(r.is_confirmed(100, 105));
        // Height regression (reorg view) never confirms.
        assert!(!r.is_confirmed(100, 99));
    }

    #[test]
    fn finality_is_inclusive() {
        let r = rules(ChainKind::ConfluxCore);
        assert!(!r.is_finalized(100, 99));
        assert!(r.is_finalized(100, 100));
        assert!(r.is_finalized(100, 101));
    }
}
