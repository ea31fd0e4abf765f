//! The chain gateway trait the tracker is written against.

use crate::RpcError;
use async_trait::async_trait;
use vela_types::{AccountAddress, Receipt, TxHash};

/// Which nonce view to query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NonceTag {
    /// Next nonce including mempool transactions ("pending").
    Pending,
    /// Next nonce at the finalized chain head.
    Finalized,
}

/// Which chain height to query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HeightTag {
    /// Latest block (EVM) or latest state epoch (Conflux).
    Latest,
    /// Finalized block/epoch.
    Finalized,
}

/// Chain RPC operations the tracker needs.
///
/// Implementations must bound every call with a timeout and surface
/// timeouts as [`RpcError::Timeout`] so callers can treat them as
/// transient. Batch methods preserve input order in their output.
#[async_trait]
pub trait RpcGateway: Send + Sync {
    /// The account's next nonce under `tag`.
    async fn next_nonce(&self, address: &AccountAddress, tag: NonceTag) -> Result<u64, RpcError>;

    /// The receipt for `hash`, or `None` while the transaction is not
    /// yet (or no longer) known to be included.
    async fn transaction_receipt(&self, hash: &TxHash) -> Result<Option<Receipt>, RpcError>;

    /// Batched receipt lookup; `result[i]` corresponds to `hashes[i]`.
    async fn transaction_receipts(
        &self,
        hashes: &[TxHash],
    ) -> Result<Vec<Option<Receipt>>, RpcError>;

    /// Broadcast raw signed bytes; returns the chain-reported hash.
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash, RpcError>;

    /// Current block number (EVM) or epoch number (Conflux) under `tag`.
    async fn chain_height(&self, tag: HeightTag) -> Result<u64, RpcError>;

    /// Current gas price in the chain's base unit.
    async fn gas_price(&self) -> Result<u128, RpcError>;

    /// Gas estimate for a call object (chain-native JSON shape).
    async fn estimate_gas(&self, call: serde_json::Value) -> Result<u128, RpcError>;
}
