//! Normalized transaction payload.

use serde::{Deserialize, Serialize};
use vela_types::AccountAddress;

/// The fields a transaction was built from, normalized at creation time:
/// the nonce as an integer, amounts as canonical decimal strings (they can
/// exceed u64), calldata as raw bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxPayload {
    pub from: AccountAddress,
    /// Absent for contract deployments.
    pub to: Option<AccountAddress>,
    pub nonce: u64,
    /// Transferred value in the chain's base unit, decimal string.
    pub value: String,
    /// Gas limit, decimal string.
    pub gas: String,
    /// Legacy gas price, decimal string.
    pub gas_price: Option<String>,
    /// EIP-1559 fee caps, decimal strings.
    pub max_fee_per_gas: Option<String>,
    pub max_priority_fee_per_gas: Option<String>,
    pub data: Vec<u8>,
    pub chain_id: u64,
    /// Conflux Core storage collateral limit.
    pub storage_limit: Option<String>,
    /// Conflux Core validity-window anchor: the epoch the transaction was
    /// built against. The transaction expires once the chain moves too far
    /// past this epoch.
    pub epoch_height: Option<u64>,
    /// Transaction envelope type (0 legacy, 2 EIP-1559, ...).
    pub tx_type: Option<u8>,
}
