//! Chain transaction receipt.

use crate::{ExecutedStatus, TxHash};
use serde::{Deserialize, Serialize};

/// A transaction receipt as returned by the chain RPC.
///
/// EVM chains report `block_number` and a `status` word; Conflux Core
/// reports `epoch_number` and an `outcome_status`. Both are normalized
/// into this one shape by the RPC gateway so the tracker can count
/// confirmations without caring which family produced the receipt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Hash of the transaction this receipt belongs to.
    pub transaction_hash: TxHash,
    /// Block number (EVM) or epoch number (Conflux) of inclusion.
    pub inclusion_height: u64,
    /// Hash of the including block, 0x-hex.
    pub block_hash: String,
    /// Gas consumed, as a decimal string (can exceed u64 on some chains).
    pub gas_used: String,
    /// Whether execution succeeded or reverted.
    pub outcome: ExecutedStatus,
    /// Address of a created contract, when the transaction deployed one.
    pub contract_created: Option<String>,
}

impl Receipt {
    /// Whether the receipt reports a successful execution.
    pub fn succeeded(&self) -> bool {
        self.outcome == ExecutedStatus::Success
    }
}
