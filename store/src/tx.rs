//! Tracked transaction record.

use crate::{TxExtra, TxPayload};
use serde::{Deserialize, Serialize};
use vela_types::{AccountAddress, ExecutedStatus, Receipt, Timestamp, TxErrorKind, TxHash, TxStatus};

/// Store-assigned record id. Ids are monotonically increasing, so comparing
/// ids also orders records by local creation — the replacement tie-break
/// uses this instead of wall-clock timestamps.
pub type TxId = u64;

/// A tracked transaction as persisted in the store.
///
/// Mutated exclusively through the tracker's status-transition paths, always
/// inside a single [`crate::TxStore::update`] call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRecord {
    pub id: TxId,
    pub owner: AccountAddress,
    /// Chain transaction hash; known as soon as the transaction is signed.
    pub hash: Option<TxHash>,
    /// Signed serialized bytes, kept for resending. Cleared once the record
    /// is finalized or permanently replaced — the bytes are no longer valid.
    pub raw: Option<Vec<u8>>,
    pub status: TxStatus,
    /// Set once a chain receipt is known.
    pub executed_status: Option<ExecutedStatus>,
    pub receipt: Option<Receipt>,
    /// Number of resend attempts so far.
    pub resend_count: u32,
    pub created_at: Timestamp,
    pub resend_at: Option<Timestamp>,
    pub executed_at: Option<Timestamp>,
    /// Provisionally superseded by a same-nonce sibling, pending finality.
    pub is_temp_replaced: bool,
    /// Human-readable diagnostic for a failed/replaced record.
    pub err: Option<String>,
    pub error_kind: Option<TxErrorKind>,
    /// Host-app asset identifier (contract address or native marker).
    pub asset: Option<String>,
}

impl TxRecord {
    /// The raw-retention invariant: signed bytes are held exactly while the
    /// record may still need broadcasting (Waiting/Pending) or may revert to
    /// it (provisional replacement); never for finalized/replaced records.
    pub fn raw_retention_ok(&self) -> bool {
        match self.status {
            TxStatus::Waiting | TxStatus::Pending => self.raw.is_some(),
            TxStatus::TempReplaced => !self.is_temp_replaced || self.raw.is_some(),
            TxStatus::Finalized | TxStatus::Replaced => self.raw.is_none(),
            _ => true,
        }
    }
}

/// Everything needed to start tracking a freshly broadcast (or staged)
/// transaction. Persisted as one atomic batch: record + payload + extra.
#[derive(Clone, Debug)]
pub struct NewTrackedTx {
    pub owner: AccountAddress,
    pub hash: Option<TxHash>,
    pub raw: Vec<u8>,
    /// `Pending` for a broadcast transaction, `Waiting` for one staged
    /// ahead of the network nonce.
    pub status: TxStatus,
    pub created_at: Timestamp,
    pub payload: TxPayload,
    pub extra: TxExtra,
    pub asset: Option<String>,
}
