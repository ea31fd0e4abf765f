//! Transaction lifecycle status and the legal transitions between statuses.

use serde::{Deserialize, Serialize};

/// Where a tracked transaction sits in its lifecycle.
///
/// The graph of legal transitions is encoded in [`TxStatus::can_transition_to`];
/// `Finalized`, `Replaced` and `Failed` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxStatus {
    /// Locally staged; its nonce is still ahead of the network next-nonce.
    Waiting,
    /// Broadcast, no receipt yet.
    Pending,
    /// Receipt found, not yet enough confirmations.
    Executed,
    /// Confirmation threshold reached.
    Confirmed,
    /// Deep enough to be considered irreversible.
    Finalized,
    /// Irrecoverable failure (validity window exceeded, execution revert...).
    Failed,
    /// Another transaction with the same nonce was included instead.
    Replaced,
    /// A same-nonce collision was observed but is not yet final.
    TempReplaced,
}

/// Statuses that will never change again.
pub const TERMINAL_STATUSES: &[TxStatus] =
    &[TxStatus::Finalized, TxStatus::Replaced, TxStatus::Failed];

/// Every status a record can still move out of. Used by the duplicate
/// handler to find same-nonce siblings that need replacing.
pub const NOT_FINALIZED_STATUSES: &[TxStatus] = &[
    TxStatus::Waiting,
    TxStatus::Pending,
    TxStatus::Executed,
    TxStatus::Confirmed,
    TxStatus::TempReplaced,
];

/// Statuses a newer same-nonce record can hold and still count as a
/// speedup/cancel superseding an older pending record.
pub const SPEEDUP_CANDIDATE_STATUSES: &[TxStatus] = &[
    TxStatus::Waiting,
    TxStatus::Pending,
    TxStatus::Executed,
    TxStatus::Confirmed,
    TxStatus::Finalized,
];

impl TxStatus {
    /// Whether this status can never change again.
    pub fn is_terminal(&self) -> bool {
        TERMINAL_STATUSES.contains(self)
    }

    /// Whether `self -> next` is an edge of the lifecycle state machine.
    ///
    /// Any non-terminal status may fail, and any non-terminal status may be
    /// replaced once a same-nonce sibling finalizes. The remaining edges are
    /// the forward progression plus the temp-replaced detour and its revert.
    pub fn can_transition_to(&self, next: TxStatus) -> bool {
        if self.is_terminal() || *self == next {
            return false;
        }
        match (self, next) {
            (_, TxStatus::Failed) => true,
            (_, TxStatus::Replaced) => true,
            (TxStatus::Waiting, TxStatus::Pending) => true,
            (TxStatus::Pending, TxStatus::Executed) => true,
            (TxStatus::Executed, TxStatus::Confirmed) => true,
            (TxStatus::Confirmed, TxStatus::Finalized) => true,
            // A nonce collision can be observed from any pre-confirmation
            // stage; the sibling marker also reaches Waiting records.
            (TxStatus::Waiting, TxStatus::TempReplaced) => true,
            (TxStatus::Pending, TxStatus::TempReplaced) => true,
            (TxStatus::Executed, TxStatus::TempReplaced) => true,
            // The original survived the collision; resume normal tracking.
            (TxStatus::TempReplaced, TxStatus::Pending) => true,
            _ => false,
        }
    }
}

/// Outcome of on-chain execution, known once a receipt exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutedStatus {
    Success,
    Failed,
}

/// Machine-readable cause recorded alongside `err` diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxErrorKind {
    /// Another transaction with the same nonce was included instead.
    ReplacedByAnotherTx,
    /// The transaction's validity window (epoch height bound) expired.
    EpochHeightOutOfBound,
    /// The transaction executed on chain but reverted.
    ExecuteFailed,
    /// Broadcasting the raw transaction was rejected by the endpoint.
    SendFailed,
    /// The user cancelled signing; no record is created in this case.
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses_have_no_outgoing_edges() {
        for from in TERMINAL_STATUSES {
            for to in [
                TxStatus::Waiting,
                TxStatus::Pending,
                TxStatus::Executed,
                TxStatus::Confirmed,
                TxStatus::Finalized,
                TxStatus::Failed,
                TxStatus::Replaced,
                TxStatus::TempReplaced,
            ] {
                assert!(!from.can_transition_to(to), "{from:?} -> {to:?}");
            }
        }
    }

    #[test]
    fn forward_progression_edges() {
        assert!(TxStatus::Waiting.can_transition_to(TxStatus::Pending));
        assert!(TxStatus::Pending.can_transition_to(TxStatus::Executed));
        assert!(TxStatus::Executed.can_transition_to(TxStatus::Confirmed));
        assert!(TxStatus::Confirmed.can_transition_to(TxStatus::Finalized));
    }

    #[test]
    fn no_stage_skipping() {
        assert!(!TxStatus::Pending.can_transition_to(TxStatus::Confirmed));
        assert!(!TxStatus::Pending.can_transition_to(TxStatus::Finalized));
        assert!(!TxStatus::Executed.can_transition_to(TxStatus::Finalized));
        assert!(!TxStatus::Waiting.can_transition_to(TxStatus::Executed));
    }

    #[test]
    fn temp_replaced_resolves_both_ways() {
        assert!(TxStatus::Executed.can_transition_to(TxStatus::TempReplaced));
        assert!(TxStatus::TempReplaced.can_transition_to(TxStatus::Replaced));
        assert!(TxStatus::TempReplaced.can_transition_to(TxStatus::Pending));
        assert!(!TxStatus::TempReplaced.can_transition_to(TxStatus::Executed));
    }
}
