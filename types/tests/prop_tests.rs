use proptest::prelude::*;

use vela_types::{Timestamp, TxHash, TxStatus};

const ALL_STATUSES: [TxStatus; 8] = [
    TxStatus::Waiting,
    TxStatus::Pending,
    TxStatus::Executed,
    TxStatus::Confirmed,
    TxStatus::Finalized,
    TxStatus::Failed,
    TxStatus::Replaced,
    TxStatus::TempReplaced,
];

fn any_status() -> impl Strategy<Value = TxStatus> {
    prop::sample::select(ALL_STATUSES.to_vec())
}

proptest! {
    /// Terminal statuses never admit an outgoing transition.
    #[test]
    fn terminal_means_stuck(from in any_status(), to in any_status()) {
        if from.is_terminal() {
            prop_assert!(!from.can_transition_to(to));
        }
    }

    /// Self-transitions are never edges of the state machine.
    #[test]
    fn no_self_transitions(s in any_status()) {
        prop_assert!(!s.can_transition_to(s));
    }

    /// Nothing ever transitions back to Waiting: records only enter that
    /// status at creation time.
    #[test]
    fn waiting_is_entry_only(from in any_status()) {
        prop_assert!(!from.can_transition_to(TxStatus::Waiting));
    }

    /// Every non-terminal status can fail and can be replaced.
    #[test]
    fn failure_and_replacement_reach_everywhere(from in any_status()) {
        if !from.is_terminal() {
            prop_assert!(from.can_transition_to(TxStatus::Failed));
            prop_assert!(from.can_transition_to(TxStatus::Replaced));
        }
    }

    /// Finalized is only reachable from Confirmed: no stage skipping.
    #[test]
    fn finalized_only_from_confirmed(from in any_status()) {
        if from.can_transition_to(TxStatus::Finalized) {
            prop_assert_eq!(from, TxStatus::Confirmed);
        }
    }

    /// TxHash parsing accepts exactly 32-byte 0x-hex and round-trips bytes.
    #[test]
    fn tx_hash_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        let hash = TxHash::new(format!("0x{hex}")).unwrap();
        prop_assert_eq!(hash.to_bytes(), bytes);
    }

    /// Timestamp ordering matches the underlying milliseconds.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta.elapsed_since(tb), b.saturating_sub(a));
    }
}
