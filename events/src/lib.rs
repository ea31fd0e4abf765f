//! Typed event bus.
//!
//! Cross-component notifications flow through one [`EventBus`] instance
//! handed to each component at construction:
//! - every freshly signed-and-sent transaction is published as a
//!   [`TxBroadcast`] (consumed by the broadcast pipeline),
//! - the currently selected address is a watch channel (the tracker
//!   restarts its pollers when it changes),
//! - freshly observed next-nonces are published per owner (promotes
//!   waiting transactions).

use tokio::sync::{broadcast, watch};
use vela_store::TxPayload;
use vela_types::{AccountAddress, Timestamp, TxHash};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Classification supplied by the sending flow, so the pipeline never has
/// to re-derive it from calldata.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetKind {
    /// Native-token transfer.
    Native,
    /// ERC-20 style fungible token.
    Erc20,
    /// ERC-721 NFT.
    Erc721,
    /// ERC-1155 multi-token.
    Erc1155,
    /// Anything else (arbitrary contract call, deployment).
    Other,
}

/// "A signed transaction was just sent" — the single entry point into
/// tracked state.
#[derive(Clone, Debug)]
pub struct TxBroadcast {
    pub hash: TxHash,
    pub raw: Vec<u8>,
    pub owner: AccountAddress,
    pub payload: TxPayload,
    pub asset_kind: AssetKind,
    pub contract_address: Option<AccountAddress>,
    pub sent_at: Timestamp,
}

/// A freshly observed network next-nonce for an owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NextNonce {
    pub owner: AccountAddress,
    pub next_nonce: u64,
}

/// The process-wide event bus. Cheap to clone.
#[derive(Clone)]
pub struct EventBus {
    tx_broadcast: broadcast::Sender<TxBroadcast>,
    next_nonce: broadcast::Sender<NextNonce>,
    current_address_tx: watch::Sender<Option<AccountAddress>>,
    current_address_rx: watch::Receiver<Option<AccountAddress>>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx_broadcast, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (next_nonce, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (current_address_tx, current_address_rx) = watch::channel(None);
        Self {
            tx_broadcast,
            next_nonce,
            current_address_tx,
            current_address_rx,
        }
    }

    /// Publish a broadcast transaction. Returns whether anyone listened.
    pub fn publish_broadcast(&self, event: TxBroadcast) -> bool {
        self.tx_broadcast.send(event).is_ok()
    }

    pub fn subscribe_broadcast(&self) -> broadcast::Receiver<TxBroadcast> {
        self.tx_broadcast.subscribe()
    }

    /// Publish a newly observed next-nonce for an owner.
    pub fn publish_next_nonce(&self, event: NextNonce) -> bool {
        self.next_nonce.send(event).is_ok()
    }

    pub fn subscribe_next_nonce(&self) -> broadcast::Receiver<NextNonce> {
        self.next_nonce.subscribe()
    }

    /// Switch the currently selected address (or clear it with `None`).
    pub fn set_current_address(&self, address: Option<AccountAddress>) {
        // send_if_modified avoids waking subscribers on redundant sets.
        self.current_address_tx.send_if_modified(|current| {
            if *current == address {
                false
            } else {
                *current = address;
                true
            }
        });
    }

    pub fn current_address(&self) -> Option<AccountAddress> {
        self.current_address_rx.borrow().clone()
    }

    pub fn watch_current_address(&self) -> watch::Receiver<Option<AccountAddress>> {
        self.current_address_rx.clone()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> AccountAddress {
        AccountAddress::new(s).unwrap()
    }

    #[tokio::test]
    async fn next_nonce_fans_out_to_all_subscribers() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe_next_nonce();
        let mut rx2 = bus.subscribe_next_nonce();
        let event = NextNonce {
            owner: addr("0xaaaa"),
            next_nonce: 11,
        };
        assert!(bus.publish_next_nonce(event.clone()));
        assert_eq!(rx1.recv().await.unwrap(), event);
        assert_eq!(rx2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn current_address_watch_holds_latest() {
        let bus = EventBus::new();
        bus.set_current_address(Some(addr("0xaaaa")));
        // A late subscriber still sees the current value.
        let rx = bus.watch_current_address();
        assert_eq!(rx.borrow().clone(), Some(addr("0xaaaa")));
    }

    #[tokio::test]
    async fn redundant_address_set_does_not_wake_watchers() {
        let bus = EventBus::new();
        bus.set_current_address(Some(addr("0xaaaa")));
        let mut rx = bus.watch_current_address();
        rx.mark_unchanged();
        bus.set_current_address(Some(addr("0xaaaa")));
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn publish_without_subscribers_reports_false() {
        let bus = EventBus::new();
        assert!(!bus.publish_next_nonce(NextNonce {
            owner: addr("0xaaaa"),
            next_nonce: 1,
        }));
    }
}
