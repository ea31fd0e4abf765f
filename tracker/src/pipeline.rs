//! Broadcast event pipeline.
//!
//! The single choke point between "a signed transaction left the wallet"
//! and tracked state: every [`TxBroadcast`] event becomes exactly one
//! stored record, with its payload and derived classification persisted in
//! the same atomic batch. Nothing else in the system creates records.

use crate::replaced::NonceCache;
use crate::TrackerError;
use std::sync::Arc;
use vela_events::{AssetKind, TxBroadcast};
use vela_store::{NewTrackedTx, TxExtra, TxId, TxStore};
use vela_types::{TxErrorKind, TxStatus};

/// Turns broadcast events into tracked records.
pub struct BroadcastPipeline {
    store: Arc<dyn TxStore>,
    nonce_cache: Arc<NonceCache>,
}

impl BroadcastPipeline {
    pub fn new(store: Arc<dyn TxStore>, nonce_cache: Arc<NonceCache>) -> Self {
        Self { store, nonce_cache }
    }

    /// Persist one broadcast as a tracked record. Record, payload and
    /// classification land in one atomic batch.
    ///
    /// The record starts Pending, except when its nonce is ahead of the
    /// last next-nonce observed for the owner: the chain cannot execute it
    /// yet, so it is staged Waiting and promoted once the gap closes.
    pub fn register(&self, event: TxBroadcast) -> Result<TxId, TrackerError> {
        let status = self.initial_status(&event);
        let extra = classify(&event);
        let asset = Some(asset_label(event.asset_kind).to_owned());
        let id = self.store.create_tracked(NewTrackedTx {
            owner: event.owner.clone(),
            hash: Some(event.hash.clone()),
            raw: event.raw,
            status,
            created_at: event.sent_at,
            payload: event.payload,
            extra,
            asset,
        })?;
        tracing::info!(
            id,
            owner = %event.owner,
            hash = event.hash.as_str(),
            ?status,
            "broadcast registered"
        );
        Ok(id)
    }

    /// Persist a broadcast whose initial submission was rejected outright.
    /// The record lands terminally Failed so the attempt stays visible in
    /// history, but nothing will ever poll it.
    pub fn register_send_failure(
        &self,
        event: TxBroadcast,
        message: impl Into<String>,
    ) -> Result<TxId, TrackerError> {
        let extra = classify(&event);
        let asset = Some(asset_label(event.asset_kind).to_owned());
        let message = message.into();
        let id = self.store.create_tracked(NewTrackedTx {
            owner: event.owner.clone(),
            hash: Some(event.hash.clone()),
            raw: event.raw,
            status: TxStatus::Failed,
            created_at: event.sent_at,
            payload: event.payload,
            extra,
            asset,
        })?;
        self.store.update(id, &mut |tx| {
            tx.raw = None;
            tx.err = Some(message.clone());
            tx.error_kind = Some(TxErrorKind::SendFailed);
        })?;
        tracing::warn!(id, owner = %event.owner, error = %message, "broadcast rejected by endpoint");
        Ok(id)
    }

    fn initial_status(&self, event: &TxBroadcast) -> TxStatus {
        match self.nonce_cache.get(&event.owner) {
            Some(next_nonce) if event.payload.nonce > next_nonce => TxStatus::Waiting,
            _ => TxStatus::Pending,
        }
    }
}

fn classify(event: &TxBroadcast) -> TxExtra {
    let contract_interaction =
        event.contract_address.is_some() || !event.payload.data.is_empty();
    TxExtra {
        simple: event.asset_kind == AssetKind::Native,
        contract_interaction,
        token20: event.asset_kind == AssetKind::Erc20,
        token_nft: matches!(event.asset_kind, AssetKind::Erc721 | AssetKind::Erc1155),
        contract_address: event.contract_address.clone(),
        method: match event.asset_kind {
            AssetKind::Erc20 => Some("transfer".to_owned()),
            AssetKind::Erc721 => Some("transferFrom".to_owned()),
            AssetKind::Erc1155 => Some("safeTransferFrom".to_owned()),
            AssetKind::Native | AssetKind::Other => None,
        },
    }
}

fn asset_label(kind: AssetKind) -> &'static str {
    match kind {
        AssetKind::Native => "native",
        AssetKind::Erc20 => "erc20",
        AssetKind::Erc721 => "erc721",
        AssetKind::Erc1155 => "erc1155",
        AssetKind::Other => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vela_store::{MemoryTxStore, TxPayload};
    use vela_types::{AccountAddress, Timestamp, TxHash};

    fn addr(s: &str) -> AccountAddress {
        AccountAddress::new(s).unwrap()
    }

    fn broadcast(owner: &AccountAddress, nonce: u64, kind: AssetKind) -> TxBroadcast {
        let hex: String = (0..32).map(|_| format!("{:02x}", nonce as u8)).collect();
        TxBroadcast {
            hash: TxHash::new(format!("0x{hex}")).unwrap(),
            raw: vec![0xf8, nonce as u8],
            owner: owner.clone(),
            payload: TxPayload {
                from: owner.clone(),
                to: Some(addr("0xbbbb")),
                nonce,
                value: "1000".into(),
                gas: "21000".into(),
                gas_price: Some("1".into()),
                max_fee_per_gas: None,
                max_priority_fee_per_gas: None,
                data: if kind == AssetKind::Native {
                    vec![]
                } else {
                    vec![0xa9, 0x05, 0x9c, 0xbb]
                },
                chain_id: 1,
                storage_limit: None,
                epoch_height: None,
                tx_type: None,
            },
            asset_kind: kind,
            contract_address: if kind == AssetKind::Native {
                None
            } else {
                Some(addr("0xcccc"))
            },
            sent_at: Timestamp::new(1),
        }
    }

    #[test]
    fn native_transfer_starts_pending_and_is_simple() {
        let store = Arc::new(MemoryTxStore::new());
        let pipeline = BroadcastPipeline::new(store.clone(), Arc::new(NonceCache::new()));
        let owner = addr("0xaaaa");
        let id = pipeline
            .register(broadcast(&owner, 3, AssetKind::Native))
            .unwrap();
        let record = store.get(id).unwrap();
        assert_eq!(record.status, TxStatus::Pending);
        let extra = store.extra_of(id).unwrap();
        assert!(extra.simple);
        assert!(!extra.contract_interaction);
        assert!(!extra.token20 && !extra.token_nft);
        assert_eq!(extra.method, None);
    }

    #[test]
    fn erc20_classification() {
        let store = Arc::new(MemoryTxStore::new());
        let pipeline = BroadcastPipeline::new(store.clone(), Arc::new(NonceCache::new()));
        let id = pipeline
            .register(broadcast(&addr("0xaaaa"), 3, AssetKind::Erc20))
            .unwrap();
        let extra = store.extra_of(id).unwrap();
        assert!(!extra.simple);
        assert!(extra.contract_interaction);
        assert!(extra.token20);
        assert!(!extra.token_nft);
        assert_eq!(extra.contract_address, Some(addr("0xcccc")));
        assert_eq!(extra.method.as_deref(), Some("transfer"));
    }

    #[test]
    fn nft_classification() {
        let store = Arc::new(MemoryTxStore::new());
        let pipeline = BroadcastPipeline::new(store.clone(), Arc::new(NonceCache::new()));
        let id = pipeline
            .register(broadcast(&addr("0xaaaa"), 3, AssetKind::Erc1155))
            .unwrap();
        let extra = store.extra_of(id).unwrap();
        assert!(extra.token_nft);
        assert_eq!(extra.method.as_deref(), Some("safeTransferFrom"));
    }

    #[test]
    fn nonce_ahead_of_network_stages_waiting() {
        let store = Arc::new(MemoryTxStore::new());
        let cache = Arc::new(NonceCache::new());
        let owner = addr("0xaaaa");
        cache.observe(&owner, 5);
        let pipeline = BroadcastPipeline::new(store.clone(), Arc::clone(&cache));

        // Nonce 7 > next-nonce 5: the chain cannot execute it yet.
        let ahead = pipeline.register(broadcast(&owner, 7, AssetKind::Native)).unwrap();
        assert_eq!(store.get(ahead).unwrap().status, TxStatus::Waiting);

        // Nonce 5 is exactly the next slot: track immediately.
        let next = pipeline.register(broadcast(&owner, 5, AssetKind::Native)).unwrap();
        assert_eq!(store.get(next).unwrap().status, TxStatus::Pending);
    }

    #[test]
    fn unknown_network_nonce_defaults_to_pending() {
        let store = Arc::new(MemoryTxStore::new());
        let pipeline = BroadcastPipeline::new(store.clone(), Arc::new(NonceCache::new()));
        let id = pipeline
            .register(broadcast(&addr("0xaaaa"), 42, AssetKind::Native))
            .unwrap();
        assert_eq!(store.get(id).unwrap().status, TxStatus::Pending);
    }
}
