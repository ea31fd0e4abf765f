//! In-memory reference backend.
//!
//! Thread-safe for use with tokio's multi-threaded runtime. Count
//! subscriptions are re-evaluated after every committed mutation, which is
//! what drives the polling engine's start/stop behavior.

use crate::{NewTrackedTx, StoreError, TxExtra, TxId, TxPayload, TxRecord, TxStore};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use tokio::sync::watch;
use vela_types::{AccountAddress, TxStatus};

struct CountWatcher {
    owner: AccountAddress,
    statuses: Vec<TxStatus>,
    sender: watch::Sender<u64>,
}

#[derive(Default)]
struct Inner {
    next_id: TxId,
    txs: BTreeMap<TxId, TxRecord>,
    payloads: HashMap<TxId, TxPayload>,
    extras: HashMap<TxId, TxExtra>,
    watchers: Vec<CountWatcher>,
}

impl Inner {
    fn count(&self, owner: &AccountAddress, statuses: &[TxStatus]) -> u64 {
        self.txs
            .values()
            .filter(|tx| &tx.owner == owner && statuses.contains(&tx.status))
            .count() as u64
    }

    /// Push fresh counts to every live watcher; drop closed ones.
    fn notify(&mut self) {
        let counts: Vec<u64> = self
            .watchers
            .iter()
            .map(|w| self.count(&w.owner, &w.statuses))
            .collect();
        let mut fresh = counts.into_iter();
        self.watchers.retain(|w| {
            let count = fresh.next().unwrap_or(0);
            w.sender.send(count).is_ok()
        });
    }
}

/// A complete in-memory [`TxStore`].
pub struct MemoryTxStore {
    inner: Mutex<Inner>,
}

impl MemoryTxStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: 1,
                ..Inner::default()
            }),
        }
    }
}

impl Default for MemoryTxStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TxStore for MemoryTxStore {
    fn create_tracked(&self, new_tx: NewTrackedTx) -> Result<TxId, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id;
        inner.next_id += 1;
        let record = TxRecord {
            id,
            owner: new_tx.owner,
            hash: new_tx.hash,
            raw: Some(new_tx.raw),
            status: new_tx.status,
            executed_status: None,
            receipt: None,
            resend_count: 0,
            created_at: new_tx.created_at,
            resend_at: None,
            executed_at: None,
            is_temp_replaced: false,
            err: None,
            error_kind: None,
            asset: new_tx.asset,
        };
        inner.txs.insert(id, record);
        inner.payloads.insert(id, new_tx.payload);
        inner.extras.insert(id, new_tx.extra);
        inner.notify();
        Ok(id)
    }

    fn get(&self, id: TxId) -> Result<TxRecord, StoreError> {
        self.inner
            .lock()
            .unwrap()
            .txs
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    fn update(
        &self,
        id: TxId,
        mutate: &mut dyn FnMut(&mut TxRecord),
    ) -> Result<TxRecord, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let record = inner.txs.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        mutate(record);
        let updated = record.clone();
        inner.notify();
        Ok(updated)
    }

    fn query_by_address(
        &self,
        owner: &AccountAddress,
        statuses: &[TxStatus],
    ) -> Result<Vec<TxRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .txs
            .values()
            .rev()
            .filter(|tx| &tx.owner == owner && statuses.contains(&tx.status))
            .cloned()
            .collect())
    }

    fn query_same_nonce(
        &self,
        owner: &AccountAddress,
        nonce: u64,
        statuses: &[TxStatus],
        exclude: TxId,
    ) -> Result<Vec<TxRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .txs
            .values()
            .rev()
            .filter(|tx| {
                tx.id != exclude
                    && &tx.owner == owner
                    && statuses.contains(&tx.status)
                    && inner.payloads.get(&tx.id).map(|p| p.nonce) == Some(nonce)
            })
            .cloned()
            .collect())
    }

    fn count(&self, owner: &AccountAddress, statuses: &[TxStatus]) -> Result<u64, StoreError> {
        Ok(self.inner.lock().unwrap().count(owner, statuses))
    }

    fn subscribe_count(
        &self,
        owner: &AccountAddress,
        statuses: &[TxStatus],
    ) -> watch::Receiver<u64> {
        let mut inner = self.inner.lock().unwrap();
        let initial = inner.count(owner, statuses);
        let (sender, receiver) = watch::channel(initial);
        inner.watchers.push(CountWatcher {
            owner: owner.clone(),
            statuses: statuses.to_vec(),
            sender,
        });
        receiver
    }

    fn payload_of(&self, id: TxId) -> Result<TxPayload, StoreError> {
        self.inner
            .lock()
            .unwrap()
            .payloads
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    fn extra_of(&self, id: TxId) -> Result<TxExtra, StoreError> {
        self.inner
            .lock()
            .unwrap()
            .extras
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }
}
