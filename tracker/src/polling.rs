//! Generic interval-driven polling, gated on matching record counts.
//!
//! One [`Polling`] instance drives one status bucket. It observes the
//! store's count of records matching (owner, statuses) and only runs its
//! timer while that count is nonzero — no polling when there is nothing to
//! check. Each tick hands the matching records to a [`StatusChecker`];
//! when the check reports a status for which `start_next_immediately`
//! holds, the next tick fires with zero delay so a transaction can march
//! through adjacent buckets without waiting out full intervals.

use crate::TrackerError;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use vela_store::{TxRecord, TxStore};
use vela_types::{AccountAddress, Network, TxStatus};

/// Chain-aware status check invoked on every polling tick.
#[async_trait]
pub trait StatusChecker: Send + Sync {
    /// Check chain state for `records` and apply any status transitions.
    /// Returns the furthest status observed this tick, which drives the
    /// immediate-re-poll decision.
    async fn check(
        &self,
        records: Vec<TxRecord>,
        network: &Network,
    ) -> Result<Option<TxStatus>, TrackerError>;
}

/// Static description of one polling bucket.
pub struct PollingSpec {
    /// Bucket name for logs ("pending", "executed", ...).
    pub key: &'static str,
    /// Which statuses this bucket owns.
    pub statuses: &'static [TxStatus],
    /// Delay between ticks.
    pub interval: Duration,
    /// Given the furthest status a tick produced, should the next tick
    /// fire immediately instead of waiting out the interval?
    pub start_next_immediately: fn(TxStatus) -> bool,
}

struct Subscription {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// A count-gated polling subscription over one status bucket.
pub struct Polling {
    spec: PollingSpec,
    store: Arc<dyn TxStore>,
    network: Network,
    checker: Arc<dyn StatusChecker>,
    subscription: Mutex<Option<Subscription>>,
}

impl Polling {
    pub fn new(
        spec: PollingSpec,
        store: Arc<dyn TxStore>,
        network: Network,
        checker: Arc<dyn StatusChecker>,
    ) -> Self {
        Self {
            spec,
            store,
            network,
            checker,
            subscription: Mutex::new(None),
        }
    }

    /// Begin observing and polling for `owner`. An already-running
    /// subscription (e.g. for a previous address) is torn down first.
    pub fn startup(&self, owner: &AccountAddress) {
        self.cleanup();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run_loop(
            PollingLoop {
                key: self.spec.key,
                statuses: self.spec.statuses,
                interval: self.spec.interval,
                start_next_immediately: self.spec.start_next_immediately,
                store: Arc::clone(&self.store),
                network: self.network.clone(),
                checker: Arc::clone(&self.checker),
                owner: owner.clone(),
            },
            shutdown_rx,
        ));
        *self.subscription.lock().unwrap() = Some(Subscription {
            shutdown: shutdown_tx,
            handle,
        });
    }

    /// Stop the timer and tear down the store subscription. Idempotent.
    /// An in-flight check is allowed to finish, but its result never arms
    /// another tick.
    pub fn cleanup(&self) {
        if let Some(subscription) = self.subscription.lock().unwrap().take() {
            let _ = subscription.shutdown.send(true);
            // The loop exits at its next await; the handle is detached.
            drop(subscription.handle);
        }
    }

    /// Whether a subscription is currently running (for tests/diagnostics).
    pub fn is_running(&self) -> bool {
        self.subscription
            .lock()
            .unwrap()
            .as_ref()
            .map(|s| !s.handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for Polling {
    fn drop(&mut self) {
        self.cleanup();
    }
}

struct PollingLoop {
    key: &'static str,
    statuses: &'static [TxStatus],
    interval: Duration,
    start_next_immediately: fn(TxStatus) -> bool,
    store: Arc<dyn TxStore>,
    network: Network,
    checker: Arc<dyn StatusChecker>,
    owner: AccountAddress,
}

async fn run_loop(p: PollingLoop, mut shutdown: watch::Receiver<bool>) {
    let mut count_rx = p.store.subscribe_count(&p.owner, p.statuses);
    tracing::debug!(key = p.key, owner = %p.owner, "polling subscription started");

    loop {
        // Timer off while there is nothing to check.
        while *count_rx.borrow_and_update() == 0 {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        return;
                    }
                }
                changed = count_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }

        let records = match p.store.query_by_address(&p.owner, p.statuses) {
            Ok(records) => records,
            Err(error) => {
                tracing::warn!(key = p.key, %error, "polling query failed");
                vec![]
            }
        };

        // At most one in-flight check: the next tick is only armed after
        // this await settles.
        let immediate = if records.is_empty() {
            false
        } else {
            match p.checker.check(records, &p.network).await {
                Ok(Some(status)) => (p.start_next_immediately)(status),
                Ok(None) => false,
                Err(error) => {
                    // Transient failures leave record state alone; the
                    // timer stays on schedule.
                    tracing::warn!(key = p.key, %error, "status check failed");
                    false
                }
            }
        };

        // Results of a check that straddled cleanup are discarded: the
        // subscription is dead, never re-armed.
        if *shutdown.borrow() {
            return;
        }
        if immediate {
            // Zero delay, but still a scheduling point: a checker that
            // completes without awaiting must not pin the executor.
            tokio::task::yield_now().await;
            if *shutdown.borrow() {
                return;
            }
            continue;
        }
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    return;
                }
            }
            _ = tokio::time::sleep(p.interval) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vela_store::{MemoryTxStore, NewTrackedTx, TxExtra, TxPayload};
    use vela_types::{ChainKind, Timestamp, TxHash};

    struct CountingChecker {
        calls: AtomicUsize,
        outcome: Option<TxStatus>,
    }

    #[async_trait]
    impl StatusChecker for CountingChecker {
        async fn check(
            &self,
            _records: Vec<TxRecord>,
            _network: &Network,
        ) -> Result<Option<TxStatus>, TrackerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.outcome)
        }
    }

    fn addr(s: &str) -> AccountAddress {
        AccountAddress::new(s).unwrap()
    }

    fn network() -> Network {
        Network::new("devnet", "http://localhost:8545", 1, ChainKind::Evm)
    }

    fn pending_tx(owner: &AccountAddress, nonce: u64) -> NewTrackedTx {
        let hex: String = (0..32).map(|_| format!("{:02x}", nonce as u8)).collect();
        NewTrackedTx {
            owner: owner.clone(),
            hash: Some(TxHash::new(format!("0x{hex}")).unwrap()),
            raw: vec![0xf8, nonce as u8],
            status: TxStatus::Pending,
            created_at: Timestamp::new(nonce),
            payload: TxPayload {
                from: owner.clone(),
                to: None,
                nonce,
                value: "0".into(),
                gas: "21000".into(),
                gas_price: None,
                max_fee_per_gas: None,
                max_priority_fee_per_gas: None,
                data: vec![],
                chain_id: 1,
                storage_limit: None,
                epoch_height: None,
                tx_type: None,
            },
            extra: TxExtra::default(),
            asset: None,
        }
    }

    fn polling(
        store: Arc<MemoryTxStore>,
        checker: Arc<CountingChecker>,
        interval: Duration,
    ) -> Polling {
        Polling::new(
            PollingSpec {
                key: "pending",
                statuses: &[TxStatus::Pending],
                interval,
                start_next_immediately: |s| s == TxStatus::Executed,
            },
            store,
            network(),
            checker,
        )
    }

    #[tokio::test]
    async fn no_polling_without_matching_records() {
        let store = Arc::new(MemoryTxStore::new());
        let checker = Arc::new(CountingChecker {
            calls: AtomicUsize::new(0),
            outcome: None,
        });
        let polling = polling(Arc::clone(&store), Arc::clone(&checker), Duration::from_millis(5));
        polling.startup(&addr("0xaaaa"));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(checker.calls.load(Ordering::SeqCst), 0);
        polling.cleanup();
    }

    #[tokio::test]
    async fn timer_starts_when_count_goes_positive() {
        let store = Arc::new(MemoryTxStore::new());
        let checker = Arc::new(CountingChecker {
            calls: AtomicUsize::new(0),
            outcome: None,
        });
        let owner = addr("0xaaaa");
        let polling = polling(Arc::clone(&store), Arc::clone(&checker), Duration::from_millis(5));
        polling.startup(&owner);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(checker.calls.load(Ordering::SeqCst), 0);

        store.create_tracked(pending_tx(&owner, 1)).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(checker.calls.load(Ordering::SeqCst) >= 1);
        polling.cleanup();
    }

    #[tokio::test]
    async fn immediate_repoll_skips_the_interval() {
        let store = Arc::new(MemoryTxStore::new());
        let owner = addr("0xaaaa");
        store.create_tracked(pending_tx(&owner, 1)).unwrap();

        // Outcome triggers the immediate predicate every tick; with a huge
        // interval, multiple calls prove the zero-delay path.
        let checker = Arc::new(CountingChecker {
            calls: AtomicUsize::new(0),
            outcome: Some(TxStatus::Executed),
        });
        let polling = polling(Arc::clone(&store), Arc::clone(&checker), Duration::from_secs(3600));
        polling.startup(&owner);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(checker.calls.load(Ordering::SeqCst) >= 2);
        polling.cleanup();
    }

    struct SlowChecker {
        calls: AtomicUsize,
        delay: Duration,
    }

    #[async_trait]
    impl StatusChecker for SlowChecker {
        async fn check(
            &self,
            _records: Vec<TxRecord>,
            _network: &Network,
        ) -> Result<Option<TxStatus>, TrackerError> {
            tokio::time::sleep(self.delay).await;
            self.calls.fetch_add(1, Ordering::SeqCst);
            // Would trigger the immediate re-poll if the result were used.
            Ok(Some(TxStatus::Executed))
        }
    }

    #[tokio::test]
    async fn cleanup_discards_a_straddling_check_result() {
        let store = Arc::new(MemoryTxStore::new());
        let owner = addr("0xaaaa");
        store.create_tracked(pending_tx(&owner, 1)).unwrap();
        let checker = Arc::new(SlowChecker {
            calls: AtomicUsize::new(0),
            delay: Duration::from_millis(40),
        });
        let polling = Polling::new(
            PollingSpec {
                key: "pending",
                statuses: &[TxStatus::Pending],
                interval: Duration::from_millis(5),
                start_next_immediately: |s| s == TxStatus::Executed,
            },
            Arc::clone(&store) as Arc<dyn TxStore>,
            network(),
            Arc::clone(&checker) as Arc<dyn StatusChecker>,
        );
        polling.startup(&owner);
        // Cleanup lands while the first check is still in flight.
        tokio::time::sleep(Duration::from_millis(10)).await;
        polling.cleanup();

        // The in-flight check finishes, but its Executed outcome must not
        // arm another tick on the dead subscription.
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(checker.calls.load(Ordering::SeqCst), 1);
        assert!(!polling.is_running());
    }

    #[tokio::test]
    async fn cleanup_stops_polling_and_is_idempotent() {
        let store = Arc::new(MemoryTxStore::new());
        let owner = addr("0xaaaa");
        store.create_tracked(pending_tx(&owner, 1)).unwrap();
        let checker = Arc::new(CountingChecker {
            calls: AtomicUsize::new(0),
            outcome: None,
        });
        let polling = polling(Arc::clone(&store), Arc::clone(&checker), Duration::from_millis(5));
        polling.startup(&owner);
        tokio::time::sleep(Duration::from_millis(30)).await;
        polling.cleanup();
        polling.cleanup();

        let after = checker.calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(checker.calls.load(Ordering::SeqCst), after);
        assert!(!polling.is_running());
    }

    #[tokio::test]
    async fn timer_stops_when_count_returns_to_zero() {
        let store = Arc::new(MemoryTxStore::new());
        let owner = addr("0xaaaa");
        let id = store.create_tracked(pending_tx(&owner, 1)).unwrap();
        let checker = Arc::new(CountingChecker {
            calls: AtomicUsize::new(0),
            outcome: None,
        });
        let polling = polling(Arc::clone(&store), Arc::clone(&checker), Duration::from_millis(5));
        polling.startup(&owner);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(checker.calls.load(Ordering::SeqCst) >= 1);

        store
            .update(id, &mut |tx| tx.status = TxStatus::Finalized)
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let after = checker.calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(checker.calls.load(Ordering::SeqCst), after);
        polling.cleanup();
    }
}
