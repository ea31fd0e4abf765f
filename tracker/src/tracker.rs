//! The transaction tracker: four chain-aware polling buckets plus the
//! status-transition machinery with its side effects.

use crate::chain::ChainRules;
use crate::pipeline::BroadcastPipeline;
use crate::polling::{Polling, PollingSpec, StatusChecker};
use crate::replaced::{NonceCache, ReplacedResponse};
use crate::{TrackerConfig, TrackerError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use vela_events::EventBus;
use vela_rpc::{HeightTag, NonceTag, RpcGateway};
use vela_store::{TxId, TxRecord, TxStore};
use vela_types::status::{NOT_FINALIZED_STATUSES, SPEEDUP_CANDIDATE_STATUSES};
use vela_types::{
    AccountAddress, ExecutedStatus, Network, Receipt, Timestamp, TxErrorKind, TxHash, TxStatus,
};

/// Side-effect sink for balance-affecting transactions. The host app wires
/// its asset/NFT trackers in here; the tracker itself stays ignorant of
/// how balances are fetched.
pub trait AssetRefresher: Send + Sync {
    /// Fungible token balances of `owner` may have changed.
    fn refresh_token_balances(&self, owner: &AccountAddress);

    /// NFT inventory involving `contract` may have changed.
    fn refresh_nft(&self, contract: &AccountAddress);
}

/// Default no-op sink.
pub struct NoopRefresher;

impl AssetRefresher for NoopRefresher {
    fn refresh_token_balances(&self, _owner: &AccountAddress) {}
    fn refresh_nft(&self, _contract: &AccountAddress) {}
}

/// Progression order used to pick the "furthest" status a tick observed.
fn progress_rank(status: TxStatus) -> u8 {
    match status {
        TxStatus::Waiting => 0,
        TxStatus::TempReplaced => 1,
        TxStatus::Pending => 2,
        TxStatus::Executed => 3,
        TxStatus::Confirmed => 4,
        TxStatus::Failed | TxStatus::Replaced => 5,
        TxStatus::Finalized => 6,
    }
}

fn further(current: Option<TxStatus>, candidate: TxStatus) -> Option<TxStatus> {
    match current {
        Some(s) if progress_rank(s) >= progress_rank(candidate) => Some(s),
        _ => Some(candidate),
    }
}

/// Shared tracking logic behind the polling buckets.
pub(crate) struct Core {
    store: Arc<dyn TxStore>,
    gateway: Arc<dyn RpcGateway>,
    rules: ChainRules,
    config: TrackerConfig,
    nonce_cache: Arc<NonceCache>,
    refresher: Arc<dyn AssetRefresher>,
    /// Log prefix: the chain family this tracker serves.
    prefix: &'static str,
}

impl Core {
    // ── Pending bucket ──────────────────────────────────────────────

    /// One batched receipt round trip for the whole bucket; records with a
    /// receipt progress to Executed, the rest run the unsent path
    /// (replacement detection, resend, validity window).
    pub(crate) async fn check_pending(
        &self,
        records: Vec<TxRecord>,
    ) -> Result<Option<TxStatus>, TrackerError> {
        let hashes: Vec<TxHash> = records.iter().filter_map(|r| r.hash.clone()).collect();
        let receipts = match self.gateway.transaction_receipts(&hashes).await {
            Ok(receipts) => receipts,
            Err(error) => {
                tracing::warn!(tracker = self.prefix, %error, "pending receipt batch failed");
                return Ok(None);
            }
        };
        let by_hash: HashMap<&TxHash, Receipt> = hashes
            .iter()
            .zip(receipts)
            .filter_map(|(hash, receipt)| receipt.map(|r| (hash, r)))
            .collect();

        let mut furthest = None;
        for record in records {
            let receipt = record.hash.as_ref().and_then(|h| by_hash.get(h)).cloned();
            let status = match receipt {
                Some(receipt) => {
                    match self
                        .set_progressed(record.id, TxStatus::Executed, Some(receipt))
                        .await
                    {
                        Ok(status) => status,
                        Err(error) => {
                            tracing::warn!(tracker = self.prefix, id = record.id, %error, "executed transition failed");
                            record.status
                        }
                    }
                }
                None => self.handle_unsent(&record).await,
            };
            furthest = further(furthest, status);
        }
        Ok(furthest)
    }

    /// The no-receipt-yet path for one pending record. All record mutation
    /// happens in a single atomic update at the end, so a crash or error
    /// mid-path never leaves partial state behind.
    async fn handle_unsent(&self, record: &TxRecord) -> TxStatus {
        let payload = match self.store.payload_of(record.id) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::warn!(tracker = self.prefix, id = record.id, %error, "payload lookup failed");
                return record.status;
            }
        };

        if record.resend_count >= self.config.check_replaced_before_resend_count {
            match self.check_replaced(record, payload.nonce).await {
                ReplacedResponse::Replaced => {
                    // Provisional: the nonce went to someone else but that
                    // is not final yet. Raw and hash stay in place.
                    if let Err(error) = self.set_replaced(record.id, true, false) {
                        tracing::warn!(tracker = self.prefix, id = record.id, %error, "temp-replace failed");
                        return record.status;
                    }
                    return TxStatus::TempReplaced;
                }
                ReplacedResponse::Executed => {
                    // A receipt exists after all; the next pending tick's
                    // batch will progress it.
                    return record.status;
                }
                ReplacedResponse::NotReplaced => {}
            }
        }

        if record.resend_count >= self.config.tx_resend_limit {
            // Deliberately not terminal: the transaction may still be
            // mined once the nonce gap closes. See DESIGN notes.
            tracing::warn!(
                tracker = self.prefix,
                id = record.id,
                hash = record.hash.as_ref().map(|h| h.as_str()),
                "resend limit reached, leaving record pending"
            );
            return record.status;
        }

        // Speedup/cancel: a strictly newer local record with the same nonce
        // supersedes this one without any RPC round trip.
        match self.store.query_same_nonce(
            &record.owner,
            payload.nonce,
            SPEEDUP_CANDIDATE_STATUSES,
            record.id,
        ) {
            Ok(duplicates) => {
                if duplicates.iter().any(|d| d.id > record.id) {
                    tracing::debug!(tracker = self.prefix, id = record.id, "superseded by newer same-nonce tx");
                    return record.status;
                }
            }
            Err(error) => {
                tracing::warn!(tracker = self.prefix, id = record.id, %error, "duplicate query failed");
                return record.status;
            }
        }

        let mut epoch_out_of_bound = false;
        let mut resent = false;
        match self
            .rules
            .validity_window_expired(&payload, &self.gateway)
            .await
        {
            Ok(true) => {
                tracing::info!(tracker = self.prefix, id = record.id, "validity window expired");
                epoch_out_of_bound = true;
            }
            Ok(false) => {
                if let Some(raw) = &record.raw {
                    // The attempt counts whether or not the endpoint takes
                    // it. A "nonce too low" bounce in particular must still
                    // advance the count, or a record whose nonce was
                    // consumed externally would never reach the replacement
                    // check.
                    resent = true;
                    if let Err(error) = self.gateway.send_raw_transaction(raw).await {
                        if error.is_transient() {
                            tracing::debug!(tracker = self.prefix, id = record.id, %error, "resend delivery failed");
                        } else {
                            // Protocol rejection; the replacement check
                            // resolves it on a later tick.
                            tracing::warn!(tracker = self.prefix, id = record.id, %error, "resend rejected");
                        }
                    }
                }
            }
            Err(error) => {
                tracing::debug!(tracker = self.prefix, id = record.id, %error, "validity check failed");
            }
        }

        let now = Timestamp::now();
        let result = self.store.update(record.id, &mut |tx| {
            if epoch_out_of_bound {
                tx.status = TxStatus::Failed;
                tx.raw = None;
                tx.err = Some("epoch height out of bound".into());
                tx.error_kind = Some(TxErrorKind::EpochHeightOutOfBound);
            } else {
                tx.status = TxStatus::Pending;
            }
            if resent {
                tx.resend_count += 1;
                tx.resend_at = Some(now);
            }
            tx.executed_status = None;
            tx.receipt = None;
        });
        match result {
            Ok(updated) => updated.status,
            Err(error) => {
                tracing::warn!(tracker = self.prefix, id = record.id, %error, "pending update failed");
                record.status
            }
        }
    }

    // ── Executed / Confirmed buckets ────────────────────────────────

    /// One `chain_height` call shared by every record in the bucket.
    pub(crate) async fn check_executed(
        &self,
        records: Vec<TxRecord>,
    ) -> Result<Option<TxStatus>, TrackerError> {
        let latest = match self.gateway.chain_height(HeightTag::Latest).await {
            Ok(height) => height,
            Err(error) => {
                tracing::warn!(tracker = self.prefix, %error, "chain height lookup failed");
                return Ok(None);
            }
        };
        let mut furthest = None;
        for record in records {
            let Some(receipt) = &record.receipt else {
                tracing::debug!(tracker = self.prefix, id = record.id, "executed record without receipt");
                continue;
            };
            if self.rules.is_confirmed(receipt.inclusion_height, latest) {
                match self
                    .set_progressed(record.id, TxStatus::Confirmed, None)
                    .await
                {
                    Ok(status) => furthest = further(furthest, status),
                    Err(error) => {
                        tracing::warn!(tracker = self.prefix, id = record.id, %error, "confirm transition failed");
                    }
                }
            }
        }
        Ok(furthest)
    }

    pub(crate) async fn check_confirmed(
        &self,
        records: Vec<TxRecord>,
    ) -> Result<Option<TxStatus>, TrackerError> {
        let finalized = match self.gateway.chain_height(HeightTag::Finalized).await {
            Ok(height) => height,
            Err(error) => {
                tracing::warn!(tracker = self.prefix, %error, "finalized height lookup failed");
                return Ok(None);
            }
        };
        let mut furthest = None;
        for record in records {
            let Some(receipt) = &record.receipt else {
                continue;
            };
            if self.rules.is_finalized(receipt.inclusion_height, finalized) {
                match self
                    .set_progressed(record.id, TxStatus::Finalized, None)
                    .await
                {
                    Ok(status) => furthest = further(furthest, status),
                    Err(error) => {
                        tracing::warn!(tracker = self.prefix, id = record.id, %error, "finalize transition failed");
                    }
                }
            }
        }
        Ok(furthest)
    }

    // ── Temp-replaced bucket ────────────────────────────────────────

    /// Re-resolve who actually won each contested nonce slot.
    pub(crate) async fn check_temp_replaced(
        &self,
        records: Vec<TxRecord>,
    ) -> Result<Option<TxStatus>, TrackerError> {
        let mut furthest = None;
        for record in records {
            let payload = match self.store.payload_of(record.id) {
                Ok(payload) => payload,
                Err(error) => {
                    tracing::warn!(tracker = self.prefix, id = record.id, %error, "payload lookup failed");
                    continue;
                }
            };
            let status = match self.check_replaced(&record, payload.nonce).await {
                // Slot still open, or this record won it: resume normal
                // pending bookkeeping either way.
                ReplacedResponse::NotReplaced | ReplacedResponse::Executed => {
                    match self.set_pending(record.id).await {
                        Ok(status) => status,
                        Err(error) => {
                            tracing::warn!(tracker = self.prefix, id = record.id, %error, "revert to pending failed");
                            record.status
                        }
                    }
                }
                // Still looks lost; permanent only once finality has
                // passed the nonce.
                ReplacedResponse::Replaced => {
                    match self
                        .gateway
                        .next_nonce(&record.owner, NonceTag::Finalized)
                        .await
                    {
                        Ok(finalized_nonce) if finalized_nonce > payload.nonce => {
                            match self.set_replaced(record.id, true, true) {
                                Ok(()) => TxStatus::Replaced,
                                Err(error) => {
                                    tracing::warn!(tracker = self.prefix, id = record.id, %error, "replace failed");
                                    record.status
                                }
                            }
                        }
                        Ok(_) => record.status,
                        Err(error) => {
                            tracing::debug!(tracker = self.prefix, id = record.id, %error, "finalized nonce lookup failed");
                            record.status
                        }
                    }
                }
            };
            furthest = further(furthest, status);
        }
        Ok(furthest)
    }

    // ── Replacement protocol ────────────────────────────────────────

    /// One detection round: has the nonce been consumed, and if so, by us
    /// or by a competitor? Any RPC failure is answered conservatively with
    /// `NotReplaced` — never regress state on an ambiguous network error.
    pub(crate) async fn check_replaced(&self, record: &TxRecord, nonce: u64) -> ReplacedResponse {
        if !self.nonce_used(&record.owner, nonce).await {
            return ReplacedResponse::NotReplaced;
        }
        let Some(hash) = &record.hash else {
            // Nonce consumed and we never learned a hash: nothing of ours
            // can be on chain.
            return ReplacedResponse::Replaced;
        };
        match self.gateway.transaction_receipt(hash).await {
            Ok(None) => ReplacedResponse::Replaced,
            Ok(Some(_)) => ReplacedResponse::Executed,
            Err(error) => {
                tracing::warn!(tracker = self.prefix, id = record.id, %error, "replacement receipt lookup failed");
                ReplacedResponse::NotReplaced
            }
        }
    }

    /// Whether the account's nonce has advanced past `nonce`. The cache
    /// short-circuits the RPC within a tracking session.
    async fn nonce_used(&self, owner: &AccountAddress, nonce: u64) -> bool {
        if self.nonce_cache.proves_used(owner, nonce) {
            return true;
        }
        match self.gateway.next_nonce(owner, NonceTag::Pending).await {
            Ok(next) => {
                self.nonce_cache.observe(owner, next);
                next > nonce
            }
            Err(error) => {
                tracing::debug!(tracker = self.prefix, %error, "nonce lookup failed");
                false
            }
        }
    }

    // ── Transitions and side effects ────────────────────────────────

    /// Move a record forward (Executed/Confirmed/Finalized), stamping
    /// receipt data, and fire the duplicate-handling and asset-refresh
    /// side effects on an actual change.
    async fn set_progressed(
        &self,
        id: TxId,
        new_status: TxStatus,
        receipt: Option<Receipt>,
    ) -> Result<TxStatus, TrackerError> {
        let previous = self.store.get(id)?;
        if previous.status == new_status {
            return Ok(new_status);
        }
        if !previous.status.can_transition_to(new_status) {
            tracing::debug!(
                tracker = self.prefix,
                id,
                from = ?previous.status,
                to = ?new_status,
                "skipping illegal transition"
            );
            return Ok(previous.status);
        }
        let now = Timestamp::now();
        let updated = self.store.update(id, &mut |tx| {
            tx.status = new_status;
            if let Some(receipt) = &receipt {
                tx.executed_status = Some(receipt.outcome);
                tx.receipt = Some(receipt.clone());
                tx.is_temp_replaced = false;
                if tx.executed_at.is_none() {
                    tx.executed_at = Some(now);
                }
                if receipt.outcome == ExecutedStatus::Failed {
                    tx.err = Some("transaction execution reverted".into());
                    tx.error_kind = Some(TxErrorKind::ExecuteFailed);
                }
            }
            if new_status == TxStatus::Finalized {
                // Raw bytes can never be rebroadcast past finality.
                tx.raw = None;
            }
        })?;
        self.handle_duplicates(&updated, true, new_status == TxStatus::Finalized)
            .await;
        if new_status == TxStatus::Executed {
            self.refresh_assets(&updated);
        }
        Ok(updated.status)
    }

    /// Mark every non-finalized same-nonce sibling of `record` replaced —
    /// provisionally (`finalized = false`) or permanently.
    async fn handle_duplicates(&self, record: &TxRecord, is_replaced: bool, finalized: bool) {
        let nonce = match self.store.payload_of(record.id) {
            Ok(payload) => payload.nonce,
            Err(error) => {
                tracing::warn!(tracker = self.prefix, id = record.id, %error, "payload lookup failed");
                return;
            }
        };
        let siblings = match self.store.query_same_nonce(
            &record.owner,
            nonce,
            NOT_FINALIZED_STATUSES,
            record.id,
        ) {
            Ok(siblings) => siblings,
            Err(error) => {
                tracing::warn!(tracker = self.prefix, id = record.id, %error, "sibling query failed");
                return;
            }
        };
        for sibling in siblings {
            if let Err(error) = self.set_replaced(sibling.id, is_replaced, finalized) {
                tracing::warn!(tracker = self.prefix, id = sibling.id, %error, "sibling replace failed");
            }
        }
    }

    /// The replacement mutation. Permanent replacement clears raw and
    /// diagnostics; the provisional flavour only flags the record and
    /// parks it in the temp-replaced bucket, keeping raw/hash since a
    /// reorg could still revive it.
    fn set_replaced(&self, id: TxId, is_replaced: bool, finalized: bool) -> Result<(), TrackerError> {
        self.store.update(id, &mut |tx| {
            if finalized {
                if !tx.status.is_terminal() {
                    tx.status = TxStatus::Replaced;
                }
                tx.raw = None;
                tx.err = None;
                tx.error_kind = Some(TxErrorKind::ReplacedByAnotherTx);
                tx.is_temp_replaced = false;
            } else if is_replaced {
                tx.is_temp_replaced = true;
                if tx.status.can_transition_to(TxStatus::TempReplaced) {
                    tx.status = TxStatus::TempReplaced;
                }
            } else {
                tx.is_temp_replaced = false;
                if tx.status == TxStatus::TempReplaced {
                    tx.status = TxStatus::Pending;
                }
            }
            if is_replaced {
                tx.executed_status = None;
                tx.receipt = None;
                tx.executed_at = None;
            }
        })?;
        Ok(())
    }

    /// Revert a record to plain pending bookkeeping and clear any
    /// provisional replacement marks on its siblings.
    async fn set_pending(&self, id: TxId) -> Result<TxStatus, TrackerError> {
        let updated = self.store.update(id, &mut |tx| {
            if tx.status == TxStatus::TempReplaced {
                tx.status = TxStatus::Pending;
            }
            tx.is_temp_replaced = false;
            tx.executed_status = None;
            tx.receipt = None;
        })?;
        self.handle_duplicates(&updated, false, false).await;
        Ok(updated.status)
    }

    fn refresh_assets(&self, record: &TxRecord) {
        let extra = match self.store.extra_of(record.id) {
            Ok(extra) => extra,
            Err(error) => {
                tracing::warn!(tracker = self.prefix, id = record.id, %error, "extra lookup failed");
                return;
            }
        };
        if extra.token_nft {
            if let Some(contract) = &extra.contract_address {
                self.refresher.refresh_nft(contract);
            }
        }
        if extra.simple || extra.token20 {
            self.refresher.refresh_token_balances(&record.owner);
        }
    }

    // ── Waiting promotion ───────────────────────────────────────────

    /// Promote every Waiting record whose nonce became reachable. Ordering
    /// is by nonce (not timestamp); idempotent — already-promoted records
    /// no longer match the Waiting query.
    fn promote_waiting(
        &self,
        owner: &AccountAddress,
        next_nonce: u64,
    ) -> Result<usize, TrackerError> {
        let records = self.store.query_by_address(owner, &[TxStatus::Waiting])?;
        let mut promoted = 0;
        for record in records {
            let payload = self.store.payload_of(record.id)?;
            if payload.nonce <= next_nonce {
                let updated = self.store.update(record.id, &mut |tx| {
                    if tx.status == TxStatus::Waiting {
                        tx.status = TxStatus::Pending;
                    }
                })?;
                if updated.status == TxStatus::Pending {
                    promoted += 1;
                    tracing::debug!(tracker = self.prefix, id = record.id, "waiting tx promoted");
                }
            }
        }
        Ok(promoted)
    }
}

// ── Bucket checkers ─────────────────────────────────────────────────

struct PendingChecker(Arc<Core>);
struct ExecutedChecker(Arc<Core>);
struct ConfirmedChecker(Arc<Core>);
struct TempReplacedChecker(Arc<Core>);

#[async_trait]
impl StatusChecker for PendingChecker {
    async fn check(
        &self,
        records: Vec<TxRecord>,
        _network: &Network,
    ) -> Result<Option<TxStatus>, TrackerError> {
        self.0.check_pending(records).await
    }
}

#[async_trait]
impl StatusChecker for ExecutedChecker {
    async fn check(
        &self,
        records: Vec<TxRecord>,
        _network: &Network,
    ) -> Result<Option<TxStatus>, TrackerError> {
        self.0.check_executed(records).await
    }
}

#[async_trait]
impl StatusChecker for ConfirmedChecker {
    async fn check(
        &self,
        records: Vec<TxRecord>,
        _network: &Network,
    ) -> Result<Option<TxStatus>, TrackerError> {
        self.0.check_confirmed(records).await
    }
}

#[async_trait]
impl StatusChecker for TempReplacedChecker {
    async fn check(
        &self,
        records: Vec<TxRecord>,
        _network: &Network,
    ) -> Result<Option<TxStatus>, TrackerError> {
        self.0.check_temp_replaced(records).await
    }
}

fn pending_immediately(status: TxStatus) -> bool {
    matches!(
        status,
        TxStatus::Executed | TxStatus::Confirmed | TxStatus::Finalized
    )
}

fn executed_immediately(status: TxStatus) -> bool {
    matches!(status, TxStatus::Confirmed | TxStatus::Finalized)
}

fn confirmed_immediately(status: TxStatus) -> bool {
    status == TxStatus::Finalized
}

fn temp_replaced_immediately(status: TxStatus) -> bool {
    status != TxStatus::TempReplaced
}

/// The transaction lifecycle tracker for one network.
///
/// Owns the four polling buckets and the nonce cache; all collaborators
/// (store, RPC gateway, asset refresher) are injected at construction.
pub struct TxTracker {
    core: Arc<Core>,
    pending: Polling,
    executed: Polling,
    confirmed: Polling,
    temp_replaced: Polling,
    current: Mutex<Option<AccountAddress>>,
}

impl TxTracker {
    pub fn new(
        store: Arc<dyn TxStore>,
        gateway: Arc<dyn RpcGateway>,
        network: Network,
        config: TrackerConfig,
        refresher: Arc<dyn AssetRefresher>,
    ) -> Self {
        let core = Arc::new(Core {
            rules: ChainRules::new(network.kind, &config),
            nonce_cache: Arc::new(NonceCache::new()),
            prefix: network.kind.as_str(),
            store: Arc::clone(&store),
            gateway,
            config: config.clone(),
            refresher,
        });
        let pending = Polling::new(
            PollingSpec {
                key: "pending",
                statuses: &[TxStatus::Pending],
                interval: config.pending_interval(),
                start_next_immediately: pending_immediately,
            },
            Arc::clone(&store),
            network.clone(),
            Arc::new(PendingChecker(Arc::clone(&core))),
        );
        let executed = Polling::new(
            PollingSpec {
                key: "executed",
                statuses: &[TxStatus::Executed],
                interval: config.executed_interval(),
                start_next_immediately: executed_immediately,
            },
            Arc::clone(&store),
            network.clone(),
            Arc::new(ExecutedChecker(Arc::clone(&core))),
        );
        let confirmed = Polling::new(
            PollingSpec {
                key: "confirmed",
                statuses: &[TxStatus::Confirmed],
                interval: config.confirmed_interval(),
                start_next_immediately: confirmed_immediately,
            },
            Arc::clone(&store),
            network.clone(),
            Arc::new(ConfirmedChecker(Arc::clone(&core))),
        );
        let temp_replaced = Polling::new(
            PollingSpec {
                key: "temp_replaced",
                statuses: &[TxStatus::TempReplaced],
                interval: config.confirmed_interval(),
                start_next_immediately: temp_replaced_immediately,
            },
            Arc::clone(&store),
            network,
            Arc::new(TempReplacedChecker(Arc::clone(&core))),
        );
        Self {
            core,
            pending,
            executed,
            confirmed,
            temp_replaced,
            current: Mutex::new(None),
        }
    }

    /// The per-session nonce cache, shared with the broadcast pipeline so
    /// it can stage ahead-of-nonce transactions as Waiting.
    pub fn nonce_cache(&self) -> Arc<NonceCache> {
        Arc::clone(&self.core.nonce_cache)
    }

    /// Start tracking for `owner`: all four buckets subscribe and poll.
    pub fn startup(&self, owner: &AccountAddress) {
        tracing::info!(tracker = self.core.prefix, owner = %owner, "tracker startup");
        *self.current.lock().unwrap() = Some(owner.clone());
        self.pending.startup(owner);
        self.executed.startup(owner);
        self.confirmed.startup(owner);
        self.temp_replaced.startup(owner);
    }

    /// Stop tracking and tear down all subscriptions. Idempotent.
    pub fn cleanup(&self) {
        tracing::info!(tracker = self.core.prefix, "tracker cleanup");
        *self.current.lock().unwrap() = None;
        self.pending.cleanup();
        self.executed.cleanup();
        self.confirmed.cleanup();
        self.temp_replaced.cleanup();
    }

    /// A new network next-nonce was observed: remember it and promote any
    /// Waiting records that became reachable. Returns the promotion count.
    pub fn handle_waiting_tx(
        &self,
        owner: &AccountAddress,
        next_nonce: u64,
    ) -> Result<usize, TrackerError> {
        self.core.nonce_cache.observe(owner, next_nonce);
        self.core.promote_waiting(owner, next_nonce)
    }

    /// Wire the tracker (and the broadcast pipeline) to the event bus:
    /// address switches restart the pollers, next-nonce events promote
    /// waiting records, broadcast events become tracked records.
    pub fn spawn_event_loop(
        self: &Arc<Self>,
        bus: &EventBus,
        pipeline: Arc<BroadcastPipeline>,
    ) -> JoinHandle<()> {
        let tracker = Arc::clone(self);
        let mut address_rx = bus.watch_current_address();
        let mut nonce_rx = bus.subscribe_next_nonce();
        let mut broadcast_rx = bus.subscribe_broadcast();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = address_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let selected = address_rx.borrow_and_update().clone();
                        match selected {
                            Some(owner) => tracker.startup(&owner),
                            None => tracker.cleanup(),
                        }
                    }
                    event = nonce_rx.recv() => {
                        match event {
                            Ok(event) => {
                                if let Err(error) =
                                    tracker.handle_waiting_tx(&event.owner, event.next_nonce)
                                {
                                    tracing::warn!(%error, "waiting promotion failed");
                                }
                            }
                            Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                                tracing::warn!(skipped, "next-nonce events lagged");
                            }
                            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                        }
                    }
                    event = broadcast_rx.recv() => {
                        match event {
                            Ok(event) => {
                                if let Err(error) = pipeline.register(event) {
                                    tracing::error!(%error, "broadcast registration failed");
                                }
                            }
                            Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                                tracing::warn!(skipped, "broadcast events lagged");
                            }
                            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                        }
                    }
                }
            }
            tracker.cleanup();
        })
    }

    // Direct access to the bucket checks, mainly for tests that want to
    // drive ticks deterministically instead of waiting on timers.

    pub async fn check_pending_status(
        &self,
        records: Vec<TxRecord>,
    ) -> Result<Option<TxStatus>, TrackerError> {
        self.core.check_pending(records).await
    }

    pub async fn check_executed_status(
        &self,
        records: Vec<TxRecord>,
    ) -> Result<Option<TxStatus>, TrackerError> {
        self.core.check_executed(records).await
    }

    pub async fn check_confirmed_status(
        &self,
        records: Vec<TxRecord>,
    ) -> Result<Option<TxStatus>, TrackerError> {
        self.core.check_confirmed(records).await
    }

    pub async fn check_temp_replaced_status(
        &self,
        records: Vec<TxRecord>,
    ) -> Result<Option<TxStatus>, TrackerError> {
        self.core.check_temp_replaced(records).await
    }
}
