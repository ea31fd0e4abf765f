//! Transaction record model and abstract store traits.
//!
//! The wallet host supplies a durable backend (SQLite, WatermelonDB bridge,
//! whatever the platform offers) implementing [`TxStore`]. The rest of the
//! workspace depends only on the trait. [`memory::MemoryTxStore`] is a
//! complete in-memory reference backend used by the tracker tests and by
//! hosts that do not need durability.

pub mod error;
pub mod extra;
pub mod memory;
pub mod payload;
pub mod tx;

use tokio::sync::watch;
use vela_types::{AccountAddress, TxStatus};

pub use error::StoreError;
pub use extra::TxExtra;
pub use memory::MemoryTxStore;
pub use payload::TxPayload;
pub use tx::{NewTrackedTx, TxId, TxRecord};

/// Abstract transaction record storage.
///
/// All mutation goes through [`TxStore::update`], which applies the mutation
/// function under the backend's transaction so partially-updated records are
/// never observable. Queries return records newest-first (descending id).
pub trait TxStore: Send + Sync {
    /// Atomically persist a new tracked transaction with its payload and
    /// extra classification. Returns the assigned record id; ids are
    /// monotonically increasing and double as a local creation sequence.
    fn create_tracked(&self, new_tx: NewTrackedTx) -> Result<TxId, StoreError>;

    /// Fetch a record by id.
    fn get(&self, id: TxId) -> Result<TxRecord, StoreError>;

    /// Apply `mutate` to the record transactionally and return the updated
    /// record. Observers never see intermediate state.
    fn update(
        &self,
        id: TxId,
        mutate: &mut dyn FnMut(&mut TxRecord),
    ) -> Result<TxRecord, StoreError>;

    /// All records owned by `owner` whose status is in `statuses`,
    /// newest-first.
    fn query_by_address(
        &self,
        owner: &AccountAddress,
        statuses: &[TxStatus],
    ) -> Result<Vec<TxRecord>, StoreError>;

    /// Records sharing (owner, nonce) with status in `statuses`, excluding
    /// `exclude`, newest-first. Used by replacement/duplicate detection.
    fn query_same_nonce(
        &self,
        owner: &AccountAddress,
        nonce: u64,
        statuses: &[TxStatus],
        exclude: TxId,
    ) -> Result<Vec<TxRecord>, StoreError>;

    /// Count of records matching (owner, statuses).
    fn count(&self, owner: &AccountAddress, statuses: &[TxStatus]) -> Result<u64, StoreError>;

    /// Reactive observation of [`TxStore::count`]: the receiver is updated
    /// after every committed mutation that changes the count.
    fn subscribe_count(
        &self,
        owner: &AccountAddress,
        statuses: &[TxStatus],
    ) -> watch::Receiver<u64>;

    /// The payload the record was created with.
    fn payload_of(&self, id: TxId) -> Result<TxPayload, StoreError>;

    /// The extra classification the record was created with.
    fn extra_of(&self, id: TxId) -> Result<TxExtra, StoreError>;
}
