//! Nullable RPC gateway — scripted chain state, no network.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use vela_rpc::{HeightTag, NonceTag, RpcError, RpcGateway};
use vela_types::{AccountAddress, Receipt, TxHash};

/// A scripted [`RpcGateway`] for tests.
///
/// Chain state (nonces, receipts, heights) is set programmatically; raw
/// broadcasts are recorded for assertions. Individual method families can
/// be switched into timeout mode to exercise the transient-error paths.
pub struct NullGateway {
    nonces: Mutex<HashMap<(AccountAddress, NonceTag), u64>>,
    receipts: Mutex<HashMap<TxHash, Receipt>>,
    heights: Mutex<HashMap<HeightTag, u64>>,
    sent: Mutex<Vec<Vec<u8>>>,
    gas_price: Mutex<u128>,
    timeout_receipts: AtomicBool,
    timeout_nonces: AtomicBool,
    timeout_sends: AtomicBool,
    send_error: Mutex<Option<(i64, String)>>,
}

impl NullGateway {
    pub fn new() -> Self {
        Self {
            nonces: Mutex::new(HashMap::new()),
            receipts: Mutex::new(HashMap::new()),
            heights: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            gas_price: Mutex::new(1_000_000_000),
            timeout_receipts: AtomicBool::new(false),
            timeout_nonces: AtomicBool::new(false),
            timeout_sends: AtomicBool::new(false),
            send_error: Mutex::new(None),
        }
    }

    /// Script the next nonce for an address under both tags at once.
    pub fn set_nonce(&self, address: &AccountAddress, nonce: u64) {
        let mut nonces = self.nonces.lock().unwrap();
        nonces.insert((address.clone(), NonceTag::Pending), nonce);
        nonces.insert((address.clone(), NonceTag::Finalized), nonce);
    }

    /// Script the next nonce for one specific tag.
    pub fn set_nonce_tagged(&self, address: &AccountAddress, tag: NonceTag, nonce: u64) {
        self.nonces
            .lock()
            .unwrap()
            .insert((address.clone(), tag), nonce);
    }

    /// Script a receipt for a hash.
    pub fn set_receipt(&self, hash: TxHash, receipt: Receipt) {
        self.receipts.lock().unwrap().insert(hash, receipt);
    }

    pub fn clear_receipt(&self, hash: &TxHash) {
        self.receipts.lock().unwrap().remove(hash);
    }

    /// Script the chain height for a tag.
    pub fn set_height(&self, tag: HeightTag, height: u64) {
        self.heights.lock().unwrap().insert(tag, height);
    }

    /// Raw payloads "broadcast" so far (for assertions).
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Make receipt lookups time out until switched back.
    pub fn set_timeout_receipts(&self, on: bool) {
        self.timeout_receipts.store(on, Ordering::SeqCst);
    }

    /// Make nonce lookups time out until switched back.
    pub fn set_timeout_nonces(&self, on: bool) {
        self.timeout_nonces.store(on, Ordering::SeqCst);
    }

    /// Make raw broadcasts time out until switched back.
    pub fn set_timeout_sends(&self, on: bool) {
        self.timeout_sends.store(on, Ordering::SeqCst);
    }

    /// Make the next `send_raw_transaction` fail with an RPC error
    /// (e.g. -32003 "nonce too low").
    pub fn set_send_error(&self, code: i64, message: impl Into<String>) {
        *self.send_error.lock().unwrap() = Some((code, message.into()));
    }
}

impl Default for NullGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RpcGateway for NullGateway {
    async fn next_nonce(&self, address: &AccountAddress, tag: NonceTag) -> Result<u64, RpcError> {
        if self.timeout_nonces.load(Ordering::SeqCst) {
            return Err(RpcError::Timeout);
        }
        Ok(self
            .nonces
            .lock()
            .unwrap()
            .get(&(address.clone(), tag))
            .copied()
            .unwrap_or(0))
    }

    async fn transaction_receipt(&self, hash: &TxHash) -> Result<Option<Receipt>, RpcError> {
        if self.timeout_receipts.load(Ordering::SeqCst) {
            return Err(RpcError::Timeout);
        }
        Ok(self.receipts.lock().unwrap().get(hash).cloned())
    }

    async fn transaction_receipts(
        &self,
        hashes: &[TxHash],
    ) -> Result<Vec<Option<Receipt>>, RpcError> {
        if self.timeout_receipts.load(Ordering::SeqCst) {
            return Err(RpcError::Timeout);
        }
        let receipts = self.receipts.lock().unwrap();
        Ok(hashes.iter().map(|h| receipts.get(h).cloned()).collect())
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash, RpcError> {
        if self.timeout_sends.load(Ordering::SeqCst) {
            return Err(RpcError::Timeout);
        }
        if let Some((code, message)) = self.send_error.lock().unwrap().take() {
            return Err(RpcError::Rpc {
                code,
                message,
                data: None,
            });
        }
        self.sent.lock().unwrap().push(raw.to_vec());
        // Deterministic pseudo-hash from the payload bytes.
        let mut bytes = [0u8; 32];
        for (i, b) in raw.iter().enumerate() {
            bytes[i % 32] ^= *b;
        }
        let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        Ok(TxHash::new(format!("0x{hex}")).expect("valid hex"))
    }

    async fn chain_height(&self, tag: HeightTag) -> Result<u64, RpcError> {
        Ok(self.heights.lock().unwrap().get(&tag).copied().unwrap_or(0))
    }

    async fn gas_price(&self) -> Result<u128, RpcError> {
        Ok(*self.gas_price.lock().unwrap())
    }

    async fn estimate_gas(&self, _call: serde_json::Value) -> Result<u128, RpcError> {
        Ok(21_000)
    }
}
