//! Nullable signer — deterministic signatures without key material.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use vela_signer::{KeySource, SignedTx, Signer, SignerError};
use vela_store::TxPayload;
use vela_types::TxHash;

/// A test signer producing deterministic fake signed bytes.
///
/// Can be switched into "user cancels" mode to exercise the
/// cancellation path.
pub struct NullSigner {
    cancel: AtomicBool,
}

impl NullSigner {
    pub fn new() -> Self {
        Self {
            cancel: AtomicBool::new(false),
        }
    }

    /// Make subsequent sign calls report user cancellation.
    pub fn set_cancel(&self, on: bool) {
        self.cancel.store(on, Ordering::SeqCst);
    }
}

impl Default for NullSigner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Signer for NullSigner {
    async fn sign(&self, payload: &TxPayload, _key: &KeySource) -> Result<SignedTx, SignerError> {
        if self.cancel.load(Ordering::SeqCst) {
            return Err(SignerError::Cancelled);
        }
        // Deterministic bytes: nonce + chain id keyed into the payload.
        let mut raw = vec![0xf8];
        raw.extend_from_slice(&payload.nonce.to_be_bytes());
        raw.extend_from_slice(&payload.chain_id.to_be_bytes());
        let mut bytes = [0u8; 32];
        for (i, b) in raw.iter().enumerate() {
            bytes[i % 32] ^= *b;
        }
        let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        Ok(SignedTx {
            raw,
            hash: TxHash::new(format!("0x{hex}")).expect("valid hex"),
        })
    }
}
