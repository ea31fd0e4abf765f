//! Signing-service seam.
//!
//! Key derivation and storage are out of scope for this workspace; the host
//! app brings its own signer (software keys, secure element, hardware
//! wallet). The tracker only needs the trait: unsigned fields in, raw
//! signed bytes out, with user cancellation distinguishable from failure —
//! a cancelled signature must never produce a tracked record.

use async_trait::async_trait;
use thiserror::Error;
use vela_store::TxPayload;
use vela_types::TxHash;

/// Where the signing key comes from.
#[derive(Clone, Debug)]
pub enum KeySource {
    /// A decrypted private key held by the host app.
    PrivateKey(Vec<u8>),
    /// An index into a secure element / hardware device slot. Signing may
    /// involve a device round trip and can take arbitrarily long.
    SecureElement { index: u32 },
}

/// A signed transaction ready for broadcast.
#[derive(Clone, Debug)]
pub struct SignedTx {
    /// Serialized signed bytes, as `send_raw_transaction` expects them.
    pub raw: Vec<u8>,
    /// The transaction hash, derivable locally from the signed bytes.
    pub hash: TxHash,
}

#[derive(Debug, Error)]
pub enum SignerError {
    /// The user declined to sign. Callers must not create a record.
    #[error("signing cancelled by user")]
    Cancelled,

    #[error("signing device error: {0}")]
    Device(String),

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("signing failed: {0}")]
    Failed(String),
}

impl SignerError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Produces raw signed transaction bytes from unsigned fields.
#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign(&self, payload: &TxPayload, key: &KeySource) -> Result<SignedTx, SignerError>;
}
