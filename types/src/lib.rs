//! Fundamental types for the Vela wallet core.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: account addresses, transaction hashes, timestamps, network
//! descriptors, transaction lifecycle statuses, and chain receipts.

pub mod address;
pub mod error;
pub mod hash;
pub mod network;
pub mod receipt;
pub mod status;
pub mod time;

pub use address::AccountAddress;
pub use error::TypeError;
pub use hash::TxHash;
pub use network::{ChainKind, Network};
pub use receipt::Receipt;
pub use status::{ExecutedStatus, TxErrorKind, TxStatus};
pub use time::Timestamp;
