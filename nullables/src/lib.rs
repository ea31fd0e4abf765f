//! Nullable infrastructure for deterministic testing.
//!
//! External dependencies of the tracker (chain RPC, signing) are abstracted
//! behind traits. This crate provides test-friendly implementations that:
//! - Return scripted, deterministic values
//! - Can be controlled programmatically mid-test
//! - Never touch the network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod gateway;
pub mod signer;

pub use gateway::NullGateway;
pub use signer::NullSigner;
