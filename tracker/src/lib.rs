//! Transaction lifecycle tracker.
//!
//! The core of the wallet: submits signed transactions, polls chain
//! endpoints for their confirmation through the status state machine,
//! detects nonce collisions and replacements, resends on timeout, and keeps
//! the local transaction store converged with on-chain truth.
//!
//! Components:
//! - [`polling::Polling`] — generic count-gated interval polling per
//!   status bucket
//! - [`tracker::TxTracker`] — the orchestrator wiring four polling buckets
//!   (pending / executed / confirmed / temp-replaced) to chain-aware checks
//! - [`replaced`] — the replacement/duplicate detection protocol
//! - [`chain::ChainRules`] — per-chain-family confirmation and validity
//!   rules
//! - [`pipeline::BroadcastPipeline`] — the single entry point turning a
//!   broadcast event into durable tracked state
//! - [`send::SendFlow`] — sign / broadcast / persist for outbound
//!   transactions

pub mod chain;
pub mod config;
pub mod consts;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod polling;
pub mod replaced;
pub mod send;
pub mod tracker;

pub use chain::ChainRules;
pub use config::TrackerConfig;
pub use error::TrackerError;
pub use pipeline::BroadcastPipeline;
pub use polling::{Polling, PollingSpec, StatusChecker};
pub use replaced::{NonceCache, ReplacedResponse};
pub use send::SendFlow;
pub use tracker::{AssetRefresher, NoopRefresher, TxTracker};
