//! Network descriptors.

use serde::{Deserialize, Serialize};

/// The family of chain a network belongs to.
///
/// Selects RPC method names, receipt interpretation, and confirmation
/// counting rules. Chain-specific behavior lives behind this tag rather
/// than behind per-chain subclasses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainKind {
    /// Ethereum-like chains (block-number based confirmation).
    Evm,
    /// Conflux Core space (epoch based, transactions carry a validity window).
    ConfluxCore,
}

impl ChainKind {
    /// Human-readable name, used as the tracker log prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Evm => "evm",
            Self::ConfluxCore => "cfx",
        }
    }
}

/// A chain network the wallet can track transactions on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    /// Display name, e.g. "Conflux eSpace".
    pub name: String,
    /// JSON-RPC endpoint URL.
    pub endpoint: String,
    /// Numeric chain id as the chain reports it.
    pub chain_id: u64,
    /// Chain family.
    pub kind: ChainKind,
}

impl Network {
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        chain_id: u64,
        kind: ChainKind,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            chain_id,
            kind,
        }
    }
}
