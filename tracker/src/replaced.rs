//! Replacement detection primitives.
//!
//! When a user speeds up or cancels a transaction, two broadcasts compete
//! for one nonce slot; only one can be included. [`ReplacedResponse`] is
//! the verdict of one detection round; [`NonceCache`] short-circuits the
//! nonce RPC when the answer is already known from this tracking session.

use std::collections::HashMap;
use std::sync::Mutex;
use vela_types::AccountAddress;

/// Outcome of one replacement-detection round for a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplacedResponse {
    /// The record's nonce has not been consumed on chain.
    NotReplaced,
    /// The nonce was consumed by a *different* transaction.
    Replaced,
    /// The nonce was consumed by this very transaction — it won the slot.
    Executed,
}

/// Per-address last-observed network nonce.
///
/// Monotonic: an observation only sticks if it is strictly larger than the
/// cached value, so a lagging RPC endpoint can never regress the
/// short-circuit. One instance is shared per tracking session.
#[derive(Default)]
pub struct NonceCache {
    map: Mutex<HashMap<AccountAddress, u64>>,
}

impl NonceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an observed next-nonce. Returns whether the cache advanced.
    pub fn observe(&self, owner: &AccountAddress, nonce: u64) -> bool {
        let mut map = self.map.lock().unwrap();
        match map.get_mut(owner) {
            Some(current) if *current >= nonce => false,
            Some(current) => {
                *current = nonce;
                true
            }
            None => {
                map.insert(owner.clone(), nonce);
                true
            }
        }
    }

    /// Last observed next-nonce for `owner`, if any.
    pub fn get(&self, owner: &AccountAddress) -> Option<u64> {
        self.map.lock().unwrap().get(owner).copied()
    }

    /// Whether the cached nonce already proves `nonce` was consumed
    /// (cached next-nonce strictly greater). `false` means "unknown", not
    /// "unused" — callers must then ask the network.
    pub fn proves_used(&self, owner: &AccountAddress, nonce: u64) -> bool {
        self.get(owner).map(|next| next > nonce).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> AccountAddress {
        AccountAddress::new(s).unwrap()
    }

    #[test]
    fn observations_are_monotonic() {
        let cache = NonceCache::new();
        let owner = addr("0xaaaa");
        assert!(cache.observe(&owner, 5));
        assert!(!cache.observe(&owner, 3));
        assert!(!cache.observe(&owner, 5));
        assert_eq!(cache.get(&owner), Some(5));
        assert!(cache.observe(&owner, 6));
        assert_eq!(cache.get(&owner), Some(6));
    }

    #[test]
    fn proof_of_use_is_strict() {
        let cache = NonceCache::new();
        let owner = addr("0xaaaa");
        assert!(!cache.proves_used(&owner, 4));
        cache.observe(&owner, 5);
        // Next nonce 5 proves 0..=4 used, not 5 itself.
        assert!(cache.proves_used(&owner, 4));
        assert!(!cache.proves_used(&owner, 5));
    }
}
