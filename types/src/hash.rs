//! Transaction hash type.

use crate::TypeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte transaction hash, carried in 0x-prefixed hex form as the
/// chain RPC reports it.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHash(String);

impl TxHash {
    /// Parse a 0x-prefixed 64-nibble hex hash.
    pub fn new(hash: impl Into<String>) -> Result<Self, TypeError> {
        let hash = hash.into();
        let hex_part = hash
            .strip_prefix("0x")
            .ok_or_else(|| TypeError::InvalidHash(hash.clone()))?;
        if hex_part.len() != 64 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidHash(hash));
        }
        Ok(Self(hash.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Raw 32 bytes of the hash.
    pub fn to_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        // Validated in `new`, cannot fail.
        if let Ok(bytes) = hex::decode(&self.0[2..]) {
            out.copy_from_slice(&bytes);
        }
        out
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({}…)", &self.0[..10])
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_hash() {
        let h = TxHash::new(
            "0x77C7ca865d581f5c5a0d0e14a55e38be4e4b4e7fdfab0b0b7cd3a1517e47bfca",
        )
        .unwrap();
        // Normalized to lowercase.
        assert!(h.as_str().starts_with("0x77c7"));
        assert_eq!(h.to_bytes()[0], 0x77);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(TxHash::new("77c7").is_err());
        assert!(TxHash::new("0x1234").is_err());
        assert!(TxHash::new(
            "0xzzc7ca865d581f5c5a0d0e14a55e38be4e4b4e7fdfab0b0b7cd3a1517e47bfca"
        )
        .is_err());
    }
}
