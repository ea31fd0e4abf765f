//! Account address type.
//!
//! Addresses are kept in their chain-native string encoding (0x-hex for
//! EVM chains, base32 for Conflux Core) so they can be passed straight
//! through to RPC endpoints without re-encoding.

use crate::TypeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An account address in chain-native string form.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountAddress(String);

impl AccountAddress {
    /// Wrap an address string. Rejects empty input and embedded whitespace;
    /// full checksum validation is the responsibility of the host app.
    pub fn new(addr: impl Into<String>) -> Result<Self, TypeError> {
        let addr = addr.into();
        if addr.is_empty() || addr.chars().any(char::is_whitespace) {
            return Err(TypeError::InvalidAddress(addr));
        }
        Ok(Self(addr))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Truncate by chars: the address may not be pure ASCII.
        let head: String = self.0.chars().take(10).collect();
        write!(f, "AccountAddress({head}…)")
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_hex_and_base32_forms() {
        assert!(AccountAddress::new("0xab5801a7d398351b8be11c439e05c5b3259aec9b").is_ok());
        assert!(AccountAddress::new("cfx:aak2rra2njvd77ezwjvx04kkds9fzagfe6ku8scz91").is_ok());
    }

    #[test]
    fn rejects_empty_and_whitespace() {
        assert!(AccountAddress::new("").is_err());
        assert!(AccountAddress::new("0xab cd").is_err());
    }

    #[test]
    fn debug_truncates_on_char_boundaries() {
        let hex = AccountAddress::new("0xab5801a7d398351b8be11c439e05c5b3259aec9b").unwrap();
        assert_eq!(format!("{hex:?}"), "AccountAddress(0xab5801a7…)");

        // Multi-byte input must not panic mid-codepoint.
        let wide = AccountAddress::new("アカウントアドレス〇一二三四").unwrap();
        assert!(format!("{wide:?}").contains("アカウントアドレス〇"));
    }
}
