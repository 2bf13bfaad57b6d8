//! Fixed-width account identifiers
//!
//! Every account, including the ledger itself, is addressed by 20 bytes.
//! The text form is `0x` followed by 40 lowercase hex digits.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::crypto::sha256;

/// Address length in bytes
pub const ADDRESS_LEN: usize = 20;

/// Address parsing errors
#[derive(Error, Debug, PartialEq)]
pub enum AddressError {
    #[error("Invalid address length: expected 40 hex digits, got {0}")]
    InvalidLength(usize),
    #[error("Invalid hex in address: {0}")]
    InvalidHex(String),
}

/// A 20-byte account identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// The zero address (no account)
    pub const ZERO: Address = Address([0u8; ADDRESS_LEN]);

    /// Wrap raw bytes
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Build an address from the first 20 bytes of a digest
    pub fn from_digest(digest: &[u8]) -> Self {
        let mut bytes = [0u8; ADDRESS_LEN];
        let len = digest.len().min(ADDRESS_LEN);
        bytes[..len].copy_from_slice(&digest[..len]);
        Self(bytes)
    }

    /// Derive a contract address from its deployer and a deployment nonce
    pub fn for_contract(deployer: &Address, nonce: u64) -> Self {
        let input = format!("{}:{}", deployer, nonce);
        Self::from_digest(&sha256(input.as_bytes()))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);

        if digits.len() != ADDRESS_LEN * 2 {
            return Err(AddressError::InvalidLength(digits.len()));
        }

        let mut bytes = [0u8; ADDRESS_LEN];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| AddressError::InvalidHex(s.to_string()))?;
        Ok(Self(bytes))
    }
}

// Serialized as the hex string so it can key JSON maps.
impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_display_and_parse() {
        let addr = Address::new([0xab; ADDRESS_LEN]);
        let text = addr.to_string();

        assert_eq!(text.len(), 42);
        assert!(text.starts_with("0xabab"));
        assert_eq!(text.parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn test_parse_without_prefix_and_uppercase() {
        let lower: Address = "0x00000000000000000000000000000000000000ff".parse().unwrap();
        let upper: Address = "00000000000000000000000000000000000000FF".parse().unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(
            "0x1234".parse::<Address>(),
            Err(AddressError::InvalidLength(4))
        );
        assert!(matches!(
            "0xzz00000000000000000000000000000000000000".parse::<Address>(),
            Err(AddressError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_zero_address() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address::new([1; ADDRESS_LEN]).is_zero());
        assert_eq!(
            Address::ZERO.to_string(),
            "0x0000000000000000000000000000000000000000"
        );
    }

    #[test]
    fn test_contract_address_depends_on_nonce() {
        let deployer = Address::new([7; ADDRESS_LEN]);
        let first = Address::for_contract(&deployer, 0);
        let second = Address::for_contract(&deployer, 1);

        assert_ne!(first, second);
        assert_eq!(first, Address::for_contract(&deployer, 0));
    }

    #[test]
    fn test_serde_as_map_key() {
        let mut map = HashMap::new();
        map.insert(Address::new([3; ADDRESS_LEN]), 42u128);

        let json = serde_json::to_string(&map).unwrap();
        assert!(json.contains("0x0303"));

        let back: HashMap<Address, u128> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }
}
