//! Base58 address validation shared by every wallet/mint field in the data model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

const MIN_LEN: usize = 32;
const MAX_LEN: usize = 44;

/// A validated base58 Solana address (wallet or mint). Construction is the only
/// place length/alphabet are checked; once built, an `Address` is known-good.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_address(s)?;
        Ok(Address(s.to_string()))
    }
}

impl TryFrom<String> for Address {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        validate_address(&s)?;
        Ok(Address(s))
    }
}

impl TryFrom<&str> for Address {
    type Error = CoreError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Address> for String {
    fn from(a: Address) -> String {
        a.0
    }
}

/// 32–44 chars over the base58 alphabet that excludes `0`, `O`, `I`, `l`.
pub fn validate_address(s: &str) -> Result<(), CoreError> {
    if s.len() < MIN_LEN || s.len() > MAX_LEN {
        return Err(CoreError::InvalidAddress(format!(
            "length {} not in [{}, {}]",
            s.len(),
            MIN_LEN,
            MAX_LEN
        )));
    }
    if !s.bytes().all(is_base58_byte) {
        return Err(CoreError::InvalidAddress(
            "contains non-base58 characters".to_string(),
        ));
    }
    Ok(())
}

fn is_base58_byte(b: u8) -> bool {
    matches!(b,
        b'1'..=b'9'
        | b'A'..=b'H' | b'J'..=b'N' | b'P'..=b'Z'
        | b'a'..=b'k' | b'm'..=b'z'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_sample() -> String {
        // 44 chars, all within the allowed alphabet.
        "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin".chars().take(44).collect()
    }

    #[test]
    fn accepts_well_formed_address() {
        let s = valid_sample();
        assert!(Address::from_str(&s).is_ok());
    }

    #[test]
    fn rejects_too_short() {
        assert!(validate_address("abc").is_err());
    }

    #[test]
    fn rejects_too_long() {
        let s = "a".repeat(45);
        assert!(validate_address(&s).is_err());
    }

    #[test]
    fn rejects_excluded_characters() {
        for bad in ['0', 'O', 'I', 'l'] {
            let mut s = "1".repeat(32);
            s.replace_range(0..1, &bad.to_string());
            assert!(validate_address(&s).is_err(), "{bad} should be rejected");
        }
    }
}
