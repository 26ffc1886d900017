use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// A byte string that serializes as unprefixed hex.
///
/// Decoding accepts both character cases and fails on non-hex characters or
/// an odd number of digits. Field *lengths* are contractual and checked by
/// the consumer, not here.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexBytes(Vec<u8>);

impl HexBytes {
    pub fn empty() -> Self {
        Self(vec![])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for HexBytes {
    fn from(vec: Vec<u8>) -> Self {
        Self(vec)
    }
}

impl Into<String> for HexBytes {
    fn into(self) -> String {
        hex::encode(self.0)
    }
}

impl TryFrom<String> for HexBytes {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        hex::decode(s)
            .map(Self)
            .map_err(|e| format!("Invalid hex: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upper_and_lower_case_decode_identically() {
        let lower = HexBytes::try_from("0fca".to_string()).unwrap();
        let upper = HexBytes::try_from("0FCA".to_string()).unwrap();
        assert_eq!(lower, upper);
        assert_eq!(lower.as_bytes(), &[0x0f, 0xca]);
    }

    #[test]
    fn odd_length_is_rejected() {
        assert!(HexBytes::try_from("fca".to_string()).is_err());
    }

    #[test]
    fn non_hex_is_rejected() {
        assert!(HexBytes::try_from("0xzz".to_string()).is_err());
    }
}
