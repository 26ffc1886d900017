use crate::Error;
use blst::min_pk as blst_core;
use std::fmt;
use std::hash::{Hash, Hasher};

/// The byte-length of a compressed BLS12-381 G1 point.
pub const PUBLIC_KEY_BYTES_LEN: usize = 48;

/// A BLS12-381 public key.
#[derive(Clone)]
pub struct PublicKey(blst_core::PublicKey);

impl PublicKey {
    pub(crate) fn from_point(point: blst_core::PublicKey) -> Self {
        Self(point)
    }

    /// Serialize `self` as a compressed point.
    pub fn serialize(&self) -> [u8; PUBLIC_KEY_BYTES_LEN] {
        self.0.compress()
    }

    /// Instantiate `self` from a compressed point, validating that it lies in
    /// the G1 subgroup.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != PUBLIC_KEY_BYTES_LEN {
            return Err(Error::InvalidByteLength {
                got: bytes.len(),
                expected: PUBLIC_KEY_BYTES_LEN,
            });
        }

        blst_core::PublicKey::key_validate(bytes)
            .map(Self)
            .map_err(Into::into)
    }

    /// Returns `self` as a `0x`-prefixed hex string.
    pub fn to_hex_string(&self) -> String {
        format!("0x{}", hex::encode(self.serialize()))
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.serialize()[..] == other.serialize()[..]
    }
}

impl Eq for PublicKey {}

impl Hash for PublicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.serialize().hash(state)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex_string())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex_string())
    }
}
