use crate::{Error, PublicKey, ZeroizeHash};
use blst::min_pk as blst_core;
use rand::RngCore;
use std::fmt;

/// The byte-length of a BLS12-381 secret scalar.
pub const SECRET_KEY_BYTES_LEN: usize = 32;

/// A BLS12-381 secret key.
///
/// The underlying `blst` scalar is zeroized on drop. Extreme care should be
/// taken not to leak the bytes returned by `serialize`.
#[derive(Clone)]
pub struct SecretKey(blst_core::SecretKey);

impl SecretKey {
    /// Generate a new `Self` from 32 bytes of OS entropy.
    pub fn random() -> Self {
        let mut ikm = [0u8; SECRET_KEY_BYTES_LEN];
        rand::thread_rng().fill_bytes(&mut ikm);
        Self(blst_core::SecretKey::key_gen(&ikm, &[]).expect("ikm is a fixed 32 bytes"))
    }

    /// Returns the public key that corresponds to `self`.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_point(self.0.sk_to_pk())
    }

    /// Instantiate `self` from a 32-byte big-endian scalar.
    ///
    /// Rejects byte strings of any other length and scalars that are not in
    /// the BLS12-381 group order.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != SECRET_KEY_BYTES_LEN {
            return Err(Error::InvalidSecretKeyLength {
                got: bytes.len(),
                expected: SECRET_KEY_BYTES_LEN,
            });
        }

        blst_core::SecretKey::from_bytes(bytes)
            .map(Self)
            .map_err(Into::into)
    }

    /// Returns the secret scalar, wrapped so it is zeroized on drop.
    pub fn serialize(&self) -> ZeroizeHash {
        self.0.to_bytes().into()
    }
}

impl fmt::Debug for SecretKey {
    /// Never print the secret, even via `{:?}`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey(...)")
    }
}
