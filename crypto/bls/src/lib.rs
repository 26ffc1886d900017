//! A minimal BLS12-381 library, backed by the `blst` bindings to the
//! supranational BLS library.
//!
//! Only the operations required for validator key management are exposed:
//! secret-key recovery from bytes, public-key derivation and (de)serialization
//! of compressed points. Signing and aggregation live elsewhere.

mod keypair;
mod public_key;
mod secret_key;
mod zeroize_hash;

pub use keypair::Keypair;
pub use public_key::{PublicKey, PUBLIC_KEY_BYTES_LEN};
pub use secret_key::{SecretKey, SECRET_KEY_BYTES_LEN};
pub use zeroize_hash::ZeroizeHash;

use blst::BLST_ERROR;

#[derive(Debug, PartialEq, Clone)]
pub enum Error {
    /// An error was raised from the underlying BLS library.
    BlstError(BLST_ERROR),
    /// The provided bytes were an incorrect length.
    InvalidByteLength { got: usize, expected: usize },
    /// The provided secret key bytes were an incorrect length.
    InvalidSecretKeyLength { got: usize, expected: usize },
}

impl From<BLST_ERROR> for Error {
    fn from(e: BLST_ERROR) -> Error {
        Error::BlstError(e)
    }
}
