//! The JSON representation of an EIP-2335 keystore.
//!
//! The formats in this module are defined by the EIP; fields must not be
//! added, removed or renamed lightly. Files here **MUST NOT** contain any
//! logic beyond what is required to serialize/deserialize the data
//! structures; the crypto lives in `crate::keystore`.

mod checksum_module;
mod cipher_module;
mod hex_bytes;
mod kdf_module;

pub use checksum_module::{ChecksumModule, EmptyMap, Sha256Checksum};
pub use cipher_module::{Aes128Ctr, Cipher, CipherFunction, CipherModule};
pub use hex_bytes::HexBytes;
pub use kdf_module::{EmptyString, Kdf, KdfFunction, KdfModule, Pbkdf2, Prf, Scrypt};

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use uuid::Uuid;

/// JSON representation of an EIP-2335 keystore.
///
/// Top-level fields that are not consumed (e.g., `name` written by some other
/// clients) are ignored on read, per the EIP.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct JsonKeystore {
    pub crypto: Crypto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pubkey: Option<String>,
    pub path: String,
    pub uuid: Uuid,
    pub version: Version,
}

/// Crypto module for the keystore: key derivation, checksum and cipher.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Crypto {
    pub kdf: KdfModule,
    pub checksum: ChecksumModule,
    pub cipher: CipherModule,
}

/// Version of the keystore container. Only version 4 is defined by the EIP;
/// any other integer fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum Version {
    V4 = 4,
}

impl Version {
    pub fn four() -> Self {
        Version::V4
    }
}
