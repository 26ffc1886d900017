//! Provides a [`Keystore`] that can encrypt a BLS secret key into an
//! EIP-2335 JSON container and recover it again, given the correct password.

use crate::derived_key::DerivedKey;
use crate::json_keystore::{
    Aes128Ctr, ChecksumModule, Cipher, CipherFunction, CipherModule, Crypto, EmptyString,
    JsonKeystore, Kdf, KdfModule, Prf, Scrypt, Version,
};
use crate::plain_text::PlainText;
use aes::cipher::{generic_array::GenericArray, NewCipher, StreamCipher};
use aes::Aes128Ctr as AesCtr;
use bls::{Keypair, SecretKey};
use hmac::Hmac;
use pbkdf2::pbkdf2;
use rand::prelude::*;
use scrypt::{scrypt, Params as ScryptParams};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::str;
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

/// The byte length of the decrypted BLS secret key.
const SECRET_KEY_LEN: usize = 32;
/// The salt length required to seed the KDF.
pub const SALT_SIZE: usize = 32;
/// The length of the derived key.
pub const DKLEN: u32 = 32;
/// The byte size of a SHA256 digest, i.e., the checksum message.
pub const HASH_SIZE: usize = 32;
/// The byte size of the AES-128-CTR initialization vector.
pub const IV_SIZE: usize = 16;

#[derive(Debug, PartialEq)]
pub enum Error {
    InvalidSecretKeyLen { len: usize, expected: usize },
    InvalidPassword,
    InvalidSecretKeyBytes(bls::Error),
    PublicKeyMismatch,
    InvalidPublicKeyHex(String),
    EmptyPassword,
    UnsupportedPath(String),
    UnableToSerialize(String),
    InvalidJson(String),
    WriteError(String),
    ReadError(String),
    InvalidPbkdf2Param,
    InvalidScryptParam,
    InvalidSaltLength,
    IncorrectIvSize { expected: usize, len: usize },
    IncorrectChecksumSize { expected: usize, len: usize },
}

/// Constructs a `Keystore`.
pub struct KeystoreBuilder<'a> {
    keypair: &'a Keypair,
    password: &'a [u8],
    kdf: Kdf,
    cipher: Cipher,
    uuid: Uuid,
    path: String,
}

impl<'a> KeystoreBuilder<'a> {
    /// Creates a new builder with a fresh salt, IV and UUID.
    ///
    /// ## Errors
    ///
    /// Returns `Error::EmptyPassword` if `password == ""`.
    pub fn new(keypair: &'a Keypair, password: &'a [u8], path: String) -> Result<Self, Error> {
        if password.is_empty() {
            Err(Error::EmptyPassword)
        } else {
            let salt = rand::thread_rng().gen::<[u8; SALT_SIZE]>();
            let iv = rand::thread_rng().gen::<[u8; IV_SIZE]>().to_vec();

            Ok(Self {
                keypair,
                password,
                kdf: default_kdf(salt.to_vec()),
                cipher: Cipher::Aes128Ctr(Aes128Ctr { iv: iv.into() }),
                uuid: Uuid::new_v4(),
                path,
            })
        }
    }

    /// Build the keystore using the supplied `kdf` instead of `default_kdf`.
    pub fn kdf(mut self, kdf: Kdf) -> Self {
        self.kdf = kdf;
        self
    }

    /// Consumes `self`, returning a `Keystore`.
    pub fn build(self) -> Result<Keystore, Error> {
        let secret = self.keypair.sk.serialize();

        let crypto = encrypt(secret.as_bytes(), self.password, &self.kdf, &self.cipher)?;

        Ok(Keystore {
            json: JsonKeystore {
                crypto,
                description: None,
                pubkey: Some(hex::encode(self.keypair.pk.serialize())),
                path: self.path,
                uuid: self.uuid,
                version: Version::four(),
            },
        })
    }
}

/// Provides a BLS keystore as defined in [EIP-2335].
///
/// Use `KeystoreBuilder` to create a new keystore.
///
/// [EIP-2335]: https://eips.ethereum.org/EIPS/eip-2335
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Keystore {
    json: JsonKeystore,
}

impl Keystore {
    /// Regenerates the keypair from `self` and the correct password.
    ///
    /// ## Errors
    ///
    /// - The provided password is incorrect.
    /// - The keystore is badly formed.
    /// - The decrypted secret does not match the declared public key.
    pub fn decrypt_keypair(&self, password: &[u8]) -> Result<Keypair, Error> {
        // Hierarchical derivation paths are not supported; only keys stored at
        // the root of the tree can be unlocked.
        if !self.json.path.is_empty() {
            return Err(Error::UnsupportedPath(self.json.path.clone()));
        }

        let plain_text = decrypt(password, &self.json.crypto)?;

        // Verify that the decrypted secret is the correct length.
        if plain_text.len() != SECRET_KEY_LEN {
            return Err(Error::InvalidSecretKeyLen {
                len: plain_text.len(),
                expected: SECRET_KEY_LEN,
            });
        }

        let keypair = keypair_from_secret(plain_text.as_bytes())?;

        // If the container declares a public key, it must match the one derived
        // from the decrypted secret. A container without one adopts the derived
        // key.
        if let Some(declared) = &self.json.pubkey {
            let declared_bytes = hex::decode(declared)
                .map_err(|e| Error::InvalidPublicKeyHex(format!("{}", e)))?;
            if declared_bytes[..] != keypair.pk.serialize()[..] {
                return Err(Error::PublicKeyMismatch);
            }
        }

        Ok(keypair)
    }

    /// Returns the pubkey for the keystore, if declared.
    ///
    /// The keystore does not necessarily know the pubkey of its secret; a
    /// missing field is only resolved by decryption.
    pub fn pubkey(&self) -> Option<&str> {
        self.json.pubkey.as_deref()
    }

    /// Returns the key derivation function for the keystore.
    pub fn kdf(&self) -> &Kdf {
        &self.json.crypto.kdf.params
    }

    /// Returns the UUID for the keystore.
    pub fn uuid(&self) -> &Uuid {
        &self.json.uuid
    }

    /// Returns the derivation path for the keystore.
    pub fn path(&self) -> &str {
        &self.json.path
    }

    /// Returns the description for the keystore, if any.
    pub fn description(&self) -> Option<&str> {
        self.json.description.as_deref()
    }

    /// Encodes `self` as a JSON object.
    pub fn to_json_string(&self) -> Result<String, Error> {
        serde_json::to_string(self).map_err(|e| Error::UnableToSerialize(format!("{}", e)))
    }

    /// Returns `self` from an encoded JSON object.
    pub fn from_json_str(json_string: &str) -> Result<Self, Error> {
        serde_json::from_str(json_string).map_err(|e| Error::InvalidJson(format!("{}", e)))
    }

    /// Encodes self as a JSON object to the given `writer`.
    pub fn to_json_writer<W: Write>(&self, writer: W) -> Result<(), Error> {
        serde_json::to_writer(writer, self).map_err(|e| Error::WriteError(format!("{}", e)))
    }

    /// Instantiates `self` from a JSON `reader`.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, Error> {
        serde_json::from_reader(reader).map_err(|e| Error::InvalidJson(format!("{}", e)))
    }

    /// Instantiates `self` by reading a JSON file at `path`.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        File::open(path)
            .map_err(|e| Error::ReadError(format!("{}", e)))
            .and_then(Self::from_json_reader)
    }
}

/// Returns the KDF used by default when creating keystores.
///
/// Currently this is scrypt with the parameters recommended by the EIP.
pub fn default_kdf(salt: Vec<u8>) -> Kdf {
    Kdf::Scrypt(Scrypt::default_scrypt(salt))
}

/// Returns the `Crypto` module for `plain_text` encrypted with `password`.
///
/// The `kdf` parameters are validated before any derivation work is done.
pub fn encrypt(
    plain_text: &[u8],
    password: &[u8],
    kdf: &Kdf,
    cipher: &Cipher,
) -> Result<Crypto, Error> {
    kdf.validate_parameters()?;

    let password = sanitize_password(password);
    let derived_key = derive_key(kdf, &password)?;

    // Encrypt the secret.
    let mut cipher_text = plain_text.to_vec();
    match &cipher {
        Cipher::Aes128Ctr(params) => {
            let iv = params.iv.as_bytes();
            if iv.len() != IV_SIZE {
                return Err(Error::IncorrectIvSize {
                    expected: IV_SIZE,
                    len: iv.len(),
                });
            }

            let mut aes = AesCtr::new(
                GenericArray::from_slice(derived_key.aes_key()),
                GenericArray::from_slice(iv),
            );
            aes.apply_keystream(&mut cipher_text);
        }
    };

    Ok(Crypto {
        kdf: KdfModule {
            function: kdf.function(),
            params: kdf.clone(),
            message: EmptyString,
        },
        checksum: ChecksumModule::sha256(generate_checksum(&derived_key, &cipher_text).to_vec().into()),
        cipher: CipherModule {
            function: CipherFunction::Aes128Ctr,
            params: cipher.clone(),
            message: cipher_text.into(),
        },
    })
}

/// Regenerate some `plain_text` from the given `password` and `crypto`.
///
/// ## Errors
///
/// - The provided password is incorrect.
/// - The `crypto.kdf` is badly formed, e.g., has some values set to zero.
pub fn decrypt(password: &[u8], crypto: &Crypto) -> Result<PlainText, Error> {
    crypto.kdf.params.validate_parameters()?;

    let password = sanitize_password(password);
    let cipher_message = crypto.cipher.message.as_bytes();

    // Length checks are structural and precede the (expensive) derivation.
    let iv = match &crypto.cipher.params {
        Cipher::Aes128Ctr(params) => {
            let iv = params.iv.as_bytes();
            if iv.len() != IV_SIZE {
                return Err(Error::IncorrectIvSize {
                    expected: IV_SIZE,
                    len: iv.len(),
                });
            }
            iv
        }
    };

    let expected_checksum = crypto.checksum.message.as_bytes();
    if expected_checksum.len() != HASH_SIZE {
        return Err(Error::IncorrectChecksumSize {
            expected: HASH_SIZE,
            len: expected_checksum.len(),
        });
    }

    // Generate the derived key.
    let derived_key = derive_key(&crypto.kdf.params, &password)?;

    // The checksum must verify before the plaintext is used in any way. A
    // mismatching checksum indicates an invalid password.
    let checksum = generate_checksum(&derived_key, cipher_message);
    if !fixed_time_eq(&checksum, expected_checksum) {
        return Err(Error::InvalidPassword);
    }

    let mut plain_text = PlainText::from(cipher_message.to_vec());
    match &crypto.cipher.params {
        Cipher::Aes128Ctr(_) => {
            let mut aes = AesCtr::new(
                GenericArray::from_slice(derived_key.aes_key()),
                GenericArray::from_slice(iv),
            );
            aes.apply_keystream(plain_text.as_mut_bytes());
        }
    };

    Ok(plain_text)
}

/// Instantiates a BLS keypair from the given `secret`.
///
/// ## Errors
///
/// - If `secret.len() != 32`.
/// - If `secret` does not represent a valid BLS12-381 scalar.
pub fn keypair_from_secret(secret: &[u8]) -> Result<Keypair, Error> {
    let sk = SecretKey::deserialize(secret).map_err(Error::InvalidSecretKeyBytes)?;
    let pk = sk.public_key();
    Ok(Keypair::from_components(pk, sk))
}

/// Generates a checksum that binds the `derived_key` to the `cipher_message`.
fn generate_checksum(derived_key: &DerivedKey, cipher_message: &[u8]) -> [u8; HASH_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(derived_key.checksum_slice());
    hasher.update(cipher_message);

    let mut digest = [0; HASH_SIZE];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

/// Derive a key from the `password` using the given `kdf`.
///
/// The KDF parameters must have been validated beforehand; in particular, a
/// scrypt `n` is required to be an exact power of two so the `log2` below is
/// lossless.
fn derive_key(kdf: &Kdf, password: &[u8]) -> Result<DerivedKey, Error> {
    let mut dk = DerivedKey::zero();

    match &kdf {
        Kdf::Pbkdf2(params) => match params.prf {
            Prf::HmacSha256 => {
                pbkdf2::<Hmac<Sha256>>(
                    password,
                    params.salt.as_bytes(),
                    params.c,
                    dk.as_mut_bytes(),
                );
            }
        },
        Kdf::Scrypt(params) => {
            scrypt(
                password,
                params.salt.as_bytes(),
                &ScryptParams::new(log2_int(params.n) as u8, params.r, params.p)
                    .map_err(|_| Error::InvalidScryptParam)?,
                dk.as_mut_bytes(),
            )
            .map_err(|_| Error::InvalidScryptParam)?;
        }
    }

    Ok(dk)
}

/// Applies the EIP-2335 password requirements: NFKD normalization followed by
/// stripping of the C0 (`U+0000..U+001F`), delete (`U+007F`) and C1
/// (`U+0080..U+009F`) control code points.
///
/// The EIP defines passwords as strings; byte strings that are not valid
/// UTF-8 are fed to the KDF untouched.
fn sanitize_password(password: &[u8]) -> Vec<u8> {
    match str::from_utf8(password) {
        Ok(password) => password
            .nfkd()
            .filter(|c| !c.is_control())
            .collect::<String>()
            .into_bytes(),
        Err(_) => password.to_vec(),
    }
}

/// Compares two byte strings without an early exit on the first mismatching
/// byte, so an attacker cannot learn a checksum prefix from timing.
fn fixed_time_eq(lhs: &[u8], rhs: &[u8]) -> bool {
    if lhs.len() != rhs.len() {
        return false;
    }

    let mut difference = 0_u8;
    for (a, b) in lhs.iter().zip(rhs.iter()) {
        difference |= a ^ b;
    }
    difference == 0
}

/// Returns the floor of the base-2 logarithm of `x`.
pub(crate) fn log2_int(x: u32) -> u32 {
    if x == 0 {
        return 0;
    }
    31 - x.leading_zeros()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log2_int_is_exact_for_powers_of_two() {
        assert_eq!(log2_int(1), 0);
        assert_eq!(log2_int(2), 1);
        assert_eq!(log2_int(256), 8);
        assert_eq!(log2_int(262144), 18);
    }

    #[test]
    fn log2_int_truncates_otherwise() {
        assert_eq!(log2_int(0), 0);
        assert_eq!(log2_int(3), 1);
        assert_eq!(log2_int(262143), 17);
    }

    #[test]
    fn sanitization_normalizes_and_strips_control_characters() {
        // NFKD decomposes the fraktur alphabet into plain ASCII.
        assert_eq!(
            sanitize_password("𝔱𝔢𝔰𝔱𝔭𝔞𝔰𝔰𝔴𝔬𝔯𝔡🔑".as_bytes()),
            "testpassword🔑".as_bytes().to_vec()
        );
        // C0, delete and C1 code points are removed.
        assert_eq!(
            sanitize_password("pass\u{0000}wor\u{001f}d\u{007f}\u{0080}\u{009f}".as_bytes()),
            b"password".to_vec()
        );
        // Non-UTF-8 bytes pass through unchanged.
        assert_eq!(sanitize_password(&[0xff, 0xfe]), vec![0xff, 0xfe]);
    }

    #[test]
    fn fixed_time_eq_matches_slice_equality() {
        assert!(fixed_time_eq(b"", b""));
        assert!(fixed_time_eq(b"abc", b"abc"));
        assert!(!fixed_time_eq(b"abc", b"abd"));
        assert!(!fixed_time_eq(b"abc", b"ab"));
    }
}
