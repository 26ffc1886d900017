use crate::{PublicKey, SecretKey};
use std::fmt;

/// A simple wrapper around a `PublicKey` and the `SecretKey` it was derived
/// from.
#[derive(Clone)]
pub struct Keypair {
    pub pk: PublicKey,
    pub sk: SecretKey,
}

impl Keypair {
    /// Instantiate `Self` from existing components.
    ///
    /// It is not checked that `pk` is derived from `sk`; that is the caller's
    /// responsibility.
    pub fn from_components(pk: PublicKey, sk: SecretKey) -> Self {
        Self { pk, sk }
    }

    /// Instantiates `Self` from a randomly generated secret key.
    pub fn random() -> Self {
        let sk = SecretKey::random();
        let pk = sk.public_key();
        Self { pk, sk }
    }
}

impl fmt::Debug for Keypair {
    /// Defers to the `Debug` implementation for the public key; the secret is
    /// never printed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.pk.fmt(f)
    }
}
