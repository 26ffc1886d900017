use crate::keystore::DKLEN;
use zeroize::Zeroize;

/// The output of a KDF, zeroized on drop.
///
/// The split into an AES key and a checksum slice is fixed by EIP-2335 and is
/// not configurable.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct DerivedKey([u8; DKLEN as usize]);

impl DerivedKey {
    /// Instantiates `Self` with an all-zeros byte array.
    pub fn zero() -> Self {
        Self([0; DKLEN as usize])
    }

    /// Returns a mutable reference to the underlying byte array.
    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.0
    }

    /// Returns the aes-128-ctr key.
    ///
    /// Only the first 16 bytes of the derived key are used as the AES key.
    ///
    /// ## Reference
    ///
    /// https://eips.ethereum.org/EIPS/eip-2335#secret-decryption
    pub fn aes_key(&self) -> &[u8] {
        &self.0[0..16]
    }

    /// Returns the `DK_slice` bytes used for checksum comparison.
    ///
    /// ## Reference
    ///
    /// https://eips.ethereum.org/EIPS/eip-2335#procedure
    pub fn checksum_slice(&self) -> &[u8] {
        &self.0[16..32]
    }
}
