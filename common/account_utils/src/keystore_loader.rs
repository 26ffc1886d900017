//! Batch-unlocks a directory of EIP-2335 keystores, pairing each container
//! with a password file of the same name.
//!
//! ## Layout
//!
//! ```ignore
//! keystores                     secrets
//! ├── 0x9612…0d07.json          ├── 0x9612…0d07.txt
//! └── 0xb89b…11f1.json          └── 0xb89b…11f1.txt
//! ```
//!
//! Decryption is CPU-bound (scrypt or pbkdf2), so the pairs are processed on
//! the rayon thread pool.

use bls::Keypair;
use bls_keystore::Keystore;
use rayon::prelude::*;
use slog::{info, warn, Logger};
use std::fs::read_dir;
use std::io;
use std::path::{Path, PathBuf};

/// The file extension that identifies a keystore container.
const KEYSTORE_EXTENSION: &str = "json";
/// The file extension of the password paired with a container.
const PASSWORD_EXTENSION: &str = "txt";

#[derive(Debug)]
pub enum Error {
    DirectoryDoesNotExist(PathBuf),
    UnableToReadDir(io::Error),
    UnableToReadEntry(io::Error),
}

/// A signing key unlocked from an on-disk keystore.
#[derive(Clone)]
pub struct UnlockedValidator {
    pub keypair: Keypair,
    /// The EIP-2334 derivation path declared by the container. Only keys
    /// stored at the root of the tree (an empty path) presently decode.
    pub derivation_path: String,
    /// Whether the holder may use this key for signing only. Keys unlocked
    /// from disk are never read-only; the flag is reserved for keys injected
    /// by other means.
    pub readonly: bool,
}

impl UnlockedValidator {
    fn from_keystore(keystore: &Keystore, keypair: Keypair) -> Self {
        Self {
            keypair,
            derivation_path: keystore.path().to_string(),
            readonly: false,
        }
    }
}

/// Unlocks every `<name>.json` keystore in `keystore_dir` with the password in
/// `password_dir/<name>.txt`.
///
/// Passwords are read as raw bytes; sanitization is applied by the decoder,
/// not here.
///
/// A failure to decrypt any single pair — an unreadable or missing password
/// file, malformed JSON, a bad password, a key mismatch — is logged and the
/// pair skipped, so one corrupt or mis-paired file cannot take a whole
/// validator set offline. An absent `password_dir` is just that failure for
/// every pair.
///
/// ## Errors
///
/// Returns an error only if `keystore_dir` itself cannot be enumerated.
pub fn load_keystore_dir<P: AsRef<Path>>(
    keystore_dir: P,
    password_dir: P,
    log: &Logger,
) -> Result<Vec<UnlockedValidator>, Error> {
    let keystore_dir = keystore_dir.as_ref();
    let password_dir = password_dir.as_ref();

    if !keystore_dir.exists() {
        return Err(Error::DirectoryDoesNotExist(keystore_dir.into()));
    }

    let paths = read_dir(keystore_dir)
        .map_err(Error::UnableToReadDir)?
        .map(|entry| entry.map(|e| e.path()).map_err(Error::UnableToReadEntry))
        .collect::<Result<Vec<_>, _>>()?;

    let keystore_paths = paths
        .into_iter()
        .filter(|path| {
            let is_keystore = path.is_file()
                && path.extension().map_or(false, |ext| ext == KEYSTORE_EXTENSION);
            if !is_keystore {
                warn!(
                    log,
                    "Ignoring non-keystore entry";
                    "path" => format!("{:?}", path)
                );
            }
            is_keystore
        })
        .collect::<Vec<_>>();

    let validators = keystore_paths
        .into_par_iter()
        .filter_map(|path| match unlock_pair(&path, password_dir) {
            Ok(validator) => {
                info!(
                    log,
                    "Unlocked validator keystore";
                    "voting_pubkey" => validator.keypair.pk.to_hex_string()
                );
                Some(validator)
            }
            Err(e) => {
                warn!(
                    log,
                    "Failed to unlock keystore";
                    "path" => format!("{:?}", path),
                    "error" => e
                );
                None
            }
        })
        .collect();

    Ok(validators)
}

/// Unlocks the single keystore at `keystore_path`.
///
/// Failures are reported as strings: they are only ever logged, and the mix
/// of IO, JSON and crypto causes is not worth an enum that nothing matches
/// on.
fn unlock_pair(keystore_path: &Path, password_dir: &Path) -> Result<UnlockedValidator, String> {
    let keystore = Keystore::from_json_file(keystore_path)
        .map_err(|e| format!("unable to parse keystore: {:?}", e))?;

    let password_path = password_path(keystore_path, password_dir)
        .ok_or_else(|| "keystore has no file stem".to_string())?;

    let password = std::fs::read(&password_path)
        .map_err(|e| format!("unable to read {:?}: {}", password_path, e))?;

    let keypair = keystore
        .decrypt_keypair(&password)
        .map_err(|e| format!("unable to decrypt: {:?}", e))?;

    Ok(UnlockedValidator::from_keystore(&keystore, keypair))
}

/// Returns `password_dir/<stem>.txt` for the keystore at `keystore_path`.
fn password_path(keystore_path: &Path, password_dir: &Path) -> Option<PathBuf> {
    keystore_path
        .file_stem()
        .map(|stem| {
            let mut file_name = stem.to_os_string();
            file_name.push(".");
            file_name.push(PASSWORD_EXTENSION);
            password_dir.join(file_name)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_with_600_perms;
    use bls_keystore::{
        json_keystore::{Kdf, Pbkdf2, Prf},
        KeystoreBuilder, DKLEN,
    };
    use slog::o;
    use std::fs;
    use tempfile::TempDir;

    /// A KDF weak enough to run in debug builds.
    fn test_kdf() -> Kdf {
        Kdf::Pbkdf2(Pbkdf2 {
            dklen: DKLEN,
            c: 2,
            prf: Prf::HmacSha256,
            salt: vec![7; 32].into(),
        })
    }

    fn null_log() -> Logger {
        Logger::root(slog::Discard, o!())
    }

    /// Writes `<name>.json` / `<name>.txt` for a fresh keypair, returning it.
    fn write_pair(name: &str, password: &[u8], keystore_dir: &Path, password_dir: &Path) -> Keypair {
        let keypair = Keypair::random();
        let keystore = KeystoreBuilder::new(&keypair, password, "".into())
            .unwrap()
            .kdf(test_kdf())
            .build()
            .unwrap();

        let mut file = fs::File::create(keystore_dir.join(format!("{}.json", name))).unwrap();
        keystore.to_json_writer(&mut file).unwrap();

        create_with_600_perms(password_dir.join(format!("{}.txt", name)), password).unwrap();

        keypair
    }

    #[test]
    fn unlocks_all_valid_pairs() {
        let keystores = TempDir::new().unwrap();
        let secrets = TempDir::new().unwrap();

        let a = write_pair("a", b"first-password", keystores.path(), secrets.path());
        let b = write_pair("b", b"second-password", keystores.path(), secrets.path());

        let mut validators =
            load_keystore_dir(keystores.path(), secrets.path(), &null_log()).unwrap();
        validators.sort_by_key(|v| v.keypair.pk.serialize().to_vec());

        let mut expected = vec![a.pk, b.pk];
        expected.sort_by_key(|pk| pk.serialize().to_vec());

        assert_eq!(
            validators
                .iter()
                .map(|v| v.keypair.pk.clone())
                .collect::<Vec<_>>(),
            expected
        );
        assert!(validators.iter().all(|v| !v.readonly));
        assert!(validators.iter().all(|v| v.derivation_path.is_empty()));
    }

    #[test]
    fn skips_corrupt_keystore_and_continues() {
        let keystores = TempDir::new().unwrap();
        let secrets = TempDir::new().unwrap();

        let a = write_pair("a", b"first-password", keystores.path(), secrets.path());
        let c = write_pair("c", b"third-password", keystores.path(), secrets.path());

        // The middle file is not valid JSON.
        fs::write(keystores.path().join("b.json"), b"{ not json").unwrap();
        fs::write(secrets.path().join("b.txt"), b"whatever").unwrap();

        let validators =
            load_keystore_dir(keystores.path(), secrets.path(), &null_log()).unwrap();

        let mut pubkeys = validators
            .iter()
            .map(|v| v.keypair.pk.clone())
            .collect::<Vec<_>>();
        pubkeys.sort_by_key(|pk| pk.serialize().to_vec());
        let mut expected = vec![a.pk, c.pk];
        expected.sort_by_key(|pk| pk.serialize().to_vec());

        assert_eq!(pubkeys, expected);
    }

    #[test]
    fn skips_missing_password_and_wrong_password() {
        let keystores = TempDir::new().unwrap();
        let secrets = TempDir::new().unwrap();

        let a = write_pair("a", b"first-password", keystores.path(), secrets.path());

        // `b` has no password file at all.
        write_pair("b", b"second-password", keystores.path(), secrets.path());
        fs::remove_file(secrets.path().join("b.txt")).unwrap();

        // `c`'s password file contains the wrong password.
        write_pair("c", b"third-password", keystores.path(), secrets.path());
        fs::write(secrets.path().join("c.txt"), b"not-the-password").unwrap();

        let validators =
            load_keystore_dir(keystores.path(), secrets.path(), &null_log()).unwrap();

        assert_eq!(validators.len(), 1);
        assert_eq!(validators[0].keypair.pk, a.pk);
    }

    #[test]
    fn ignores_other_extensions() {
        let keystores = TempDir::new().unwrap();
        let secrets = TempDir::new().unwrap();

        let a = write_pair("a", b"first-password", keystores.path(), secrets.path());
        fs::write(keystores.path().join("deposit-tx-hash.txt"), b"0xdead").unwrap();
        fs::write(keystores.path().join("README.md"), b"docs").unwrap();

        let validators =
            load_keystore_dir(keystores.path(), secrets.path(), &null_log()).unwrap();

        assert_eq!(validators.len(), 1);
        assert_eq!(validators[0].keypair.pk, a.pk);
    }

    #[test]
    fn missing_keystore_dir_is_an_error() {
        let keystores = TempDir::new().unwrap();
        let missing = keystores.path().join("nope");

        assert!(matches!(
            load_keystore_dir(&missing, &keystores.path().to_path_buf(), &null_log()),
            Err(Error::DirectoryDoesNotExist(_))
        ));
    }

    #[test]
    fn missing_password_dir_skips_every_pair() {
        let keystores = TempDir::new().unwrap();
        let secrets = TempDir::new().unwrap();

        write_pair("a", b"first-password", keystores.path(), secrets.path());
        write_pair("b", b"second-password", keystores.path(), secrets.path());

        // A password directory that was never created is the missing-password
        // failure for every pair, not a batch error.
        let missing = secrets.path().join("nope");
        let validators =
            load_keystore_dir(&keystores.path().to_path_buf(), &missing, &null_log()).unwrap();

        assert!(validators.is_empty());
    }
}
