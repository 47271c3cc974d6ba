//! # Key Material
//!
//! One asymmetric key pair per role and authority. Construction is explicit:
//! [`KeyMaterial::from_seed`] takes exactly [`SEED_LEN`] bytes and
//! [`KeyMaterial::from_raw`] exactly [`RAW_KEY_LEN`] bytes. A buffer of the
//! wrong length is an error, never a reason to try the other decoder.
//!
//! ## Key files
//!
//! Each role has two files under `<conf_dir>/keys/`, both holding base64
//! text: `<role>.seed` (the 32-byte seed) and `<role>.key` (the 64-byte raw
//! key derived from it). A seed file of the right length is authoritative.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use trc_core::error::CryptoError;
use trc_core::{CanonicalBytes, Logger, TrustError};

use crate::ed25519::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};

/// Length of an Ed25519 seed.
pub const SEED_LEN: usize = 32;

/// Length of the raw (`seed || public key`) form.
pub const RAW_KEY_LEN: usize = 64;

/// Directory under a conf dir holding key files.
pub const KEYS_SUBDIR: &str = "keys";

/// The purpose a key pair serves for its authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyRole {
    /// Signs TRCs and core-AS certificates.
    Online,
    /// Cold key for offline TRC updates.
    Offline,
    /// The AS signing key; issues leaf certificates.
    Signing,
}

impl KeyRole {
    /// Every role, in file-writing order.
    pub const ALL: [KeyRole; 3] = [KeyRole::Online, KeyRole::Offline, KeyRole::Signing];

    /// Short role name used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Signing => "signing",
        }
    }

    fn file_stem(&self) -> &'static str {
        match self {
            Self::Online => "online-root",
            Self::Offline => "offline-root",
            Self::Signing => "as-sig",
        }
    }

    /// Raw key file name (`online-root.key`, ...).
    pub fn key_file_name(&self) -> String {
        format!("{}.key", self.file_stem())
    }

    /// Seed file name (`online-root.seed`, ...).
    pub fn seed_file_name(&self) -> String {
        format!("{}.seed", self.file_stem())
    }

    /// Raw key path under a conf dir.
    pub fn key_path(&self, conf_dir: &Path) -> PathBuf {
        conf_dir.join(KEYS_SUBDIR).join(self.key_file_name())
    }

    /// Seed path under a conf dir.
    pub fn seed_path(&self, conf_dir: &Path) -> PathBuf {
        conf_dir.join(KEYS_SUBDIR).join(self.seed_file_name())
    }
}

impl std::fmt::Display for KeyRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A key pair bound to its role.
#[derive(Debug)]
pub struct KeyMaterial {
    role: KeyRole,
    keypair: Ed25519KeyPair,
}

impl KeyMaterial {
    /// Derive key material deterministically from a 32-byte seed.
    pub fn from_seed(role: KeyRole, seed: &[u8]) -> Result<Self, CryptoError> {
        let seed: &[u8; SEED_LEN] = seed.try_into().map_err(|_| {
            CryptoError::KeyError(format!(
                "{role} seed must be {SEED_LEN} bytes, got {}",
                seed.len()
            ))
        })?;
        Ok(Self {
            role,
            keypair: Ed25519KeyPair::from_seed(seed),
        })
    }

    /// Load key material from the 64-byte raw encoding.
    pub fn from_raw(role: KeyRole, raw: &[u8]) -> Result<Self, CryptoError> {
        let raw: &[u8; RAW_KEY_LEN] = raw.try_into().map_err(|_| {
            CryptoError::KeyError(format!(
                "{role} raw key must be {RAW_KEY_LEN} bytes, got {}",
                raw.len()
            ))
        })?;
        Ok(Self {
            role,
            keypair: Ed25519KeyPair::from_raw(raw)?,
        })
    }

    pub fn role(&self) -> KeyRole {
        self.role
    }

    pub fn public_key(&self) -> Ed25519PublicKey {
        self.keypair.public_key()
    }

    pub fn keypair(&self) -> &Ed25519KeyPair {
        &self.keypair
    }

    /// Sign canonical bytes with this key.
    pub fn sign(&self, data: &CanonicalBytes) -> Ed25519Signature {
        self.keypair.sign(data)
    }

    /// Base64 text of the seed file.
    pub fn encode_seed(&self) -> String {
        STANDARD.encode(self.keypair.seed_bytes())
    }

    /// Base64 text of the raw key file.
    pub fn encode_raw(&self) -> String {
        STANDARD.encode(self.keypair.raw_bytes())
    }

    /// Load a role's key from a conf dir.
    ///
    /// The seed file wins when present and exactly [`SEED_LEN`] bytes long;
    /// otherwise the raw key file is read. Returns `Ok(None)` when neither
    /// file yields a key.
    pub fn load(
        conf_dir: &Path,
        role: KeyRole,
        logger: &Arc<dyn Logger>,
    ) -> Result<Option<Self>, TrustError> {
        let seed_path = role.seed_path(conf_dir);
        if seed_path.is_file() {
            let bytes = read_base64_file(&seed_path)?;
            if bytes.len() == SEED_LEN {
                return Ok(Some(Self::from_seed(role, &bytes)?));
            }
            logger.warn(&format!(
                "{}: seed is {} bytes, expected {SEED_LEN}; using the raw key file",
                seed_path.display(),
                bytes.len()
            ));
        }
        let key_path = role.key_path(conf_dir);
        if key_path.is_file() {
            let bytes = read_base64_file(&key_path)?;
            return Ok(Some(Self::from_raw(role, &bytes)?));
        }
        Ok(None)
    }

    /// Load a role's key in the legacy layout, where `<role>.key` held the
    /// bare seed.
    ///
    /// Returns `Ok(None)` when the file is missing or does not hold a
    /// seed-length value (it has then already been migrated).
    pub fn load_legacy(conf_dir: &Path, role: KeyRole) -> Result<Option<Self>, TrustError> {
        let key_path = role.key_path(conf_dir);
        if !key_path.is_file() {
            return Ok(None);
        }
        let bytes = read_base64_file(&key_path)?;
        if bytes.len() != SEED_LEN {
            return Ok(None);
        }
        Ok(Some(Self::from_seed(role, &bytes)?))
    }
}

/// Read a base64 text file, tolerating surrounding whitespace.
pub fn read_base64_file(path: &Path) -> Result<Vec<u8>, TrustError> {
    let text = std::fs::read_to_string(path).map_err(|e| TrustError::io(path, e))?;
    STANDARD.decode(text.trim()).map_err(|e| {
        TrustError::Crypto(CryptoError::Encoding(format!(
            "{} is not valid base64: {e}",
            path.display()
        )))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use trc_core::NoopLogger;

    fn write_key_file(dir: &Path, name: &str, bytes: &[u8]) {
        let keys = dir.join(KEYS_SUBDIR);
        std::fs::create_dir_all(&keys).unwrap();
        std::fs::write(keys.join(name), STANDARD.encode(bytes)).unwrap();
    }

    #[test]
    fn test_from_seed_is_deterministic() {
        let a = KeyMaterial::from_seed(KeyRole::Online, &[9u8; 32]).unwrap();
        let b = KeyMaterial::from_seed(KeyRole::Online, &[9u8; 32]).unwrap();
        assert_eq!(a.public_key(), b.public_key());
    }

    #[test]
    fn test_lengths_are_not_guessed() {
        assert!(KeyMaterial::from_seed(KeyRole::Online, &[0u8; 64]).is_err());
        assert!(KeyMaterial::from_raw(KeyRole::Online, &[0u8; 32]).is_err());
    }

    #[test]
    fn test_file_names() {
        assert_eq!(KeyRole::Online.key_file_name(), "online-root.key");
        assert_eq!(KeyRole::Offline.seed_file_name(), "offline-root.seed");
        assert_eq!(KeyRole::Signing.key_file_name(), "as-sig.key");
    }

    #[test]
    fn test_load_prefers_seed() {
        let dir = tempfile::tempdir().unwrap();
        let seeded = KeyMaterial::from_seed(KeyRole::Online, &[1u8; 32]).unwrap();
        let other = KeyMaterial::from_seed(KeyRole::Online, &[2u8; 32]).unwrap();
        write_key_file(dir.path(), "online-root.seed", &seeded.keypair().seed_bytes());
        write_key_file(dir.path(), "online-root.key", &other.keypair().raw_bytes());

        let loaded = KeyMaterial::load(dir.path(), KeyRole::Online, &NoopLogger::shared())
            .unwrap()
            .unwrap();
        assert_eq!(loaded.public_key(), seeded.public_key());
    }

    #[test]
    fn test_load_falls_back_to_raw() {
        let dir = tempfile::tempdir().unwrap();
        let km = KeyMaterial::from_seed(KeyRole::Signing, &[3u8; 32]).unwrap();
        write_key_file(dir.path(), "as-sig.key", &km.keypair().raw_bytes());
        let loaded = KeyMaterial::load(dir.path(), KeyRole::Signing, &NoopLogger::shared())
            .unwrap()
            .unwrap();
        assert_eq!(loaded.public_key(), km.public_key());
    }

    #[test]
    fn test_load_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = KeyMaterial::load(dir.path(), KeyRole::Offline, &NoopLogger::shared());
        assert!(loaded.unwrap().is_none());
    }

    #[test]
    fn test_short_seed_falls_back_to_raw() {
        let dir = tempfile::tempdir().unwrap();
        let km = KeyMaterial::from_seed(KeyRole::Online, &[4u8; 32]).unwrap();
        write_key_file(dir.path(), "online-root.key", &km.keypair().raw_bytes());
        write_key_file(dir.path(), "online-root.seed", &[0u8; 16]);
        let loaded = KeyMaterial::load(dir.path(), KeyRole::Online, &NoopLogger::shared())
            .unwrap()
            .unwrap();
        assert_eq!(loaded.public_key(), km.public_key());
    }

    #[test]
    fn test_short_seed_without_raw_is_none() {
        let dir = tempfile::tempdir().unwrap();
        write_key_file(dir.path(), "online-root.seed", &[0u8; 16]);
        let loaded = KeyMaterial::load(dir.path(), KeyRole::Online, &NoopLogger::shared());
        assert!(loaded.unwrap().is_none());
    }

    #[test]
    fn test_raw_file_of_wrong_length_is_error() {
        let dir = tempfile::tempdir().unwrap();
        write_key_file(dir.path(), "online-root.key", &[0u8; 40]);
        assert!(KeyMaterial::load(dir.path(), KeyRole::Online, &NoopLogger::shared()).is_err());
    }

    #[test]
    fn test_load_legacy_reads_seed_from_key_file() {
        let dir = tempfile::tempdir().unwrap();
        write_key_file(dir.path(), "online-root.key", &[4u8; 32]);
        let legacy = KeyMaterial::load_legacy(dir.path(), KeyRole::Online).unwrap().unwrap();
        let expected = KeyMaterial::from_seed(KeyRole::Online, &[4u8; 32]).unwrap();
        assert_eq!(legacy.public_key(), expected.public_key());
    }

    #[test]
    fn test_load_legacy_skips_migrated_file() {
        let dir = tempfile::tempdir().unwrap();
        let km = KeyMaterial::from_seed(KeyRole::Online, &[4u8; 32]).unwrap();
        write_key_file(dir.path(), "online-root.key", &km.keypair().raw_bytes());
        assert!(KeyMaterial::load_legacy(dir.path(), KeyRole::Online).unwrap().is_none());
    }

    #[test]
    fn test_encodings_roundtrip() {
        let km = KeyMaterial::from_seed(KeyRole::Offline, &[8u8; 32]).unwrap();
        let seed = STANDARD.decode(km.encode_seed()).unwrap();
        let raw = STANDARD.decode(km.encode_raw()).unwrap();
        let from_raw = KeyMaterial::from_raw(KeyRole::Offline, &raw).unwrap();
        assert_eq!(seed.len(), SEED_LEN);
        assert_eq!(from_raw.public_key(), km.public_key());
    }
}
