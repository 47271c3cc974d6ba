//! # Ed25519 Signing and Verification
//!
//! Key generation, signing and verification for TRC quorum signatures and
//! certificate signatures.
//!
//! ## Security Invariant
//!
//! - Signing input MUST be `&CanonicalBytes`; raw `&[u8]` cannot be signed.
//! - `Ed25519KeyPair` does not implement `Serialize`, and its `Debug` impl
//!   never prints key bytes. The explicit `seed_bytes()` / `raw_bytes()`
//!   accessors exist only for writing key files.
//!
//! ## Serde
//!
//! Public keys and signatures serialize as standard base64 strings, the
//! encoding used by TRC and certificate documents.

use base64::{engine::general_purpose::STANDARD, Engine};
use ed25519_dalek::{Signer, Verifier};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use trc_core::error::CryptoError;
use trc_core::CanonicalBytes;

/// Signature algorithm tag carried next to every key in a document.
///
/// Only Ed25519 exists; the tag is still parsed so a document naming any
/// other algorithm is rejected rather than misread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyAlgorithm {
    Ed25519,
}

impl KeyAlgorithm {
    /// Parse an algorithm name case-insensitively (`ED25519`, `ed25519`).
    pub fn parse_lenient(name: &str) -> Result<Self, CryptoError> {
        match name.to_ascii_lowercase().as_str() {
            "ed25519" => Ok(Self::Ed25519),
            other => Err(CryptoError::KeyError(format!(
                "unsupported signature algorithm {other:?}"
            ))),
        }
    }

    /// Lower-case wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ed25519 => "ed25519",
        }
    }
}

impl std::fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An Ed25519 public key (32 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ed25519PublicKey(pub [u8; 32]);

/// An Ed25519 signature (64 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ed25519Signature(pub [u8; 64]);

/// An Ed25519 key pair for signing operations.
pub struct Ed25519KeyPair {
    signing_key: ed25519_dalek::SigningKey,
}

// ---------------------------------------------------------------------------
// Ed25519PublicKey impls
// ---------------------------------------------------------------------------

impl Ed25519PublicKey {
    /// Create a public key from raw 32 bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Return the raw 32-byte public key.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render as standard base64.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Parse from standard base64; must decode to exactly 32 bytes.
    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = decode_fixed::<32>(encoded, "public key")?;
        Ok(Self(bytes))
    }

    /// Convert to an `ed25519_dalek::VerifyingKey`.
    pub fn to_verifying_key(&self) -> Result<ed25519_dalek::VerifyingKey, CryptoError> {
        ed25519_dalek::VerifyingKey::from_bytes(&self.0)
            .map_err(|e| CryptoError::KeyError(format!("invalid public key: {e}")))
    }
}

impl Serialize for Ed25519PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for Ed25519PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Self::from_base64(&encoded).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519PublicKey({}...)", hex_prefix(&self.0))
    }
}

impl std::fmt::Display for Ed25519PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_base64())
    }
}

// ---------------------------------------------------------------------------
// Ed25519Signature impls
// ---------------------------------------------------------------------------

impl Ed25519Signature {
    /// Create a signature from raw 64 bytes.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Return the raw 64-byte signature.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Render as standard base64.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Parse from standard base64; must decode to exactly 64 bytes.
    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = decode_fixed::<64>(encoded, "signature")?;
        Ok(Self(bytes))
    }
}

impl Serialize for Ed25519Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for Ed25519Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Self::from_base64(&encoded).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519Signature({}...)", hex_prefix(&self.0))
    }
}

// ---------------------------------------------------------------------------
// Ed25519KeyPair impls
// ---------------------------------------------------------------------------

impl Ed25519KeyPair {
    /// Generate a new random key pair.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        let signing_key = ed25519_dalek::SigningKey::generate(&mut csprng);
        Self { signing_key }
    }

    /// Derive a key pair from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(seed),
        }
    }

    /// Load a key pair from its 64-byte raw form (`seed || public key`).
    ///
    /// Rejects raw keys whose public half does not match the seed.
    pub fn from_raw(raw: &[u8; 64]) -> Result<Self, CryptoError> {
        let signing_key = ed25519_dalek::SigningKey::from_keypair_bytes(raw)
            .map_err(|e| CryptoError::KeyError(format!("inconsistent raw key: {e}")))?;
        Ok(Self { signing_key })
    }

    /// The public key of this pair.
    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// The 32-byte seed. Only for writing `.seed` key files.
    pub fn seed_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// The 64-byte raw form. Only for writing `.key` key files.
    pub fn raw_bytes(&self) -> [u8; 64] {
        self.signing_key.to_keypair_bytes()
    }

    /// Sign canonical bytes.
    pub fn sign(&self, data: &CanonicalBytes) -> Ed25519Signature {
        Ed25519Signature(self.signing_key.sign(data.as_bytes()).to_bytes())
    }
}

impl std::fmt::Debug for Ed25519KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519KeyPair(<private>)")
    }
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Verify an Ed25519 signature over canonical bytes.
///
/// Uses strict verification (rejects small-order keys and malleable
/// signatures).
pub fn verify(
    data: &CanonicalBytes,
    signature: &Ed25519Signature,
    verifying_key: &ed25519_dalek::VerifyingKey,
) -> Result<(), CryptoError> {
    let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    verifying_key
        .verify_strict(data.as_bytes(), &sig)
        .map_err(|e| CryptoError::VerificationFailed(format!("Ed25519 verification failed: {e}")))
}

/// Verify with an `Ed25519PublicKey` instead of a dalek key.
pub fn verify_with_public_key(
    data: &CanonicalBytes,
    signature: &Ed25519Signature,
    public_key: &Ed25519PublicKey,
) -> Result<(), CryptoError> {
    let vk = public_key.to_verifying_key()?;
    verify(data, signature, &vk)
}

fn decode_fixed<const N: usize>(encoded: &str, what: &str) -> Result<[u8; N], CryptoError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| CryptoError::Encoding(format!("{what} is not valid base64: {e}")))?;
    bytes.try_into().map_err(|b: Vec<u8>| {
        CryptoError::Encoding(format!("{what} must be {N} bytes, got {}", b.len()))
    })
}

fn hex_prefix(bytes: &[u8]) -> String {
    bytes.iter().take(4).map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical(value: serde_json::Value) -> CanonicalBytes {
        CanonicalBytes::new(&value).unwrap()
    }

    #[test]
    fn test_sign_and_verify() {
        let kp = Ed25519KeyPair::generate();
        let data = canonical(serde_json::json!({"isd": 1, "version": 0}));
        let sig = kp.sign(&data);
        verify_with_public_key(&data, &sig, &kp.public_key()).expect("valid signature");
    }

    #[test]
    fn test_verify_wrong_key_fails() {
        let kp1 = Ed25519KeyPair::from_seed(&[1u8; 32]);
        let kp2 = Ed25519KeyPair::from_seed(&[2u8; 32]);
        let data = canonical(serde_json::json!({"test": true}));
        let sig = kp1.sign(&data);
        assert!(verify_with_public_key(&data, &sig, &kp2.public_key()).is_err());
    }

    #[test]
    fn test_verify_wrong_message_fails() {
        let kp = Ed25519KeyPair::from_seed(&[3u8; 32]);
        let sig = kp.sign(&canonical(serde_json::json!({"version": 0})));
        let tampered = canonical(serde_json::json!({"version": 1}));
        assert!(verify_with_public_key(&tampered, &sig, &kp.public_key()).is_err());
    }

    #[test]
    fn test_seed_and_raw_agree() {
        let kp = Ed25519KeyPair::from_seed(&[42u8; 32]);
        let raw = kp.raw_bytes();
        assert_eq!(&raw[..32], &kp.seed_bytes());
        assert_eq!(&raw[32..], kp.public_key().as_bytes());
        let reloaded = Ed25519KeyPair::from_raw(&raw).unwrap();
        assert_eq!(reloaded.public_key(), kp.public_key());
    }

    #[test]
    fn test_raw_with_foreign_public_half_rejected() {
        let kp = Ed25519KeyPair::from_seed(&[5u8; 32]);
        let other = Ed25519KeyPair::from_seed(&[6u8; 32]);
        let mut raw = kp.raw_bytes();
        raw[32..].copy_from_slice(other.public_key().as_bytes());
        assert!(Ed25519KeyPair::from_raw(&raw).is_err());
    }

    #[test]
    fn test_public_key_base64_serde() {
        let pk = Ed25519KeyPair::from_seed(&[7u8; 32]).public_key();
        let json = serde_json::to_string(&pk).unwrap();
        assert_eq!(json, format!("\"{}\"", pk.to_base64()));
        let back: Ed25519PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pk);
    }

    #[test]
    fn test_base64_length_enforced() {
        assert!(Ed25519PublicKey::from_base64("AAAA").is_err());
        assert!(Ed25519Signature::from_base64("not base64!").is_err());
    }

    #[test]
    fn test_algorithm_parsing() {
        assert_eq!(KeyAlgorithm::parse_lenient("ED25519").unwrap(), KeyAlgorithm::Ed25519);
        assert!(KeyAlgorithm::parse_lenient("ecdsa").is_err());
        assert_eq!(serde_json::to_string(&KeyAlgorithm::Ed25519).unwrap(), "\"ed25519\"");
    }

    #[test]
    fn test_debug_does_not_leak_private_key() {
        let kp = Ed25519KeyPair::generate();
        assert_eq!(format!("{kp:?}"), "Ed25519KeyPair(<private>)");
    }
}
