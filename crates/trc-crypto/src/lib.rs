//! # trc-crypto: Cryptographic Primitives
//!
//! - **Ed25519** signing and verification. Signing input is always
//!   `&CanonicalBytes`.
//! - **Key material** (`keys.rs`): one key pair per role (`online`,
//!   `offline`, `signing`), built explicitly from a 32-byte seed or a
//!   64-byte raw key. Lengths are never guessed.
//! - **Key store** (`store.rs`): read-only map from authority to its key
//!   material, loaded from authority configuration directories.
//!
//! ## Crate Policy
//!
//! - Depends only on `trc-core` internally.
//! - No mocking of cryptographic operations in tests.
//! - Private key bytes are never logged or serialized through serde.

pub mod ed25519;
pub mod keys;
pub mod store;

pub use ed25519::{
    verify, verify_with_public_key, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature,
    KeyAlgorithm,
};
pub use keys::{KeyMaterial, KeyRole, RAW_KEY_LEN, SEED_LEN};
pub use store::{AuthorityKeys, ConfDir, KeyMaterialStore};
