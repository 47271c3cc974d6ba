//! # Error Types: Structured Error Hierarchy
//!
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! ## Design
//!
//! - `TrustError` carries one variant per failure class the batch layer
//!   reports: schema, signing, quorum, chain verification, and I/O.
//! - Cryptographic and canonicalization failures keep their own enums and
//!   convert into `TrustError` through `#[from]`.
//! - `ErrorKind` is a flat, `Copy` classification used for per-kind
//!   counting and the diagnostic line printed per item.

use std::path::PathBuf;

use thiserror::Error;

use crate::identity::AuthorityId;

/// Top-level error type for trust-root operations.
#[derive(Error, Debug)]
pub enum TrustError {
    /// Malformed document, missing field, or violated structural invariant.
    #[error("schema error: {0}")]
    Schema(String),

    /// A signature was offered for an authority that is not a core authority.
    #[error("authority {0} is not a core authority of this TRC")]
    UnknownAuthority(AuthorityId),

    /// The authority already signed this TRC version.
    #[error("authority {authority} already signed TRC version {version}")]
    DuplicateSignature {
        /// The authority that attempted to sign twice.
        authority: AuthorityId,
        /// The TRC version in question.
        version: u64,
    },

    /// Signing was requested for an authority whose key was not supplied.
    #[error("{role} key missing for authority {authority}")]
    MissingKey {
        /// Authority lacking the key.
        authority: AuthorityId,
        /// Key role (`online`, `offline`, `signing`).
        role: String,
    },

    /// Fewer valid signatures than the threshold.
    #[error("quorum not reached: {valid} valid signature(s), {required} required")]
    QuorumNotReached {
        /// Threshold that had to be met.
        required: usize,
        /// Number of signatures that verified.
        valid: usize,
    },

    /// A TRC was checked against a predecessor that does not precede it.
    #[error("TRC update chain broken: {0}")]
    UpdateChain(String),

    /// Leaf subject differs from the subject the caller expected.
    #[error("subject mismatch: expected {expected}, got {actual}")]
    SubjectMismatch {
        /// Subject requested by the verifier.
        expected: AuthorityId,
        /// Subject found in the leaf certificate.
        actual: AuthorityId,
    },

    /// The issuing authority is not part of the anchor TRC.
    #[error("issuer {authority} is not a core authority of the anchor TRC: {reason}")]
    AnchorMismatch {
        /// Issuing authority looked up in the anchor.
        authority: AuthorityId,
        /// Additional context.
        reason: String,
    },

    /// A certificate signature in the chain did not verify.
    #[error("chain signature error: {0}")]
    ChainSignature(String),

    /// Verification time outside a validity window.
    #[error("expired: {0}")]
    Expired(String),

    /// File could not be read or written.
    #[error("io error at {}: {source}", path.display())]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// Key or signature material was malformed.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

impl TrustError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Classify this error for reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Schema(_) | Self::Canonicalization(_) => ErrorKind::Schema,
            Self::UnknownAuthority(_) => ErrorKind::UnknownAuthority,
            Self::DuplicateSignature { .. } => ErrorKind::DuplicateSignature,
            Self::MissingKey { .. } => ErrorKind::MissingKey,
            Self::QuorumNotReached { .. } => ErrorKind::QuorumNotReached,
            Self::UpdateChain(_) => ErrorKind::UpdateChain,
            Self::SubjectMismatch { .. } => ErrorKind::SubjectMismatch,
            Self::AnchorMismatch { .. } => ErrorKind::AnchorMismatch,
            Self::ChainSignature(_) => ErrorKind::ChainSignature,
            Self::Expired(_) => ErrorKind::Expired,
            Self::Io { .. } => ErrorKind::Io,
            Self::Crypto(_) => ErrorKind::Crypto,
        }
    }
}

impl From<serde_json::Error> for TrustError {
    fn from(e: serde_json::Error) -> Self {
        Self::Schema(e.to_string())
    }
}

/// Flat classification of [`TrustError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    Schema,
    UnknownAuthority,
    DuplicateSignature,
    MissingKey,
    QuorumNotReached,
    UpdateChain,
    SubjectMismatch,
    AnchorMismatch,
    ChainSignature,
    Expired,
    Io,
    Crypto,
}

impl ErrorKind {
    /// Stable upper-case name used in diagnostic lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Schema => "SCHEMA",
            Self::UnknownAuthority => "UNKNOWN_AUTHORITY",
            Self::DuplicateSignature => "DUPLICATE_SIGNATURE",
            Self::MissingKey => "MISSING_KEY",
            Self::QuorumNotReached => "QUORUM_NOT_REACHED",
            Self::UpdateChain => "UPDATE_CHAIN",
            Self::SubjectMismatch => "SUBJECT_MISMATCH",
            Self::AnchorMismatch => "ANCHOR_MISMATCH",
            Self::ChainSignature => "CHAIN_SIGNATURE",
            Self::Expired => "EXPIRED",
            Self::Io => "IO",
            Self::Crypto => "CRYPTO",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in signed documents.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error in cryptographic operations.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Signature verification failed.
    #[error("signature verification failed: {0}")]
    VerificationFailed(String),

    /// Key parsing or derivation failed.
    #[error("key error: {0}")]
    KeyError(String),

    /// Base64 or length decoding failed.
    #[error("encoding error: {0}")]
    Encoding(String),
}
