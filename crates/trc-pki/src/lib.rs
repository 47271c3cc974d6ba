//! # trc-pki: Trust Roots and Certificate Chains
//!
//! - **TRC** (`trc.rs`): the versioned trust-root document of one isolation
//!   domain, its canonical unsigned encoding, and the append-only signature
//!   set.
//! - **Quorum engine** (`quorum.rs`): signs TRCs on behalf of core
//!   authorities and checks that enough of them vouch for a version.
//! - **Update chains** (`update.rs`): verifies consecutive TRC versions of
//!   one ISD, each against its predecessor.
//! - **Certificates** (`certificate.rs`) and **chains** (`chain.rs`): the
//!   leaf/issuer pair and its verification against a TRC anchor.
//!
//! ## Security Invariant
//!
//! Every signature in this crate is computed and checked over
//! `CanonicalBytes` of the unsigned document. A signature from an authority
//! that is not registered, or that does not verify, never counts toward a
//! quorum.

pub mod certificate;
pub mod chain;
pub mod quorum;
pub mod trc;
pub mod update;

pub use certificate::Certificate;
pub use chain::CertificateChain;
pub use quorum::QuorumSignatureEngine;
pub use trc::{CoreAuthority, OpaqueMap, QuorumReport, TrcFields, TrustRootDocument};

#[cfg(test)]
pub(crate) mod fixtures;
