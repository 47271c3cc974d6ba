//! # trc-core: Foundational Types for the Trust-Root Toolchain
//!
//! This crate is the leaf of the workspace DAG. It defines the primitives
//! every other crate builds on:
//!
//! 1. **`CanonicalBytes` newtype.** Every byte sequence that is signed or
//!    verified flows through `CanonicalBytes::new()` (RFC 8785 / JCS). No
//!    raw `serde_json::to_vec()` on a signing path. Ever.
//!
//! 2. **Validated identifiers.** `IsdId`, `Asn` and `AuthorityId` parse
//!    and render the ISD-AS notation; no bare strings for authorities.
//!
//! 3. **Unix-second timestamps.** `Timestamp` is UTC with seconds
//!    precision and serializes as an integer, matching the document
//!    encodings.
//!
//! 4. **One error taxonomy.** `TrustError` has a variant per failure
//!    class the batch layer distinguishes.
//!
//! 5. **Injected logging.** Components take an `Arc<dyn Logger>` instead of
//!    reaching for a process-wide logger.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `trc-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod error;
pub mod identity;
pub mod logging;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use error::{ErrorKind, TrustError};
pub use identity::{Asn, AuthorityId, IsdId};
pub use logging::{Logger, NoopLogger, TracingLogger};
pub use temporal::Timestamp;
