//! # trc-cli: Batch Tool for Trust Documents
//!
//! Library half of the `trcctl` binary. Argument structs are defined with
//! clap derive next to the handler that consumes them; `main.rs` only
//! assembles subcommands, installs logging, and maps results to exit codes.
//!
//! ## Subcommands
//!
//! - `migrate-trc`: legacy TRCs to the current schema, re-signed
//! - `migrate-chain`: legacy certificate chains, re-signed by their issuer
//! - `migrate-keys`: legacy seed-only key files to the raw key plus seed layout
//! - `verify`: TRC update chains and certificate chains
//! - `sign-trc`: add one authority's signature to current-schema TRCs
//! - `parse-check`: count files that parse under a schema
//!
//! ## Exit Codes
//!
//! - `0`: every item succeeded
//! - `1`: at least one item failed (all items were still attempted)
//! - `2`: configuration error, no item was attempted

pub mod batch;
pub mod check;
pub mod config;
pub mod migrate;
pub mod sign;
pub mod verify;

use std::path::Path;

use trc_core::TrustError;

/// Read a whole input file, attributing failures to `path`.
pub(crate) fn read_input(path: &Path) -> Result<Vec<u8>, TrustError> {
    std::fs::read(path).map_err(|e| TrustError::io(path, e))
}
