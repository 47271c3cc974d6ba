//! # trc-migrate: Schema Migration for Trust Documents
//!
//! Moves TRCs, certificate chains, and key files from the legacy on-disk
//! format to the current one.
//!
//! - **Legacy schema** (`legacy.rs`): strict structs for the old encodings.
//! - **Versioned documents** (`schema.rs`): explicit `Legacy`/`Current`
//!   variants and the one-way `upgrade()` mapping between them.
//! - **Migrator** (`migrator.rs`): the `Parsed → Translated → Signed`
//!   typestate pipeline that re-signs upgraded documents.
//! - **Key migration** (`keys.rs`): legacy seed-only key files to the
//!   raw key plus seed layout.
//! - **Placement** (`placement.rs`): where outputs go (overwrite, suffix,
//!   or output directory) and atomic writes.

pub mod keys;
pub mod legacy;
pub mod migrator;
pub mod placement;
pub mod schema;

pub use keys::KeyMigration;
pub use legacy::{LegacyCertificate, LegacyChain, LegacyCoreAuthority, LegacyTrc};
pub use migrator::{
    DocumentMigrator, Migration, MigrationConfig, MigrationState, Parsed, Signed, Translated,
};
pub use placement::{
    write_atomic, write_key_atomic, OutputMode, OutputPolicy, DOCUMENT_MODE, KEY_FILE_MODE,
};
pub use schema::{SchemaVersion, VersionedChain, VersionedTrc};
