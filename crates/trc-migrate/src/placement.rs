//! # Output Placement
//!
//! Decides where a migrated item is written and writes it atomically.
//!
//! | Mode | TRC / chain destination | Key destination |
//! |------|-------------------------|-----------------|
//! | `overwrite` | the source path | the conf dir's own key file |
//! | `suffix` | `<source>.<suffix>` | `<key file>.<suffix>` |
//! | `outdir` | `<outdir>/[<element>/]<conventional name>` | `<outdir>/<conf dir name>/keys/<file>` |
//!
//! `<element>` is the name of the source file's grandparent directory
//! (`.../cs1-11-1/certs/ISD1-V0.trc` → `cs1-11-1`), inserted only when
//! nesting by element is enabled.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use trc_core::TrustError;
use trc_crypto::keys::KEYS_SUBDIR;

/// How migrated output is placed relative to its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    Overwrite,
    Suffix,
    #[default]
    OutDir,
}

impl OutputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Overwrite => "overwrite",
            Self::Suffix => "suffix",
            Self::OutDir => "outdir",
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputMode {
    type Err = TrustError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "suffix" => Ok(Self::Suffix),
            "outdir" => Ok(Self::OutDir),
            _ => Err(TrustError::Schema(format!(
                "invalid output mode {s:?}, expected overwrite, suffix or outdir"
            ))),
        }
    }
}

impl Serialize for OutputMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OutputMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Placement settings shared by every item of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPolicy {
    mode: OutputMode,
    outdir: PathBuf,
    suffix: String,
    nested_by_element: bool,
}

impl OutputPolicy {
    /// Validate and build a policy.
    ///
    /// # Errors
    ///
    /// `Schema` when suffix mode is requested with an empty suffix or one
    /// containing a path separator.
    pub fn new(
        mode: OutputMode,
        outdir: impl Into<PathBuf>,
        suffix: impl Into<String>,
        nested_by_element: bool,
    ) -> Result<Self, TrustError> {
        let suffix = suffix.into();
        if mode == OutputMode::Suffix && (suffix.is_empty() || suffix.contains(['/', '\\'])) {
            return Err(TrustError::Schema(format!(
                "suffix {suffix:?} cannot be appended to a file name"
            )));
        }
        Ok(Self {
            mode,
            outdir: outdir.into(),
            suffix,
            nested_by_element,
        })
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn outdir(&self) -> &Path {
        &self.outdir
    }

    /// Destination for a migrated document read from `source`, whose
    /// conventional file name is `file_name`.
    pub fn document_destination(&self, source: &Path, file_name: &str) -> PathBuf {
        match self.mode {
            OutputMode::Overwrite => source.to_path_buf(),
            OutputMode::Suffix => self.with_suffix(source),
            OutputMode::OutDir => {
                let mut dest = self.outdir.clone();
                if self.nested_by_element {
                    if let Some(element) = element_name(source) {
                        dest.push(element);
                    }
                }
                dest.push(file_name);
                dest
            }
        }
    }

    /// Destination for key file `file_name` of the conf dir `conf_dir`.
    pub fn key_destination(&self, conf_dir: &Path, file_name: &str) -> PathBuf {
        match self.mode {
            OutputMode::Overwrite => conf_dir.join(KEYS_SUBDIR).join(file_name),
            OutputMode::Suffix => self.with_suffix(&conf_dir.join(KEYS_SUBDIR).join(file_name)),
            OutputMode::OutDir => {
                let mut dest = self.outdir.clone();
                if let Some(name) = conf_dir.file_name() {
                    dest.push(name);
                }
                dest.join(KEYS_SUBDIR).join(file_name)
            }
        }
    }

    fn with_suffix(&self, path: &Path) -> PathBuf {
        let mut raw = path.as_os_str().to_os_string();
        raw.push(".");
        raw.push(&self.suffix);
        PathBuf::from(raw)
    }
}

/// Name of the grandparent directory of `source`, if it has one.
pub fn element_name(source: &Path) -> Option<&std::ffi::OsStr> {
    source.parent()?.parent()?.file_name()
}

/// Mode of a newly created TRC or chain file.
pub const DOCUMENT_MODE: u32 = 0o644;

/// Mode of every written key file.
pub const KEY_FILE_MODE: u32 = 0o600;

/// Write a TRC or chain to `path` through a temporary file in the same
/// directory, so `path` holds either its old content or all of `contents`.
///
/// An existing file keeps its permissions; a new one gets [`DOCUMENT_MODE`].
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), TrustError> {
    let mode = existing_mode(path).unwrap_or(DOCUMENT_MODE);
    write_atomic_with_mode(path, contents, mode)
}

/// Write a key file atomically with [`KEY_FILE_MODE`], whatever the
/// destination's previous permissions.
pub fn write_key_atomic(path: &Path, contents: &[u8]) -> Result<(), TrustError> {
    write_atomic_with_mode(path, contents, KEY_FILE_MODE)
}

#[cfg(unix)]
fn existing_mode(path: &Path) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .ok()
        .map(|meta| meta.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn existing_mode(_path: &Path) -> Option<u32> {
    None
}

fn write_atomic_with_mode(path: &Path, contents: &[u8], mode: u32) -> Result<(), TrustError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|e| TrustError::io(&dir, e))?;
    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| TrustError::io(&dir, e))?;
    tmp.write_all(contents).map_err(|e| TrustError::io(path, e))?;
    set_mode(tmp.as_file(), mode).map_err(|e| TrustError::io(path, e))?;
    tmp.as_file().sync_all().map_err(|e| TrustError::io(path, e))?;
    tmp.persist(path).map_err(|e| TrustError::io(path, e.error))?;
    Ok(())
}

#[cfg(unix)]
fn set_mode(file: &std::fs::File, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_file: &std::fs::File, _mode: u32) -> std::io::Result<()> {
    Ok(())
}
