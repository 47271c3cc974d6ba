//! # Batch Runner
//!
//! Drives one operation over many items. Every item is attempted; a failed
//! item is reported and counted, never aborting the rest. Items run
//! sequentially in the order given.
//!
//! Each item produces one diagnostic line on stdout:
//!
//! ```text
//! OK: certs/ISD1-V0.trc
//! FAIL: certs/ISD2-V0.trc: MISSING_KEY: online key missing for authority 2-ff00:0:210
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use trc_core::{ErrorKind, Logger, TrustError};

/// One failed item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub label: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// Outcome of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failures: Vec<ItemFailure>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded + self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Failure count per error kind.
    pub fn failures_by_kind(&self) -> BTreeMap<ErrorKind, usize> {
        let mut counts = BTreeMap::new();
        for failure in &self.failures {
            *counts.entry(failure.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Process exit status: 0 when every item succeeded, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: BatchReport) {
        self.succeeded += other.succeeded;
        self.failures.extend(other.failures);
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} item(s): {} ok, {} failed",
            self.total(),
            self.succeeded,
            self.failures.len()
        )?;
        let by_kind = self.failures_by_kind();
        if !by_kind.is_empty() {
            let parts: Vec<String> = by_kind.iter().map(|(k, n)| format!("{k}={n}")).collect();
            write!(f, " ({})", parts.join(", "))?;
        }
        Ok(())
    }
}

/// Runs items and accumulates a [`BatchReport`].
#[derive(Debug)]
pub struct BatchRunner {
    logger: Arc<dyn Logger>,
    report: BatchReport,
    quiet: bool,
}

impl BatchRunner {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            logger,
            report: BatchReport::default(),
            quiet: false,
        }
    }

    /// Suppress the per-item stdout lines (tests and nested runs).
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    /// Run one item labelled `label`. Returns its value on success.
    pub fn run_item<T>(
        &mut self,
        label: &str,
        op: impl FnOnce() -> Result<T, TrustError>,
    ) -> Option<T> {
        match op() {
            Ok(value) => {
                self.report.succeeded += 1;
                if !self.quiet {
                    println!("OK: {label}");
                }
                Some(value)
            }
            Err(e) => {
                let kind = e.kind();
                self.logger.error(&format!("{label}: {e}"));
                if !self.quiet {
                    println!("FAIL: {label}: {kind}: {e}");
                }
                self.report.failures.push(ItemFailure {
                    label: label.to_string(),
                    kind,
                    message: e.to_string(),
                });
                None
            }
        }
    }

    /// Run `op` for every path, keeping the successful results in order.
    pub fn run_paths<T>(
        &mut self,
        paths: &[PathBuf],
        mut op: impl FnMut(&Path) -> Result<T, TrustError>,
    ) -> Vec<(PathBuf, T)> {
        let mut results = Vec::with_capacity(paths.len());
        for path in paths {
            let label = path.display().to_string();
            if let Some(value) = self.run_item(&label, || op(path)) {
                results.push((path.clone(), value));
            }
        }
        results
    }

    pub fn report(&self) -> &BatchReport {
        &self.report
    }

    /// Finish the batch, logging the summary.
    pub fn finish(self) -> BatchReport {
        if self.report.is_success() {
            self.logger.info(&self.report.to_string());
        } else {
            self.logger.warn(&self.report.to_string());
        }
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trc_core::NoopLogger;

    #[test]
    fn test_every_item_attempted() {
        let mut runner = BatchRunner::new(NoopLogger::shared()).quiet();
        let paths: Vec<PathBuf> = ["a", "b", "c"].iter().map(PathBuf::from).collect();
        let mut seen = Vec::new();
        let ok = runner.run_paths(&paths, |p| {
            seen.push(p.to_path_buf());
            if p == Path::new("b") {
                Err(TrustError::Schema("broken".into()))
            } else {
                Ok(p.display().to_string())
            }
        });
        assert_eq!(seen.len(), 3);
        assert_eq!(ok.len(), 2);

        let report = runner.finish();
        assert_eq!(report.total(), 3);
        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.failures[0].label, "b");
        assert_eq!(report.failures_by_kind().get(&ErrorKind::Schema), Some(&1));
    }

    #[test]
    fn test_summary_line() {
        let mut runner = BatchRunner::new(NoopLogger::shared()).quiet();
        runner.run_item("x", || Ok::<_, TrustError>(()));
        runner.run_item("y", || {
            Err::<(), _>(TrustError::QuorumNotReached {
                required: 2,
                valid: 1,
            })
        });
        let report = runner.finish();
        assert_eq!(
            report.to_string(),
            "2 item(s): 1 ok, 1 failed (QUORUM_NOT_REACHED=1)"
        );
    }

    #[test]
    fn test_empty_batch_succeeds() {
        let report = BatchRunner::new(NoopLogger::shared()).finish();
        assert!(report.is_success());
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_merge() {
        let mut a = BatchReport {
            succeeded: 1,
            failures: vec![],
        };
        a.merge(BatchReport {
            succeeded: 2,
            failures: vec![ItemFailure {
                label: "z".into(),
                kind: ErrorKind::Io,
                message: "gone".into(),
            }],
        });
        assert_eq!(a.total(), 4);
        assert!(!a.is_success());
    }
}
