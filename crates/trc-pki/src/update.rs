//! TRC update-chain verification: a run of consecutive TRC versions of one
//! ISD, each vouched for by its predecessor.

use trc_core::TrustError;

use crate::quorum::QuorumSignatureEngine;
use crate::trc::{QuorumReport, TrustRootDocument};

impl QuorumSignatureEngine {
    /// Verify `trcs` as one update chain.
    ///
    /// The documents may be given in any order. They must all belong to one
    /// ISD and, once sorted by version, form a gap-free sequence. The lowest
    /// version is checked against its own keys (it is the trust root of the
    /// run even when it is not the genesis TRC); every later version against
    /// its predecessor. Returns one report per document in version order.
    pub fn verify_update_chain(
        &self,
        trcs: &[TrustRootDocument],
    ) -> Result<Vec<QuorumReport>, TrustError> {
        let Some(first) = trcs.first() else {
            return Err(TrustError::UpdateChain("no TRCs supplied".into()));
        };
        if let Some(other) = trcs.iter().find(|t| t.isd() != first.isd()) {
            return Err(TrustError::UpdateChain(format!(
                "TRCs of ISD {} and ISD {} cannot form one chain",
                first.isd(),
                other.isd()
            )));
        }

        let mut sorted: Vec<&TrustRootDocument> = trcs.iter().collect();
        sorted.sort_by_key(|t| t.version());
        for pair in sorted.windows(2) {
            if pair[0].version().checked_add(1) != Some(pair[1].version()) {
                return Err(TrustError::UpdateChain(format!(
                    "ISD {}: version {} is followed by version {}",
                    first.isd(),
                    pair[0].version(),
                    pair[1].version()
                )));
            }
        }

        let root = sorted[0];
        let mut reports = Vec::with_capacity(sorted.len());
        let root_report = if root.is_genesis() {
            self.verify_quorum(root, root)?
        } else {
            self.logger.info(&format!(
                "ISD {}: chain starts at version {}, checking it against its own keys",
                root.isd(),
                root.version()
            ));
            root.verify_self_signed()?
        };
        reports.push(root_report);
        for pair in sorted.windows(2) {
            reports.push(self.verify_quorum(pair[1], pair[0])?);
        }
        Ok(reports)
    }
}
