//! Matching of atom-pair correlation rules against a shift table.
//!
//! A rule `(indirect, direct)` emits one peak per residue that has shifts
//! recorded for both atoms. Residues missing either atom are skipped
//! silently, so partially assigned tables still produce every peak they can.

use serde::{
    Deserialize,
    Serialize,
};
use tracing::{
    debug,
    info,
    warn,
};

use crate::errors::{
    Result,
    ShiftSimError,
};
use crate::models::{
    Peak,
    ShiftTable,
};

/// A pair of atom names whose co-occurring shifts define a peak.
///
/// `indirect_atom` ends up on dimension 2 (w1) and `direct_atom` on
/// dimension 1 (w2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationRule {
    pub indirect_atom: String,
    pub direct_atom: String,
}

impl CorrelationRule {
    pub fn new(indirect_atom: impl Into<String>, direct_atom: impl Into<String>) -> Self {
        Self {
            indirect_atom: indirect_atom.into(),
            direct_atom: direct_atom.into(),
        }
    }
}

/// Pairs up a flat atom name list, `[a0, b0, a1, b1, ...]` -> `[(a0, b0), (a1, b1), ...]`.
///
/// ```
/// use shiftsim::correlations::{split_correlations, CorrelationRule};
///
/// let rules = split_correlations(&["N", "H", "ND2", "HD21"]).unwrap();
/// assert_eq!(rules[1], CorrelationRule::new("ND2", "HD21"));
/// assert!(split_correlations(&["N", "H", "ND2"]).is_err());
/// ```
pub fn split_correlations<S: AsRef<str>>(flat: &[S]) -> Result<Vec<CorrelationRule>> {
    if flat.len() % 2 != 0 {
        return Err(ShiftSimError::config(format!(
            "Odd number of correlation atoms ({}); correlations must be paired",
            flat.len()
        )));
    }
    Ok(flat
        .chunks_exact(2)
        .map(|pair| CorrelationRule::new(pair[0].as_ref(), pair[1].as_ref()))
        .collect())
}

/// Peaks produced by a matcher run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchOutcome {
    pub peaks: Vec<Peak>,
    /// Number of intra-residue peaks emitted.
    pub num_intra: usize,
}

#[derive(Debug, Clone)]
pub struct CorrelationMatcher {
    rules: Vec<CorrelationRule>,
    inter_offsets: Vec<i32>,
}

impl CorrelationMatcher {
    pub fn new(rules: Vec<CorrelationRule>, inter_offsets: Vec<i32>) -> Self {
        Self {
            rules,
            inter_offsets,
        }
    }

    /// Builds a matcher from a flat atom list, failing before any matching
    /// happens if the list cannot be paired.
    pub fn from_flat<S: AsRef<str>>(flat: &[S], inter_offsets: &[i32]) -> Result<Self> {
        Ok(Self::new(split_correlations(flat)?, inter_offsets.to_vec()))
    }

    pub fn rules(&self) -> &[CorrelationRule] {
        &self.rules
    }

    /// Emits peaks residue by residue (table order), rule by rule (rule
    /// order). Duplicate rules yield duplicate peaks.
    pub fn match_peaks(&self, table: &ShiftTable) -> MatchOutcome {
        let mut peaks = Vec::new();
        for residue in table.iter() {
            for rule in &self.rules {
                let (Some(indirect), Some(direct)) = (
                    residue.shift(&rule.indirect_atom),
                    residue.shift(&rule.direct_atom),
                ) else {
                    continue;
                };
                peaks.push(Peak::new(
                    Peak::assignment_label(
                        residue.residue_letter,
                        residue.residue_id,
                        &rule.direct_atom,
                        &rule.indirect_atom,
                    ),
                    indirect,
                    direct,
                ));
            }
        }
        let num_intra = peaks.len();
        debug!(
            "Matched {} intra-residue peaks from {} residues and {} rules",
            num_intra,
            table.num_residues(),
            self.rules.len()
        );

        for offset in self.inter_offsets.iter().filter(|&&o| o != 0) {
            warn!(
                "Sequential correlation offset {} is not supported, no peaks emitted for it",
                offset
            );
        }

        info!("Found {} intra-residue correlations", num_intra);
        MatchOutcome { peaks, num_intra }
    }
}
