use serde::{
    Deserialize,
    Serialize,
};

/// A single 2D correlation.
///
/// `dim2_ppm` is the indirect (heteronuclear, Sparky w1) dimension and
/// `dim1_ppm` the direct (proton, Sparky w2) dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    pub label: String,
    pub dim2_ppm: f64,
    pub dim1_ppm: f64,
}

impl Peak {
    pub fn new(label: impl Into<String>, dim2_ppm: f64, dim1_ppm: f64) -> Self {
        Self {
            label: label.into(),
            dim2_ppm,
            dim1_ppm,
        }
    }

    /// Builds the assignment label, e.g. `G15H-N` for the amide of Gly 15.
    pub fn assignment_label(
        residue_letter: char,
        residue_id: i32,
        direct_atom: &str,
        indirect_atom: &str,
    ) -> String {
        format!("{residue_letter}{residue_id}{direct_atom}-{indirect_atom}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_label() {
        assert_eq!(Peak::assignment_label('G', 15, "H", "N"), "G15H-N");
        assert_eq!(Peak::assignment_label('N', 7, "HD21", "ND2"), "N7HD21-ND2");
        assert_eq!(Peak::assignment_label('A', -3, "H", "N"), "A-3H-N");
    }
}
