//! Three-letter to one-letter residue code lookup.

/// Letter used for residue names missing from the lookup table.
pub const UNKNOWN_RESIDUE_LETTER: char = 'U';

/// Result of looking up a residue name.
///
/// Unknown names are not an error: callers get a placeholder letter
/// and decide themselves whether (and how loudly) to complain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResidueCode {
    Known(char),
    Unknown { placeholder: char },
}

impl ResidueCode {
    pub fn letter(&self) -> char {
        match self {
            ResidueCode::Known(c) => *c,
            ResidueCode::Unknown { placeholder } => *placeholder,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, ResidueCode::Known(_))
    }
}

/// Converts a three letter residue name (e.g. `GLY`) to its one letter code.
///
/// Histidine protonation variants used by MD force fields (HSE, HID, HSD, HSP)
/// all map to `H`.
///
/// ```
/// use shiftsim::residues::{one_letter_code, ResidueCode};
///
/// assert_eq!(one_letter_code("GLY"), ResidueCode::Known('G'));
/// assert_eq!(one_letter_code("hsd"), ResidueCode::Known('H'));
/// assert_eq!(one_letter_code("XYZ").letter(), 'U');
/// ```
pub fn one_letter_code(name: &str) -> ResidueCode {
    let upper = name.trim().to_ascii_uppercase();
    let letter = match upper.as_str() {
        "ALA" => 'A',
        "ARG" => 'R',
        "ASN" => 'N',
        "ASP" => 'D',
        "CYS" => 'C',
        "GLN" => 'Q',
        "GLU" => 'E',
        "GLY" => 'G',
        "HIS" | "HSE" | "HID" | "HSD" | "HSP" => 'H',
        "ILE" => 'I',
        "LEU" => 'L',
        "LYS" => 'K',
        "MET" => 'M',
        "PHE" => 'F',
        "PRO" => 'P',
        "SER" => 'S',
        "THR" => 'T',
        "TRP" => 'W',
        "TYR" => 'Y',
        "VAL" => 'V',
        "ASX" => 'B',
        "GLX" => 'Z',
        _ => {
            return ResidueCode::Unknown {
                placeholder: UNKNOWN_RESIDUE_LETTER,
            };
        }
    };
    ResidueCode::Known(letter)
}
