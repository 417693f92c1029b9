use std::collections::HashMap;

/// A single chemical shift measurement for one atom of one residue.
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftEntry {
    pub residue_id: i32,
    pub residue_letter: char,
    pub atom_name: String,
    pub shift_ppm: f64,
}

/// Shifts recorded for a single residue.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidueShifts {
    pub residue_id: i32,
    pub residue_letter: char,
    shifts: HashMap<String, f64>,
}

impl ResidueShifts {
    fn new(residue_id: i32, residue_letter: char) -> Self {
        Self {
            residue_id,
            residue_letter,
            shifts: HashMap::new(),
        }
    }

    pub fn shift(&self, atom_name: &str) -> Option<f64> {
        self.shifts.get(atom_name).copied()
    }

    pub fn num_atoms(&self) -> usize {
        self.shifts.len()
    }
}

/// Per-residue, per-atom chemical shifts.
///
/// Residues are iterated in the order their id was first seen, which is
/// what makes the emitted peak order reproducible between runs.
/// A repeated `(residue_id, atom_name)` overwrites the earlier value, and a
/// repeated residue id overwrites the residue letter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShiftTable {
    residues: Vec<ResidueShifts>,
    positions: HashMap<i32, usize>,
}

impl ShiftTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: ShiftEntry) {
        let ShiftEntry {
            residue_id,
            residue_letter,
            atom_name,
            shift_ppm,
        } = entry;

        let idx = match self.positions.get(&residue_id) {
            Some(&idx) => idx,
            None => {
                self.residues
                    .push(ResidueShifts::new(residue_id, residue_letter));
                self.positions.insert(residue_id, self.residues.len() - 1);
                self.residues.len() - 1
            }
        };
        let residue = &mut self.residues[idx];
        residue.residue_letter = residue_letter;
        residue.shifts.insert(atom_name, shift_ppm);
    }

    pub fn get(&self, residue_id: i32) -> Option<&ResidueShifts> {
        self.positions.get(&residue_id).map(|&i| &self.residues[i])
    }

    pub fn shift(&self, residue_id: i32, atom_name: &str) -> Option<f64> {
        self.get(residue_id).and_then(|r| r.shift(atom_name))
    }

    pub fn residue_letter(&self, residue_id: i32) -> Option<char> {
        self.get(residue_id).map(|r| r.residue_letter)
    }

    /// Residues in first-occurrence order.
    pub fn iter(&self) -> impl Iterator<Item = &ResidueShifts> {
        self.residues.iter()
    }

    pub fn num_residues(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }
}

impl FromIterator<ShiftEntry> for ShiftTable {
    fn from_iter<T: IntoIterator<Item = ShiftEntry>>(iter: T) -> Self {
        let mut table = ShiftTable::new();
        iter.into_iter().for_each(|e| table.insert(e));
        table
    }
}

impl Extend<ShiftEntry> for ShiftTable {
    fn extend<T: IntoIterator<Item = ShiftEntry>>(&mut self, iter: T) {
        iter.into_iter().for_each(|e| self.insert(e));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i32, letter: char, atom: &str, shift: f64) -> ShiftEntry {
        ShiftEntry {
            residue_id: id,
            residue_letter: letter,
            atom_name: atom.to_string(),
            shift_ppm: shift,
        }
    }

    #[test]
    fn test_first_occurrence_order() {
        let table: ShiftTable = vec![
            entry(5, 'A', "H", 8.0),
            entry(2, 'G', "H", 8.1),
            entry(5, 'A', "N", 120.0),
            entry(9, 'S', "H", 8.2),
        ]
        .into_iter()
        .collect();

        let ids: Vec<i32> = table.iter().map(|r| r.residue_id).collect();
        assert_eq!(ids, vec![5, 2, 9]);
        assert_eq!(table.num_residues(), 3);
        assert_eq!(table.get(5).unwrap().num_atoms(), 2);
    }

    #[test]
    fn test_last_write_wins() {
        let table: ShiftTable = vec![
            entry(1, 'A', "H", 8.0),
            entry(1, 'G', "H", 7.5),
        ]
        .into_iter()
        .collect();

        assert_eq!(table.shift(1, "H"), Some(7.5));
        assert_eq!(table.residue_letter(1), Some('G'));
        assert_eq!(table.get(1).unwrap().num_atoms(), 1);
    }

    #[test]
    fn test_missing_lookups() {
        let table: ShiftTable = vec![entry(1, 'A', "H", 8.0)].into_iter().collect();
        assert_eq!(table.shift(1, "N"), None);
        assert_eq!(table.shift(2, "H"), None);
        assert_eq!(table.residue_letter(2), None);
        assert!(ShiftTable::new().is_empty());
    }
}
