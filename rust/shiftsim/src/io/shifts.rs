//! Reader for per-atom chemical shift tables.
//!
//! Each record is `residue_id residue_name atom_name shift_ppm`, for example
//! `12,GLY,N,115.0` or `12 GLY N 115.0`. There is no header row. Lines
//! starting with `#` and blank lines are ignored.

use serde::Deserialize;
use std::io::{
    BufReader,
    Read,
};
use std::path::Path;
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
    ShiftEntry,
    ShiftTable,
};
use crate::residues::{
    ResidueCode,
    one_letter_code,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// Pick based on the first data line.
    #[default]
    Auto,
    /// Comma separated.
    Csv,
    /// Fields separated by any run of whitespace.
    Whitespace,
}

/// One raw row, before the residue name is resolved.
#[derive(Debug, Clone, Deserialize)]
struct ShiftRecord {
    residue_id: i32,
    residue_name: String,
    atom_name: String,
    shift_ppm: f64,
}

impl ShiftRecord {
    fn into_entry(self, line: u64) -> Result<ShiftEntry> {
        if !self.shift_ppm.is_finite() {
            return Err(ShiftSimError::MalformedRecord {
                line,
                reason: format!("shift value {} is not finite", self.shift_ppm),
            });
        }
        if self.atom_name.is_empty() {
            return Err(ShiftSimError::MalformedRecord {
                line,
                reason: "empty atom name".to_string(),
            });
        }
        let residue_letter = match one_letter_code(&self.residue_name) {
            ResidueCode::Known(c) => c,
            ResidueCode::Unknown { placeholder } => {
                warn!(
                    "Unknown residue name '{}' on line {}. Single letter code '{}' will be used.",
                    self.residue_name, line, placeholder
                );
                placeholder
            }
        };
        Ok(ShiftEntry {
            residue_id: self.residue_id,
            residue_letter,
            atom_name: self.atom_name,
            shift_ppm: self.shift_ppm,
        })
    }
}

/// Guesses the delimiter from the first non-comment, non-blank line.
pub fn sniff_input_format(text: &str) -> InputFormat {
    let first = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#'));
    match first {
        Some(line) if line.contains(',') => InputFormat::Csv,
        _ => InputFormat::Whitespace,
    }
}

/// Reads a shift table from any reader.
pub fn read_shift_table<R: Read>(reader: R, format: InputFormat) -> Result<ShiftTable> {
    let mut text = String::new();
    BufReader::new(reader).read_to_string(&mut text)?;
    parse_shift_table(&text, format)
}

pub fn read_shift_table_file<T: AsRef<Path>>(path: T, format: InputFormat) -> Result<ShiftTable> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| ShiftSimError::io_at(e, path))?;
    let table = read_shift_table(file, format)?;
    info!(
        "Read chemical shifts for {} residues from {}",
        table.num_residues(),
        path.display()
    );
    Ok(table)
}

pub fn parse_shift_table(text: &str, format: InputFormat) -> Result<ShiftTable> {
    let format = match format {
        InputFormat::Auto => {
            let sniffed = sniff_input_format(text);
            debug!("Sniffed shift table format: {:?}", sniffed);
            sniffed
        }
        other => other,
    };
    let entries = match format {
        InputFormat::Csv => parse_csv(text)?,
        InputFormat::Whitespace | InputFormat::Auto => parse_whitespace(text)?,
    };
    Ok(entries.into_iter().collect())
}

/// Data lines with their 1-based line number. Blank lines and lines whose
/// first non-blank character is `#` are skipped, whatever the format.
fn data_lines(text: &str) -> impl Iterator<Item = (u64, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, raw)| ((i + 1) as u64, raw.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

fn parse_csv(text: &str) -> Result<Vec<ShiftEntry>> {
    let mut source_lines = Vec::new();
    let mut data = String::with_capacity(text.len());
    for (line_no, line) in data_lines(text) {
        source_lines.push(line_no);
        data.push_str(line);
        data.push('\n');
    }
    // csv positions count lines of `data`; map them back to the input.
    let source_line = |pos: Option<&csv::Position>| {
        pos.and_then(|p| p.line().checked_sub(1))
            .and_then(|i| source_lines.get(i as usize).copied())
            .unwrap_or(0)
    };

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(data.as_bytes());

    let mut out = Vec::new();
    let mut record = csv::StringRecord::new();
    loop {
        match rdr.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                return Err(ShiftSimError::MalformedRecord {
                    line: source_line(e.position()),
                    reason: e.to_string(),
                });
            }
        }
        let line = source_line(record.position());
        let row: ShiftRecord =
            record
                .deserialize(None)
                .map_err(|e| ShiftSimError::MalformedRecord {
                    line,
                    reason: e.to_string(),
                })?;
        out.push(row.into_entry(line)?);
    }
    Ok(out)
}

fn parse_whitespace(text: &str) -> Result<Vec<ShiftEntry>> {
    let mut out = Vec::new();
    for (line_no, line) in data_lines(text) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let malformed = |reason: String| ShiftSimError::MalformedRecord {
            line: line_no,
            reason,
        };
        let &[rid, rname, aname, shift] = fields.as_slice() else {
            return Err(malformed(format!(
                "expected 4 fields, found {} in '{}'",
                fields.len(),
                line
            )));
        };
        let residue_id = rid
            .parse::<i32>()
            .map_err(|e| malformed(format!("residue id '{rid}': {e}")))?;
        let shift_ppm = shift
            .parse::<f64>()
            .map_err(|e| malformed(format!("shift value '{shift}': {e}")))?;
        let record = ShiftRecord {
            residue_id,
            residue_name: rname.to_string(),
            atom_name: aname.to_string(),
            shift_ppm,
        };
        out.push(record.into_entry(line_no)?);
    }
    Ok(out)
}
