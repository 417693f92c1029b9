//! Sparky style `.list` peak lists.
//!
//! ```text
//!       Assignment         w1         w2
//!
//!           G12H-N      115.0        8.1
//! ```
//!
//! `w1` is the indirect dimension (dim2) and `w2` the direct one (dim1).
//! Numbers are written with the shortest representation that parses back
//! to the same `f64`, so writing and re-reading a list is lossless.

use std::io::{
    BufRead,
    BufReader,
    BufWriter,
    Read,
    Write,
};
use std::path::Path;
use tracing::info;

use crate::errors::{
    Result,
    ShiftSimError,
};
use crate::models::Peak;

/// Header line as Sparky writes it, trailing spaces included.
pub const PEAK_LIST_HEADER: &str = "      Assignment         w1         w2  ";
const LABEL_WIDTH: usize = 17;
const VALUE_WIDTH: usize = 11;

/// Right-justifies a number in its column, keeping at least one space in
/// front of it so overlong values never merge with the previous column.
fn value_column(value: f64) -> String {
    let text = format!("{value:?}");
    if text.len() >= VALUE_WIDTH {
        format!(" {text}")
    } else {
        format!("{text:>VALUE_WIDTH$}")
    }
}

/// Formats one peak as a fixed width record, without the newline.
pub fn format_peak(peak: &Peak) -> String {
    format!(
        "{:>LABEL_WIDTH$}{}{}",
        peak.label,
        value_column(peak.dim2_ppm),
        value_column(peak.dim1_ppm),
    )
}

pub fn write_peak_list<W: Write>(mut writer: W, peaks: &[Peak]) -> Result<()> {
    writeln!(writer, "{PEAK_LIST_HEADER}")?;
    writeln!(writer)?;
    for peak in peaks {
        writeln!(writer, "{}", format_peak(peak))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_peak_list_file<T: AsRef<Path>>(path: T, peaks: &[Peak]) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path).map_err(|e| ShiftSimError::io_at(e, path))?;
    write_peak_list(BufWriter::new(file), peaks)
        .map_err(|e| match e {
            ShiftSimError::Io { source, .. } => ShiftSimError::io_at(source, path),
            other => other,
        })?;
    info!("List of {} peaks written to {}", peaks.len(), path.display());
    Ok(())
}

/// Parses a peak list. Header lines and blank lines are skipped; columns
/// past `w2` (e.g. data heights) are ignored.
pub fn read_peak_list<R: Read>(reader: R) -> Result<Vec<Peak>> {
    let mut peaks = Vec::new();
    for (i, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        let line_no = (i + 1) as u64;
        let mut fields = line.split_whitespace();
        let Some(label) = fields.next() else {
            continue;
        };
        if label == "Assignment" {
            continue;
        }
        let mut value = |name: &str| -> Result<f64> {
            let raw = fields.next().ok_or_else(|| ShiftSimError::MalformedPeakList {
                line: line_no,
                reason: format!("missing {name} column"),
            })?;
            raw.parse::<f64>()
                .map_err(|e| ShiftSimError::MalformedPeakList {
                    line: line_no,
                    reason: format!("{name} value '{raw}': {e}"),
                })
        };
        let dim2_ppm = value("w1")?;
        let dim1_ppm = value("w2")?;
        peaks.push(Peak::new(label, dim2_ppm, dim1_ppm));
    }
    Ok(peaks)
}

pub fn read_peak_list_file<T: AsRef<Path>>(path: T) -> Result<Vec<Peak>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| ShiftSimError::io_at(e, path))?;
    let peaks = read_peak_list(file)?;
    info!("Read {} peaks from {}", peaks.len(), path.display());
    Ok(peaks)
}
