//! Sparky UCSF spectrum files (2D, real data only).
//!
//! Layout, all big-endian:
//!
//! | bytes           | content                                             |
//! |-----------------|-----------------------------------------------------|
//! | 180             | file header (`UCSF NMR`, naxis, ncomponents, ...)   |
//! | 128 per axis    | axis header, w1 (indirect) first                    |
//! | rest            | `f32` data split in tiles, tiles in row-major order |
//!
//! Each tile is itself row-major and is zero padded where it sticks out
//! past the edge of the spectrum.

use std::io::{
    BufReader,
    BufWriter,
    Read,
    Write,
};
use std::path::Path;
use tracing::{
    debug,
    info,
};

use crate::errors::{
    Result,
    ShiftSimError,
};
use crate::models::FrequencyAxis;
use crate::synthesis::Grid;

const FILE_HEADER_LEN: usize = 180;
const AXIS_HEADER_LEN: usize = 128;
const IDENT: &[u8] = b"UCSF NMR";
const NUCLEUS_LEN: usize = 6;
const FORMAT_VERSION: u8 = 2;
const MAX_TILE_BYTES: usize = 128 * 1024;

/// Calibration stored in one UCSF axis header.
#[derive(Debug, Clone, PartialEq)]
pub struct UcsfAxis {
    pub nucleus: String,
    pub num_points: usize,
    pub tile_size: usize,
    pub spectrometer_freq_mhz: f32,
    pub spectral_width_hz: f32,
    pub center_ppm: f32,
}

impl UcsfAxis {
    fn from_axis(axis: &FrequencyAxis, tile_size: usize) -> Self {
        Self {
            nucleus: axis.label().to_string(),
            num_points: axis.num_points(),
            tile_size,
            spectrometer_freq_mhz: axis.observe_freq_mhz() as f32,
            spectral_width_hz: axis.sweep_hz() as f32,
            center_ppm: axis.center_ppm() as f32,
        }
    }

    /// Rebuilds the ppm/point calibration. Values carry `f32` precision.
    pub fn to_frequency_axis(&self) -> Result<FrequencyAxis> {
        let obs = self.spectrometer_freq_mhz as f64;
        FrequencyAxis::try_new(
            self.nucleus.clone(),
            obs,
            self.center_ppm as f64,
            self.spectral_width_hz as f64 / obs,
            self.num_points,
        )
    }

    fn encode(&self) -> [u8; AXIS_HEADER_LEN] {
        let mut buf = [0u8; AXIS_HEADER_LEN];
        let nucleus = self.nucleus.as_bytes();
        let n = nucleus.len().min(NUCLEUS_LEN);
        buf[..n].copy_from_slice(&nucleus[..n]);
        // 6..8 spectral shift, left at 0
        // Point counts come from a FrequencyAxis, so they fit in u32.
        buf[8..12].copy_from_slice(&(self.num_points as u32).to_be_bytes());
        buf[12..16].copy_from_slice(&(self.num_points as u32).to_be_bytes());
        buf[16..20].copy_from_slice(&(self.tile_size as u32).to_be_bytes());
        buf[20..24].copy_from_slice(&self.spectrometer_freq_mhz.to_be_bytes());
        buf[24..28].copy_from_slice(&self.spectral_width_hz.to_be_bytes());
        buf[28..32].copy_from_slice(&self.center_ppm.to_be_bytes());
        // 32..44 zero order, first order, first point scale; 44.. extended
        buf
    }

    fn decode(buf: &[u8; AXIS_HEADER_LEN]) -> Result<Self> {
        let nucleus = String::from_utf8_lossy(&buf[..NUCLEUS_LEN])
            .trim_end_matches('\0')
            .trim()
            .to_string();
        let num_points = be_u32(&buf[8..12]) as usize;
        let tile_size = be_u32(&buf[16..20]) as usize;
        if num_points == 0 || tile_size == 0 {
            return Err(ShiftSimError::InvalidSpectrumFile(format!(
                "axis {nucleus} has {num_points} points and tile size {tile_size}"
            )));
        }
        Ok(Self {
            nucleus,
            num_points,
            tile_size,
            spectrometer_freq_mhz: be_f32(&buf[20..24]),
            spectral_width_hz: be_f32(&buf[24..28]),
            center_ppm: be_f32(&buf[28..32]),
        })
    }
}

/// A spectrum read back from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct UcsfSpectrum {
    /// w1, the row axis of `grid`.
    pub indirect: UcsfAxis,
    /// w2, the column axis of `grid`.
    pub direct: UcsfAxis,
    pub grid: Grid,
}

fn be_u32(b: &[u8]) -> u32 {
    u32::from_be_bytes([b[0], b[1], b[2], b[3]])
}

fn be_f32(b: &[u8]) -> f32 {
    f32::from_be_bytes([b[0], b[1], b[2], b[3]])
}

/// Tile shape used for a spectrum of `shape` points: the largest dimension
/// is halved (rounding up) until a tile fits in 128 KiB.
pub fn tile_shape(shape: (usize, usize)) -> (usize, usize) {
    let mut tile = [shape.0, shape.1];
    while tile[0] * tile[1] * std::mem::size_of::<f32>() > MAX_TILE_BYTES {
        let largest = if tile[1] > tile[0] { 1 } else { 0 };
        tile[largest] = tile[largest].div_ceil(2);
    }
    (tile[0], tile[1])
}

fn file_header() -> [u8; FILE_HEADER_LEN] {
    let mut buf = [0u8; FILE_HEADER_LEN];
    buf[..IDENT.len()].copy_from_slice(IDENT);
    buf[10] = 2; // naxis
    buf[11] = 1; // ncomponents, real data
    buf[12] = 0; // encoding
    buf[13] = FORMAT_VERSION;
    buf
}

/// Writes `grid` with the calibration of both axes. The grid must have
/// shape `(indirect points, direct points)`.
pub fn write_ucsf<W: Write>(
    mut writer: W,
    grid: &Grid,
    direct: &FrequencyAxis,
    indirect: &FrequencyAxis,
) -> Result<()> {
    let (rows, cols) = grid.shape();
    if (rows, cols) != (indirect.num_points(), direct.num_points()) {
        return Err(ShiftSimError::config(format!(
            "grid shape {:?} does not match axes ({} x {})",
            grid.shape(),
            indirect.num_points(),
            direct.num_points()
        )));
    }
    let (tile_rows, tile_cols) = tile_shape((rows, cols));
    debug!("Writing UCSF with tile shape {}x{}", tile_rows, tile_cols);

    writer.write_all(&file_header())?;
    writer.write_all(&UcsfAxis::from_axis(indirect, tile_rows).encode())?;
    writer.write_all(&UcsfAxis::from_axis(direct, tile_cols).encode())?;

    let mut tile_buf = Vec::with_capacity(tile_rows * tile_cols * 4);
    for tr in 0..rows.div_ceil(tile_rows) {
        for tc in 0..cols.div_ceil(tile_cols) {
            tile_buf.clear();
            for r in tr * tile_rows..(tr + 1) * tile_rows {
                for c in tc * tile_cols..(tc + 1) * tile_cols {
                    let v = grid.get(r, c).unwrap_or(0.0);
                    tile_buf.extend_from_slice(&v.to_be_bytes());
                }
            }
            writer.write_all(&tile_buf)?;
        }
    }
    writer.flush()?;
    Ok(())
}

pub fn write_ucsf_file<T: AsRef<Path>>(
    path: T,
    grid: &Grid,
    direct: &FrequencyAxis,
    indirect: &FrequencyAxis,
) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path).map_err(|e| ShiftSimError::io_at(e, path))?;
    write_ucsf(BufWriter::new(file), grid, direct, indirect).map_err(|e| match e {
        ShiftSimError::Io { source, .. } => ShiftSimError::io_at(source, path),
        other => other,
    })?;
    let (rows, cols) = grid.shape();
    info!("Spectrum of {}x{} points written to {}", rows, cols, path.display());
    Ok(())
}

pub fn read_ucsf<R: Read>(reader: R) -> Result<UcsfSpectrum> {
    let mut reader = BufReader::new(reader);
    let mut header = [0u8; FILE_HEADER_LEN];
    reader.read_exact(&mut header)?;
    if &header[..IDENT.len()] != IDENT {
        return Err(ShiftSimError::InvalidSpectrumFile(
            "missing 'UCSF NMR' identifier".to_string(),
        ));
    }
    let (naxis, ncomponents) = (header[10], header[11]);
    if naxis != 2 {
        return Err(ShiftSimError::InvalidSpectrumFile(format!(
            "only 2D spectra are supported, file has {naxis} axes"
        )));
    }
    if ncomponents != 1 {
        return Err(ShiftSimError::InvalidSpectrumFile(format!(
            "only real data is supported, file has {ncomponents} components"
        )));
    }

    let mut axis_buf = [0u8; AXIS_HEADER_LEN];
    reader.read_exact(&mut axis_buf)?;
    let indirect = UcsfAxis::decode(&axis_buf)?;
    reader.read_exact(&mut axis_buf)?;
    let direct = UcsfAxis::decode(&axis_buf)?;

    let (rows, cols) = (indirect.num_points, direct.num_points);
    let (tile_rows, tile_cols) = (indirect.tile_size, direct.tile_size);
    let num_values = rows.checked_mul(cols).ok_or_else(|| {
        ShiftSimError::InvalidSpectrumFile(format!("{rows} x {cols} points is too large"))
    })?;
    let mut data = vec![0.0f32; num_values];
    let mut tile_buf = vec![0u8; tile_rows * tile_cols * 4];
    for tr in 0..rows.div_ceil(tile_rows) {
        for tc in 0..cols.div_ceil(tile_cols) {
            reader.read_exact(&mut tile_buf).map_err(|e| {
                ShiftSimError::InvalidSpectrumFile(format!(
                    "truncated data in tile ({tr}, {tc}): {e}"
                ))
            })?;
            for (i, chunk) in tile_buf.chunks_exact(4).enumerate() {
                let r = tr * tile_rows + i / tile_cols;
                let c = tc * tile_cols + i % tile_cols;
                if r < rows && c < cols {
                    data[r * cols + c] = be_f32(chunk);
                }
            }
        }
    }

    Ok(UcsfSpectrum {
        indirect,
        direct,
        grid: Grid::from_vec(rows, cols, data)?,
    })
}

pub fn read_ucsf_file<T: AsRef<Path>>(path: T) -> Result<UcsfSpectrum> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| ShiftSimError::io_at(e, path))?;
    read_ucsf(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axes(direct_pts: usize, indirect_pts: usize) -> (FrequencyAxis, FrequencyAxis) {
        (
            FrequencyAxis::try_new("1H", 600.0, 8.3, 4.0, direct_pts).unwrap(),
            FrequencyAxis::try_new("15N", 60.7639142, 120.0, 20.0, indirect_pts).unwrap(),
        )
    }

    #[test]
    fn test_tile_shape() {
        assert_eq!(tile_shape((4096, 4096)), (128, 256));
        assert_eq!(tile_shape((100, 60)), (100, 60));
        assert_eq!(tile_shape((1024, 512)), (128, 256));
        assert_eq!(tile_shape((301, 301)), (151, 151));
    }

    #[test]
    fn test_header_layout() {
        let (direct, indirect) = axes(8, 4);
        let grid = Grid::zeros(4, 8);
        let mut buf = Vec::new();
        write_ucsf(&mut buf, &grid, &direct, &indirect).unwrap();

        assert_eq!(buf.len(), FILE_HEADER_LEN + 2 * AXIS_HEADER_LEN + 4 * 8 * 4);
        assert_eq!(&buf[..10], b"UCSF NMR\0\0");
        assert_eq!(&buf[10..14], &[2, 1, 0, 2]);
        let w1 = &buf[FILE_HEADER_LEN..FILE_HEADER_LEN + AXIS_HEADER_LEN];
        assert_eq!(&w1[..6], b"15N\0\0\0");
        assert_eq!(be_u32(&w1[8..12]), 4);
        let w2 = &buf[FILE_HEADER_LEN + AXIS_HEADER_LEN..FILE_HEADER_LEN + 2 * AXIS_HEADER_LEN];
        assert_eq!(&w2[..6], b"1H\0\0\0\0");
        assert_eq!(be_f32(&w2[24..28]), 2400.0);
        assert_eq!(be_f32(&w2[28..32]), 8.3f32);
    }

    #[test]
    fn test_roundtrip_with_partial_tiles() {
        // 301 x 301 does not split evenly into 151 x 151 tiles.
        let (direct, indirect) = axes(301, 301);
        let data: Vec<f32> = (0..301 * 301).map(|i| (i % 977) as f32 * 0.5).collect();
        let grid = Grid::from_vec(301, 301, data).unwrap();

        let mut buf = Vec::new();
        write_ucsf(&mut buf, &grid, &direct, &indirect).unwrap();
        assert_eq!(buf.len(), FILE_HEADER_LEN + 2 * AXIS_HEADER_LEN + 4 * 151 * 151 * 4);

        let back = read_ucsf(buf.as_slice()).unwrap();
        assert_eq!(back.grid, grid);
        assert_eq!(back.indirect.nucleus, "15N");
        assert_eq!(back.direct.nucleus, "1H");
    }

    #[test]
    fn test_calibration_survives_roundtrip() {
        let (direct, indirect) = axes(64, 32);
        let mut buf = Vec::new();
        write_ucsf(&mut buf, &Grid::zeros(32, 64), &direct, &indirect).unwrap();
        let back = read_ucsf(buf.as_slice()).unwrap();

        for (orig, stored) in [(&direct, &back.direct), (&indirect, &back.indirect)] {
            let rebuilt = stored.to_frequency_axis().unwrap();
            for pt in [0.0, 10.5, 31.0] {
                let a = orig.point_to_ppm(pt);
                let b = rebuilt.point_to_ppm(pt);
                assert!((a - b).abs() < 1e-4, "{a} vs {b}");
            }
        }
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let (direct, indirect) = axes(8, 4);
        let mut buf = Vec::new();
        assert!(write_ucsf(&mut buf, &Grid::zeros(8, 4), &direct, &indirect).is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        let err = read_ucsf(vec![0u8; 500].as_slice()).unwrap_err();
        assert!(matches!(err, ShiftSimError::InvalidSpectrumFile(_)));

        let (direct, indirect) = axes(8, 4);
        let mut buf = Vec::new();
        write_ucsf(&mut buf, &Grid::zeros(4, 8), &direct, &indirect).unwrap();
        buf.truncate(buf.len() - 4);
        let err = read_ucsf(buf.as_slice()).unwrap_err();
        assert!(matches!(err, ShiftSimError::InvalidSpectrumFile(_)));
    }
}
