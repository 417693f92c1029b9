//! Gaussian rendering of peak lists into a dense 2D grid.
//!
//! Rows of the [`Grid`] follow the indirect dimension (dim2, Sparky w1) and
//! columns the direct dimension (dim1, Sparky w2).
//!
//! Each peak is the product of two 1D Gaussians whose full width at half
//! maximum is the axis linewidth converted to points, scaled so the maximum
//! equals the peak amplitude. Profiles are only evaluated within
//! [`TAIL_FWHMS`] linewidths of the centre; past that the contribution is
//! below the smallest positive `f32`.
//!
//! Peaks centred outside the grid are still drawn: whatever part of the
//! tail falls inside is accumulated. A peak whose window misses the grid
//! entirely contributes nothing and is reported as [`Placement::OutOfRange`].

use std::f64::consts::LN_2;

use tracing::{
    debug,
    warn,
};

use crate::errors::{
    Result,
    ShiftSimError,
};
use crate::models::{
    FrequencyAxis,
    Peak,
};

/// Half width of the evaluated window, in multiples of the linewidth.
pub const TAIL_FWHMS: f64 = 10.0;

/// Dense single precision intensity grid, row-major, `dim2_size` rows of
/// `dim1_size` values.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    dim2_size: usize,
    dim1_size: usize,
    data: Vec<f32>,
}

impl Grid {
    pub fn zeros(dim2_size: usize, dim1_size: usize) -> Self {
        Self {
            dim2_size,
            dim1_size,
            data: vec![0.0; dim2_size * dim1_size],
        }
    }

    /// Wraps existing row-major data, checking its length against the shape.
    pub fn from_vec(dim2_size: usize, dim1_size: usize, data: Vec<f32>) -> Result<Self> {
        if dim2_size.checked_mul(dim1_size) != Some(data.len()) {
            return Err(ShiftSimError::config(format!(
                "grid data has {} values, expected {} x {}",
                data.len(),
                dim2_size,
                dim1_size
            )));
        }
        Ok(Self {
            dim2_size,
            dim1_size,
            data,
        })
    }

    /// `(dim2_size, dim1_size)`, i.e. `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.dim2_size, self.dim1_size)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.dim2_size || col >= self.dim1_size {
            return None;
        }
        Some(self.data[row * self.dim1_size + col])
    }

    pub fn row(&self, row: usize) -> &[f32] {
        let start = row * self.dim1_size;
        &self.data[start..start + self.dim1_size]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Position and value of the largest element, first one on ties.
    pub fn argmax(&self) -> Option<((usize, usize), f32)> {
        let mut best: Option<(usize, f32)> = None;
        for (i, &v) in self.data.iter().enumerate() {
            match best {
                Some((_, b)) if v <= b => {}
                _ => best = Some((i, v)),
            }
        }
        best.map(|(i, v)| ((i / self.dim1_size, i % self.dim1_size), v))
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().map(|&x| x as f64).sum()
    }
}

/// Per-axis linewidths (Hz) and the amplitude used when none is given per peak.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lineshape {
    linewidth_hz_direct: f64,
    linewidth_hz_indirect: f64,
    amplitude: f32,
}

impl Lineshape {
    pub fn try_new(
        linewidth_hz_direct: f64,
        linewidth_hz_indirect: f64,
        amplitude: f32,
    ) -> Result<Self> {
        for (name, lw) in [
            ("direct", linewidth_hz_direct),
            ("indirect", linewidth_hz_indirect),
        ] {
            if !(lw.is_finite() && lw > 0.0) {
                return Err(ShiftSimError::config(format!(
                    "{name} linewidth must be positive and finite, got {lw} Hz"
                )));
            }
        }
        if !amplitude.is_finite() {
            return Err(ShiftSimError::config(format!(
                "amplitude must be finite, got {amplitude}"
            )));
        }
        Ok(Self {
            linewidth_hz_direct,
            linewidth_hz_indirect,
            amplitude,
        })
    }

    pub fn linewidth_hz_direct(&self) -> f64 {
        self.linewidth_hz_direct
    }

    pub fn linewidth_hz_indirect(&self) -> f64 {
        self.linewidth_hz_indirect
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }
}

/// Where a peak ended up relative to the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// At least part of the peak was accumulated. Coordinates are the
    /// fractional `(row, column)` centre, which may lie off-grid.
    Drawn { row: f64, col: f64 },
    OutOfRange,
}

/// Counts from one rendering pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SynthesisStats {
    pub num_drawn: usize,
    pub num_out_of_range: usize,
}

/// Sampled 1D Gaussian restricted to the part of the axis it touches.
struct Profile {
    start: usize,
    values: Vec<f64>,
}

impl Profile {
    fn sample(center: f64, fwhm: f64, size: usize) -> Option<Self> {
        if !center.is_finite() {
            return None;
        }
        let half_window = (TAIL_FWHMS * fwhm).ceil();
        let lo = (center - half_window).floor().max(0.0);
        let hi = (center + half_window).ceil().min(size as f64 - 1.0);
        if lo > hi {
            return None;
        }
        let (lo, hi) = (lo as usize, hi as usize);
        let scale = 4.0 * LN_2 / (fwhm * fwhm);
        let values = (lo..=hi)
            .map(|i| {
                let d = i as f64 - center;
                (-scale * d * d).exp()
            })
            .collect();
        Some(Self { start: lo, values })
    }
}

/// Renders peaks on the grid spanned by a direct and an indirect axis.
#[derive(Debug, Clone)]
pub struct SpectrumSynthesizer {
    direct: FrequencyAxis,
    indirect: FrequencyAxis,
    lineshape: Lineshape,
    fwhm_direct_pts: f64,
    fwhm_indirect_pts: f64,
}

impl SpectrumSynthesizer {
    /// Fails when the grid would not fit in memory addressing, or when a
    /// linewidth is too narrow to be sampled on its axis.
    pub fn try_new(
        direct: FrequencyAxis,
        indirect: FrequencyAxis,
        lineshape: Lineshape,
    ) -> Result<Self> {
        let grid_bytes = indirect
            .num_points()
            .checked_mul(direct.num_points())
            .and_then(|n| n.checked_mul(std::mem::size_of::<f32>()))
            .filter(|&bytes| bytes <= isize::MAX as usize);
        if grid_bytes.is_none() {
            return Err(ShiftSimError::config(format!(
                "grid of {} x {} points is too large",
                indirect.num_points(),
                direct.num_points()
            )));
        }

        let fwhm_direct_pts = direct.linewidth_points(lineshape.linewidth_hz_direct);
        let fwhm_indirect_pts = indirect.linewidth_points(lineshape.linewidth_hz_indirect);
        for (axis, fwhm) in [(&direct, fwhm_direct_pts), (&indirect, fwhm_indirect_pts)] {
            // The Gaussian exponent divides by fwhm^2.
            if !(fwhm * fwhm).is_normal() {
                return Err(ShiftSimError::config(format!(
                    "linewidth on axis {} is {} points, too small to render",
                    axis.label(),
                    fwhm
                )));
            }
        }
        debug!(
            "Linewidths in points: direct {:.3}, indirect {:.3}",
            fwhm_direct_pts, fwhm_indirect_pts
        );
        Ok(Self {
            direct,
            indirect,
            lineshape,
            fwhm_direct_pts,
            fwhm_indirect_pts,
        })
    }

    pub fn direct_axis(&self) -> &FrequencyAxis {
        &self.direct
    }

    pub fn indirect_axis(&self) -> &FrequencyAxis {
        &self.indirect
    }

    pub fn lineshape(&self) -> &Lineshape {
        &self.lineshape
    }

    /// Zeroed grid of shape `(indirect points, direct points)`.
    pub fn empty_grid(&self) -> Grid {
        Grid::zeros(self.indirect.num_points(), self.direct.num_points())
    }

    /// Adds one peak into `grid`. The grid must come from [`Self::empty_grid`]
    /// (or have the same shape).
    pub fn add_peak(&self, grid: &mut Grid, peak: &Peak, amplitude: f32) -> Placement {
        debug_assert_eq!(
            grid.shape(),
            (self.indirect.num_points(), self.direct.num_points())
        );
        let row = self.indirect.ppm_to_point(peak.dim2_ppm);
        let col = self.direct.ppm_to_point(peak.dim1_ppm);

        let (Some(rows), Some(cols)) = (
            Profile::sample(row, self.fwhm_indirect_pts, grid.dim2_size),
            Profile::sample(col, self.fwhm_direct_pts, grid.dim1_size),
        ) else {
            debug!(
                "Peak {} at ({}, {}) ppm -> ({:.1}, {:.1}) points is outside the grid",
                peak.label, peak.dim2_ppm, peak.dim1_ppm, row, col
            );
            return Placement::OutOfRange;
        };

        let amplitude = amplitude as f64;
        let width = grid.dim1_size;
        for (r_off, &rv) in rows.values.iter().enumerate() {
            let base = (rows.start + r_off) * width + cols.start;
            let target = &mut grid.data[base..base + cols.values.len()];
            for (cell, &cv) in target.iter_mut().zip(cols.values.iter()) {
                *cell += (amplitude * rv * cv) as f32;
            }
        }
        Placement::Drawn { row, col }
    }

    /// Adds every peak at the default amplitude.
    pub fn accumulate<'a, I>(&self, grid: &mut Grid, peaks: I) -> SynthesisStats
    where
        I: IntoIterator<Item = &'a Peak>,
    {
        let amplitude = self.lineshape.amplitude;
        self.accumulate_with_amplitudes(grid, peaks.into_iter().map(|p| (p, amplitude)))
    }

    pub fn accumulate_with_amplitudes<'a, I>(&self, grid: &mut Grid, peaks: I) -> SynthesisStats
    where
        I: IntoIterator<Item = (&'a Peak, f32)>,
    {
        let mut stats = SynthesisStats::default();
        for (peak, amplitude) in peaks {
            match self.add_peak(grid, peak, amplitude) {
                Placement::Drawn { .. } => stats.num_drawn += 1,
                Placement::OutOfRange => stats.num_out_of_range += 1,
            }
        }
        if stats.num_out_of_range > 0 {
            warn!(
                "{} peaks fell outside the spectral window and were not drawn",
                stats.num_out_of_range
            );
        }
        stats
    }

    /// Renders all peaks at the default amplitude into a fresh grid.
    pub fn synthesize(&self, peaks: &[Peak]) -> Grid {
        let mut grid = self.empty_grid();
        self.accumulate(&mut grid, peaks);
        grid
    }

    /// Renders peaks with one amplitude each.
    pub fn synthesize_with_amplitudes(&self, peaks: &[Peak], amplitudes: &[f32]) -> Result<Grid> {
        if peaks.len() != amplitudes.len() {
            return Err(ShiftSimError::config(format!(
                "got {} amplitudes for {} peaks",
                amplitudes.len(),
                peaks.len()
            )));
        }
        let mut grid = self.empty_grid();
        self.accumulate_with_amplitudes(&mut grid, peaks.iter().zip(amplitudes.iter().copied()));
        Ok(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_synth() -> SpectrumSynthesizer {
        // 1 point per 0.01 ppm on the proton axis, 0.1 ppm on nitrogen.
        let direct = FrequencyAxis::try_new("1H", 600.0, 8.0, 2.0, 200).unwrap();
        let indirect = FrequencyAxis::try_new("15N", 60.8, 120.0, 16.0, 160).unwrap();
        let lineshape = Lineshape::try_new(20.0, 20.0, 100.0).unwrap();
        SpectrumSynthesizer::try_new(direct, indirect, lineshape).unwrap()
    }

    fn assert_grids_close(a: &Grid, b: &Grid, tol: f32) {
        assert_eq!(a.shape(), b.shape());
        for (i, (x, y)) in a.as_slice().iter().zip(b.as_slice()).enumerate() {
            assert!((x - y).abs() <= tol, "index {i}: {x} vs {y}");
        }
    }

    #[test]
    fn test_empty_peak_list_gives_zero_grid() {
        let synth = small_synth();
        let grid = synth.synthesize(&[]);
        assert_eq!(grid.shape(), (160, 200));
        assert!(grid.as_slice().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_on_grid_peak_peaks_at_amplitude() {
        let synth = small_synth();
        // 8.5 ppm -> column 50, 124 ppm -> row 40, both exact grid points.
        let grid = synth.synthesize(&[Peak::new("A1H-N", 124.0, 8.5)]);
        let ((row, col), max) = grid.argmax().unwrap();
        assert_eq!((row, col), (40, 50));
        assert!((max - 100.0).abs() < 1e-3, "max was {max}");
    }

    #[test]
    fn test_half_maximum_at_half_linewidth() {
        let direct = FrequencyAxis::try_new("1H", 100.0, 0.0, 1.0, 100).unwrap();
        let indirect = FrequencyAxis::try_new("X", 100.0, 0.0, 1.0, 100).unwrap();
        // 4 Hz over a 100 Hz window of 100 points -> FWHM of 4 points.
        let synth = SpectrumSynthesizer::try_new(
            direct,
            indirect,
            Lineshape::try_new(4.0, 4.0, 1.0).unwrap(),
        )
        .unwrap();
        let grid = synth.synthesize(&[Peak::new("p", 0.0, 0.0)]);
        let centre = grid.get(50, 50).unwrap();
        let half = grid.get(50, 52).unwrap();
        assert!((centre - 1.0).abs() < 1e-6);
        assert!((half - 0.5).abs() < 1e-6, "half was {half}");
    }

    #[test]
    fn test_axes_are_not_swapped() {
        let synth = small_synth();
        // Low proton ppm -> large column index; high nitrogen ppm -> small row.
        let grid = synth.synthesize(&[Peak::new("p", 126.0, 7.2)]);
        let ((row, col), _) = grid.argmax().unwrap();
        assert_eq!(row, 20);
        assert_eq!(col, 180);
    }

    #[test]
    fn test_superposition_is_additive() {
        let synth = small_synth();
        let a = Peak::new("a", 120.0, 8.0);
        let b = Peak::new("b", 120.2, 8.03);
        let both = synth.synthesize(&[a.clone(), b.clone()]);
        let only_a = synth.synthesize(&[a]);
        let only_b = synth.synthesize(&[b]);
        let summed = Grid::from_vec(
            160,
            200,
            only_a
                .as_slice()
                .iter()
                .zip(only_b.as_slice())
                .map(|(x, y)| x + y)
                .collect(),
        )
        .unwrap();
        assert_grids_close(&both, &summed, 1e-4);
    }

    #[test]
    fn test_per_peak_amplitudes() {
        let synth = small_synth();
        let peaks = vec![Peak::new("a", 124.0, 8.5), Peak::new("b", 116.0, 7.5)];
        let grid = synth.synthesize_with_amplitudes(&peaks, &[10.0, 30.0]).unwrap();
        assert!((grid.get(40, 50).unwrap() - 10.0).abs() < 1e-4);
        assert!((grid.get(120, 150).unwrap() - 30.0).abs() < 1e-4);
        assert!(synth.synthesize_with_amplitudes(&peaks, &[1.0]).is_err());
    }

    #[test]
    fn test_out_of_range_peaks_do_not_crash() {
        let synth = small_synth();
        let mut grid = synth.empty_grid();
        let stats = synth.accumulate(
            &mut grid,
            &[
                Peak::new("far", 400.0, 50.0),
                Peak::new("nan", f64::NAN, 8.0),
                Peak::new("ok", 120.0, 8.0),
            ],
        );
        assert_eq!(stats.num_drawn, 1);
        assert_eq!(stats.num_out_of_range, 2);
        assert_eq!(grid.shape(), (160, 200));
    }

    #[test]
    fn test_peak_just_off_grid_leaves_a_tail() {
        let synth = small_synth();
        // Two points past the low-ppm edge of the proton axis.
        let mut grid = synth.empty_grid();
        let placement = synth.add_peak(&mut grid, &Peak::new("edge", 120.0, 6.98), 100.0);
        assert!(matches!(placement, Placement::Drawn { .. }));
        let ((_, col), max) = grid.argmax().unwrap();
        assert_eq!(col, 199);
        assert!(max > 0.0 && max < 100.0);
    }

    #[test]
    fn test_lineshape_validation() {
        assert!(Lineshape::try_new(0.0, 20.0, 1.0).is_err());
        assert!(Lineshape::try_new(20.0, f64::INFINITY, 1.0).is_err());
        assert!(Lineshape::try_new(20.0, 20.0, f32::NAN).is_err());
    }

    #[test]
    fn test_oversized_grid_is_a_configuration_error() {
        let huge = u32::MAX as usize;
        let direct = FrequencyAxis::try_new("1H", 600.0, 8.3, 4.0, huge).unwrap();
        let indirect = FrequencyAxis::try_new("15N", 60.8, 120.0, 20.0, huge).unwrap();
        let lineshape = Lineshape::try_new(20.0, 20.0, 100.0).unwrap();
        assert!(matches!(
            SpectrumSynthesizer::try_new(direct, indirect, lineshape),
            Err(ShiftSimError::Configuration(_))
        ));
    }

    #[test]
    fn test_vanishing_linewidth_is_rejected() {
        let direct = FrequencyAxis::try_new("1H", 600.0, 8.3, 4.0, 64).unwrap();
        let indirect = FrequencyAxis::try_new("15N", 60.8, 120.0, 20.0, 64).unwrap();
        // Valid in Hz, but its square in points underflows to zero.
        let lineshape = Lineshape::try_new(1e-200, 20.0, 100.0).unwrap();
        assert!(matches!(
            SpectrumSynthesizer::try_new(direct, indirect, lineshape),
            Err(ShiftSimError::Configuration(_))
        ));
    }
}
