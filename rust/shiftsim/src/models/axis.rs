use crate::errors::{
    Result,
    ShiftSimError,
};

/// Largest point count an axis can have; UCSF headers store it as `u32`.
pub const MAX_AXIS_POINTS: usize = u32::MAX as usize;

/// Calibration of one spectral dimension.
///
/// Convention (same as Sparky): point 0 sits at the highest ppm of the
/// window, `center_ppm + sweep_width_ppm / 2`, and ppm decreases by
/// `sweep_width_ppm / num_points` for every point after that.
///
/// ```
/// use shiftsim::FrequencyAxis;
///
/// let axis = FrequencyAxis::try_new("1H", 600.0, 8.3, 4.0, 4096).unwrap();
/// assert!(axis.ppm_to_point(10.3).abs() < 1e-9);
/// assert!((axis.ppm_to_point(8.3) - 2048.0).abs() < 1e-9);
/// assert!((axis.point_to_ppm(2048.0) - 8.3).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyAxis {
    label: String,
    observe_freq_mhz: f64,
    center_ppm: f64,
    sweep_width_ppm: f64,
    num_points: usize,
}

impl FrequencyAxis {
    pub fn try_new(
        label: impl Into<String>,
        observe_freq_mhz: f64,
        center_ppm: f64,
        sweep_width_ppm: f64,
        num_points: usize,
    ) -> Result<Self> {
        let label = label.into();
        if !(observe_freq_mhz.is_finite() && observe_freq_mhz > 0.0) {
            return Err(ShiftSimError::config(format!(
                "axis {label}: observe frequency must be positive and finite, got {observe_freq_mhz}"
            )));
        }
        if !center_ppm.is_finite() {
            return Err(ShiftSimError::config(format!(
                "axis {label}: center must be finite, got {center_ppm}"
            )));
        }
        if !(sweep_width_ppm.is_finite() && sweep_width_ppm > 0.0) {
            return Err(ShiftSimError::config(format!(
                "axis {label}: sweep width must be positive and finite, got {sweep_width_ppm}"
            )));
        }
        if num_points == 0 {
            return Err(ShiftSimError::config(format!(
                "axis {label}: number of points must be non-zero"
            )));
        }
        if num_points > MAX_AXIS_POINTS {
            return Err(ShiftSimError::config(format!(
                "axis {label}: {num_points} points exceeds the limit of {MAX_AXIS_POINTS}"
            )));
        }
        Ok(Self {
            label,
            observe_freq_mhz,
            center_ppm,
            sweep_width_ppm,
            num_points,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn observe_freq_mhz(&self) -> f64 {
        self.observe_freq_mhz
    }

    pub fn center_ppm(&self) -> f64 {
        self.center_ppm
    }

    pub fn sweep_width_ppm(&self) -> f64 {
        self.sweep_width_ppm
    }

    pub fn num_points(&self) -> usize {
        self.num_points
    }

    pub fn center_hz(&self) -> f64 {
        self.observe_freq_mhz * self.center_ppm
    }

    pub fn sweep_hz(&self) -> f64 {
        self.observe_freq_mhz * self.sweep_width_ppm
    }

    /// Signed ppm step between consecutive points (negative).
    fn delta_ppm(&self) -> f64 {
        -self.sweep_width_ppm / self.num_points as f64
    }

    /// ppm value at point 0.
    fn first_ppm(&self) -> f64 {
        self.center_ppm + self.sweep_width_ppm / 2.0
    }

    /// Fractional point index of a ppm value. Values outside the window map
    /// outside `[0, num_points)`; no clamping happens here.
    pub fn ppm_to_point(&self, ppm: f64) -> f64 {
        (ppm - self.first_ppm()) / self.delta_ppm()
    }

    pub fn point_to_ppm(&self, point: f64) -> f64 {
        point * self.delta_ppm() + self.first_ppm()
    }

    /// Lowest and highest ppm covered by the axis.
    pub fn ppm_limits(&self) -> (f64, f64) {
        let half = self.sweep_width_ppm / 2.0;
        (self.center_ppm - half, self.center_ppm + half)
    }

    /// Converts a linewidth in Hz into points on this axis.
    pub fn linewidth_points(&self, linewidth_hz: f64) -> f64 {
        (linewidth_hz / self.sweep_hz()) * self.num_points as f64
    }
}
