//! Simulation settings.
//!
//! Everything a run needs is held in one [`SimulationConfig`] value, which
//! serializes to the JSON accepted by the command line `--config` flag.
//! Missing sections or fields fall back to an H-N HSQC at 600 MHz.

use serde::{
    Deserialize,
    Deserializer,
    Serialize,
};

use crate::correlations::CorrelationMatcher;
use crate::errors::{
    Result,
    ShiftSimError,
};
use crate::models::FrequencyAxis;
use crate::synthesis::{
    Lineshape,
    SpectrumSynthesizer,
};

/// Backbone amide, Asn/Gln side chain NH2 and Trp indole NH.
/// Pairs are written indirect atom first.
pub const DEFAULT_INTRA_CORRELATIONS: [&str; 12] = [
    "N", "H", "ND2", "HD21", "ND2", "HD22", "NE2", "HE21", "NE2", "HE22", "NE1", "HE1",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub correlations: CorrelationConfig,
    #[serde(
        default = "AxisConfig::default_direct",
        deserialize_with = "deserialize_direct_axis"
    )]
    pub direct_axis: AxisConfig,
    #[serde(
        default = "AxisConfig::default_indirect",
        deserialize_with = "deserialize_indirect_axis"
    )]
    pub indirect_axis: AxisConfig,
    #[serde(default)]
    pub lineshape: LineshapeConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Flat, even-length list of atom names, consumed two at a time.
    pub intra: Vec<String>,
    /// Sequential residue offsets. Only 0 (intra-residue) produces peaks.
    pub inter: Vec<i32>,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            intra: DEFAULT_INTRA_CORRELATIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            inter: vec![0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    pub label: String,
    pub observe_freq_mhz: f64,
    pub center_ppm: f64,
    pub sweep_width_ppm: f64,
    pub num_points: usize,
}

impl AxisConfig {
    pub fn default_direct() -> Self {
        Self {
            label: "1H".to_string(),
            observe_freq_mhz: 600.0,
            center_ppm: 8.30,
            sweep_width_ppm: 4.00,
            num_points: 4096,
        }
    }

    pub fn default_indirect() -> Self {
        Self {
            label: "15N".to_string(),
            observe_freq_mhz: 60.7639142,
            center_ppm: 120.00,
            sweep_width_ppm: 20.00,
            num_points: 4096,
        }
    }

    pub fn build(&self) -> Result<FrequencyAxis> {
        FrequencyAxis::try_new(
            self.label.clone(),
            self.observe_freq_mhz,
            self.center_ppm,
            self.sweep_width_ppm,
            self.num_points,
        )
    }
}

/// Axis section as written in a file; missing fields come from the
/// defaults of the axis it configures.
#[derive(Debug, Deserialize)]
struct PartialAxisConfig {
    label: Option<String>,
    observe_freq_mhz: Option<f64>,
    center_ppm: Option<f64>,
    sweep_width_ppm: Option<f64>,
    num_points: Option<usize>,
}

impl PartialAxisConfig {
    fn merge_onto(self, base: AxisConfig) -> AxisConfig {
        AxisConfig {
            label: self.label.unwrap_or(base.label),
            observe_freq_mhz: self.observe_freq_mhz.unwrap_or(base.observe_freq_mhz),
            center_ppm: self.center_ppm.unwrap_or(base.center_ppm),
            sweep_width_ppm: self.sweep_width_ppm.unwrap_or(base.sweep_width_ppm),
            num_points: self.num_points.unwrap_or(base.num_points),
        }
    }
}

fn deserialize_direct_axis<'de, D>(deserializer: D) -> std::result::Result<AxisConfig, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(PartialAxisConfig::deserialize(deserializer)?.merge_onto(AxisConfig::default_direct()))
}

fn deserialize_indirect_axis<'de, D>(deserializer: D) -> std::result::Result<AxisConfig, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(PartialAxisConfig::deserialize(deserializer)?.merge_onto(AxisConfig::default_indirect()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineshapeConfig {
    pub linewidth_hz_direct: f64,
    pub linewidth_hz_indirect: f64,
    pub amplitude: f32,
}

impl Default for LineshapeConfig {
    fn default() -> Self {
        Self {
            linewidth_hz_direct: 20.0,
            linewidth_hz_indirect: 20.0,
            amplitude: 100.0,
        }
    }
}

impl LineshapeConfig {
    pub fn build(&self) -> Result<Lineshape> {
        Lineshape::try_new(
            self.linewidth_hz_direct,
            self.linewidth_hz_indirect,
            self.amplitude,
        )
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            correlations: CorrelationConfig::default(),
            direct_axis: AxisConfig::default_direct(),
            indirect_axis: AxisConfig::default_indirect(),
            lineshape: LineshapeConfig::default(),
        }
    }
}

impl SimulationConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s)
            .map_err(|e| ShiftSimError::config(format!("invalid configuration JSON: {e}")))
    }

    pub fn matcher(&self) -> Result<CorrelationMatcher> {
        CorrelationMatcher::from_flat(&self.correlations.intra, &self.correlations.inter)
    }

    pub fn synthesizer(&self) -> Result<SpectrumSynthesizer> {
        SpectrumSynthesizer::try_new(
            self.direct_axis.build()?,
            self.indirect_axis.build()?,
            self.lineshape.build()?,
        )
    }

    /// Checks every section without running anything.
    pub fn validate(&self) -> Result<()> {
        self.matcher()?;
        self.synthesizer()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_hsqc() {
        let conf = SimulationConfig::default();
        assert_eq!(conf.direct_axis.label, "1H");
        assert_eq!(conf.indirect_axis.label, "15N");
        assert_eq!(conf.correlations.inter, vec![0]);
        assert_eq!(conf.matcher().unwrap().rules().len(), 6);
        assert!(conf.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let conf = SimulationConfig::from_json_str(
            r#"{ "indirect_axis": { "label": "13C", "observe_freq_mhz": 150.9, "center_ppm": 40.0, "sweep_width_ppm": 80.0, "num_points": 1024 },
                 "lineshape": { "amplitude": 5.0 } }"#,
        )
        .unwrap();
        assert_eq!(conf.indirect_axis.label, "13C");
        assert_eq!(conf.direct_axis, AxisConfig::default_direct());
        assert_eq!(conf.lineshape.amplitude, 5.0);
        assert_eq!(conf.lineshape.linewidth_hz_direct, 20.0);
        assert_eq!(conf.correlations, CorrelationConfig::default());
    }

    #[test]
    fn test_partial_axis_uses_that_axis_defaults() {
        let conf = SimulationConfig::from_json_str(
            r#"{ "direct_axis": { "num_points": 512 }, "indirect_axis": { "center_ppm": 118.0 } }"#,
        )
        .unwrap();
        assert_eq!(
            conf.direct_axis,
            AxisConfig {
                num_points: 512,
                ..AxisConfig::default_direct()
            }
        );
        assert_eq!(
            conf.indirect_axis,
            AxisConfig {
                center_ppm: 118.0,
                ..AxisConfig::default_indirect()
            }
        );

        let conf = SimulationConfig::from_json_str(r#"{ "indirect_axis": {} }"#).unwrap();
        assert_eq!(conf, SimulationConfig::default());
    }

    #[test]
    fn test_axis_field_types_are_checked() {
        let err = SimulationConfig::from_json_str(r#"{ "direct_axis": { "num_points": "many" } }"#)
            .unwrap_err();
        assert!(matches!(err, ShiftSimError::Configuration(_)));
    }

    #[test]
    fn test_json_roundtrip() {
        let conf = SimulationConfig::default();
        let text = serde_json::to_string_pretty(&conf).unwrap();
        assert_eq!(SimulationConfig::from_json_str(&text).unwrap(), conf);
    }

    #[test]
    fn test_validate_rejects_unallocatable_grids() {
        let mut conf = SimulationConfig::default();
        conf.direct_axis.num_points = u32::MAX as usize;
        conf.indirect_axis.num_points = u32::MAX as usize;
        assert!(matches!(
            conf.validate(),
            Err(ShiftSimError::Configuration(_))
        ));
    }

    #[test]
    fn test_validate_rejects_odd_rules() {
        let mut conf = SimulationConfig::default();
        conf.correlations.intra.pop();
        assert!(matches!(
            conf.validate(),
            Err(ShiftSimError::Configuration(_))
        ));
    }
}
