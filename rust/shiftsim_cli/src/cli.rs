use clap::{
    Parser,
    Subcommand,
};
use shiftsim::SimulationConfig;
use shiftsim::io::InputFormat;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Simulate a peak list and a spectrum from a chemical shift table.
    Simulate(SimulateArgs),
    /// Only write the peak list for a chemical shift table.
    Peaks(SimulateArgs),
    /// Render the spectrum of an existing Sparky peak list.
    Render(RenderArgs),
    /// Write the default configuration file.
    WriteTemplate(WriteTemplateArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct SimulateArgs {
    /// Chemical shift table: residue id, residue name, atom name, shift (ppm).
    #[arg(short, long)]
    pub infile: PathBuf,

    /// Prefix of the output files (`<prefix>.list`, `<prefix>.ucsf`).
    #[arg(short, long, default_value = "hsqc")]
    pub out_prefix: PathBuf,

    /// Field separator of the shift table.
    #[arg(short = 't', long, default_value_t, value_enum)]
    pub file_type: InputFormat,

    /// JSON configuration file. Flags given on the command line win over it.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub correlations: CorrelationOverrides,

    #[command(flatten)]
    pub spectrum: SpectrumOverrides,
}

#[derive(Parser, Debug, Clone)]
pub struct RenderArgs {
    /// Sparky peak list to render.
    #[arg(short, long)]
    pub peak_list: PathBuf,

    /// Prefix of the output spectrum (`<prefix>.ucsf`).
    #[arg(short, long, default_value = "hsqc")]
    pub out_prefix: PathBuf,

    /// JSON configuration file. Flags given on the command line win over it.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub spectrum: SpectrumOverrides,
}

#[derive(Parser, Debug)]
pub struct WriteTemplateArgs {
    /// Directory the template is written to.
    #[arg(short, long)]
    pub output_path: PathBuf,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct CorrelationOverrides {
    /// Intra-residue correlations as atom pairs, indirect atom first
    /// (e.g. `-c N H ND2 HD21`).
    #[arg(short = 'c', long, num_args = 1..)]
    pub intra_corr: Option<Vec<String>>,

    /// Sequential residue offsets. Only 0 produces peaks.
    #[arg(short = 's', long, num_args = 1.., allow_negative_numbers = true)]
    pub inter_corr: Option<Vec<i32>>,
}

impl CorrelationOverrides {
    pub fn apply(&self, config: &mut SimulationConfig) {
        if let Some(intra) = &self.intra_corr {
            config.correlations.intra = intra.clone();
        }
        if let Some(inter) = &self.inter_corr {
            config.correlations.inter = inter.clone();
        }
    }
}

/// Axis and lineshape flags. nuc1 is the direct dimension, nuc2 the
/// indirect one.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SpectrumOverrides {
    #[arg(long)]
    pub nuc1_label: Option<String>,
    #[arg(long)]
    pub nuc2_label: Option<String>,

    /// Observe frequency (MHz).
    #[arg(long)]
    pub nuc1_freq: Option<f64>,
    /// Observe frequency (MHz).
    #[arg(long)]
    pub nuc2_freq: Option<f64>,

    /// Center of the window (ppm).
    #[arg(long, allow_negative_numbers = true)]
    pub nuc1_center: Option<f64>,
    /// Center of the window (ppm).
    #[arg(long, allow_negative_numbers = true)]
    pub nuc2_center: Option<f64>,

    /// Sweep width (ppm).
    #[arg(long)]
    pub nuc1_sw: Option<f64>,
    /// Sweep width (ppm).
    #[arg(long)]
    pub nuc2_sw: Option<f64>,

    /// Number of points.
    #[arg(long)]
    pub nuc1_size: Option<usize>,
    /// Number of points.
    #[arg(long)]
    pub nuc2_size: Option<usize>,

    /// Linewidth, full width at half maximum (Hz).
    #[arg(long)]
    pub nuc1_lw: Option<f64>,
    /// Linewidth, full width at half maximum (Hz).
    #[arg(long)]
    pub nuc2_lw: Option<f64>,

    /// Peak height.
    #[arg(long)]
    pub amplitude: Option<f32>,
}

impl SpectrumOverrides {
    pub fn apply(&self, config: &mut SimulationConfig) {
        let direct = &mut config.direct_axis;
        if let Some(label) = &self.nuc1_label {
            direct.label = label.clone();
        }
        if let Some(v) = self.nuc1_freq {
            direct.observe_freq_mhz = v;
        }
        if let Some(v) = self.nuc1_center {
            direct.center_ppm = v;
        }
        if let Some(v) = self.nuc1_sw {
            direct.sweep_width_ppm = v;
        }
        if let Some(v) = self.nuc1_size {
            direct.num_points = v;
        }

        let indirect = &mut config.indirect_axis;
        if let Some(label) = &self.nuc2_label {
            indirect.label = label.clone();
        }
        if let Some(v) = self.nuc2_freq {
            indirect.observe_freq_mhz = v;
        }
        if let Some(v) = self.nuc2_center {
            indirect.center_ppm = v;
        }
        if let Some(v) = self.nuc2_sw {
            indirect.sweep_width_ppm = v;
        }
        if let Some(v) = self.nuc2_size {
            indirect.num_points = v;
        }

        let lineshape = &mut config.lineshape;
        if let Some(v) = self.nuc1_lw {
            lineshape.linewidth_hz_direct = v;
        }
        if let Some(v) = self.nuc2_lw {
            lineshape.linewidth_hz_indirect = v;
        }
        if let Some(v) = self.amplitude {
            lineshape.amplitude = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simulate_flags() {
        let args = Args::try_parse_from([
            "shiftsim",
            "simulate",
            "-i",
            "shifts.csv",
            "-c",
            "N",
            "H",
            "-s",
            "0",
            "-1",
            "--nuc1-size",
            "512",
            "--nuc2-center",
            "118.5",
        ])
        .unwrap();
        let sim = match args.command {
            Some(Commands::Simulate(sim)) => sim,
            other => panic!("expected simulate, got {other:?}"),
        };
        assert_eq!(sim.infile, PathBuf::from("shifts.csv"));
        assert_eq!(sim.out_prefix, PathBuf::from("hsqc"));
        assert_eq!(sim.file_type, InputFormat::Auto);
        assert_eq!(
            sim.correlations.intra_corr,
            Some(vec!["N".to_string(), "H".to_string()])
        );
        assert_eq!(sim.correlations.inter_corr, Some(vec![0, -1]));

        let mut config = SimulationConfig::default();
        sim.correlations.apply(&mut config);
        sim.spectrum.apply(&mut config);
        assert_eq!(config.correlations.intra, vec!["N", "H"]);
        assert_eq!(config.direct_axis.num_points, 512);
        assert_eq!(config.indirect_axis.num_points, 4096);
        assert_eq!(config.indirect_axis.center_ppm, 118.5);
    }

    #[test]
    fn test_no_flags_keep_config() {
        let mut config = SimulationConfig::default();
        config.lineshape.amplitude = 3.0;
        let expected = config.clone();
        CorrelationOverrides::default().apply(&mut config);
        SpectrumOverrides::default().apply(&mut config);
        assert_eq!(config, expected);
    }

    #[test]
    fn test_infile_is_required() {
        assert!(Args::try_parse_from(["shiftsim", "simulate"]).is_err());
    }
}
