use indicatif::{
    ProgressIterator,
    ProgressStyle,
};
use std::ffi::OsString;
use std::path::{
    Path,
    PathBuf,
};
use std::time::Instant;

use shiftsim::io::{
    InputFormat,
    read_peak_list_file,
    read_shift_table_file,
    write_peak_list_file,
    write_ucsf_file,
};
use shiftsim::{
    Peak,
    SimulationConfig,
};
use tracing::{
    info,
    instrument,
};

use crate::cli::{
    CorrelationOverrides,
    RenderArgs,
    SimulateArgs,
    SpectrumOverrides,
    WriteTemplateArgs,
};
use crate::error::CliError;

const TEMPLATE_FILE_NAME: &str = "shiftsim_config.json";

/// Main function for the 'simulate' subcommand.
#[instrument]
pub fn main_simulate(args: SimulateArgs) -> Result<(), CliError> {
    let config = resolve_config(
        args.config.as_deref(),
        Some(&args.correlations),
        &args.spectrum,
    )?;
    let peaks = match_shift_table(&args.infile, args.file_type, &config)?;
    write_peak_list_file(output_path(&args.out_prefix, "list"), &peaks)?;
    render_spectrum(&peaks, &config, &output_path(&args.out_prefix, "ucsf"))?;
    Ok(())
}

/// Main function for the 'peaks' subcommand.
#[instrument]
pub fn main_peaks(args: SimulateArgs) -> Result<(), CliError> {
    let config = resolve_config(
        args.config.as_deref(),
        Some(&args.correlations),
        &args.spectrum,
    )?;
    let peaks = match_shift_table(&args.infile, args.file_type, &config)?;
    write_peak_list_file(output_path(&args.out_prefix, "list"), &peaks)?;
    Ok(())
}

/// Main function for the 'render' subcommand.
#[instrument]
pub fn main_render(args: RenderArgs) -> Result<(), CliError> {
    let config = resolve_config(args.config.as_deref(), None, &args.spectrum)?;
    let peaks = read_peak_list_file(&args.peak_list)?;
    render_spectrum(&peaks, &config, &output_path(&args.out_prefix, "ucsf"))?;
    Ok(())
}

#[instrument]
pub fn main_write_template(args: WriteTemplateArgs) -> Result<(), CliError> {
    let target_dir = args.output_path;
    std::fs::create_dir_all(&target_dir)?;

    let config_path = target_dir.join(TEMPLATE_FILE_NAME);
    let text = serde_json::to_string_pretty(&SimulationConfig::default())?;
    std::fs::write(&config_path, text)?;
    println!("Wrote configuration template to: {}", config_path.display());
    Ok(())
}

/// Defaults, then the JSON file, then command line flags.
pub fn resolve_config(
    config_path: Option<&Path>,
    correlations: Option<&CorrelationOverrides>,
    spectrum: &SpectrumOverrides,
) -> Result<SimulationConfig, CliError> {
    let mut config = match config_path {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| {
                CliError::Config(format!("cannot read {}: {}", path.display(), e))
            })?;
            info!("Loading configuration from {}", path.display());
            SimulationConfig::from_json_str(&text)?
        }
        None => SimulationConfig::default(),
    };
    if let Some(correlations) = correlations {
        correlations.apply(&mut config);
    }
    spectrum.apply(&mut config);

    config.validate()?;
    info!("Using configuration: {:#?}", config);
    Ok(config)
}

fn match_shift_table(
    path: &Path,
    format: InputFormat,
    config: &SimulationConfig,
) -> Result<Vec<Peak>, CliError> {
    let matcher = config.matcher()?;
    let table = read_shift_table_file(path, format)?;
    Ok(matcher.match_peaks(&table).peaks)
}

#[instrument(skip_all)]
fn render_spectrum(
    peaks: &[Peak],
    config: &SimulationConfig,
    path: &Path,
) -> Result<(), CliError> {
    let start = Instant::now();
    let synth = config.synthesizer()?;
    let mut grid = synth.empty_grid();

    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})",
    )?;
    let stats = synth.accumulate(&mut grid, peaks.iter().progress_with_style(style));
    info!(
        "Drew {} peaks ({} outside the window) in {:?}",
        stats.num_drawn,
        stats.num_out_of_range,
        start.elapsed()
    );

    write_ucsf_file(path, &grid, synth.direct_axis(), synth.indirect_axis())?;
    Ok(())
}

/// `<prefix>.<ext>`, keeping any dots already in the prefix.
fn output_path(prefix: &Path, ext: &str) -> PathBuf {
    let mut name = OsString::from(prefix.as_os_str());
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}
