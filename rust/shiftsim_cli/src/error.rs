use indicatif::style::TemplateError;
use shiftsim::ShiftSimError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    ShiftSim(#[from] ShiftSimError),

    #[error("Progress bar template error: {0}")]
    ProgressTemplate(#[from] TemplateError),

    #[error("Configuration error: {0}")]
    Config(String),
}
