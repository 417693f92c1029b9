#![doc = include_str!("../README.md")]

// Re-export main structures
pub use crate::config::SimulationConfig;
pub use crate::correlations::{
    CorrelationMatcher,
    CorrelationRule,
    MatchOutcome,
};
pub use crate::models::{
    FrequencyAxis,
    Peak,
    ShiftEntry,
    ShiftTable,
};
pub use crate::synthesis::{
    Grid,
    Lineshape,
    SpectrumSynthesizer,
    SynthesisStats,
};

// Declare modules
pub mod config;
pub mod correlations;
pub mod errors;
pub mod io;
pub mod models;
pub mod residues;
pub mod synthesis;

// Re-export errors
pub use crate::errors::{
    Result,
    ShiftSimError,
};
