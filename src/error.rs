//! Errors that can stop a planning run.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Source '{name}' is not in the source catalogue")]
    SourceSpecification { name: String },

    #[error("No {kind} is between {min_deg}° and {max_deg}° elevation at {at}")]
    NoSuitableSource {
        kind: &'static str,
        at: String,
        min_deg: f64,
        max_deg: f64,
    },

    #[error("Invalid station set: {0}")]
    InvalidStationSet(String),

    #[error("The multi-beam grid around {target} doesn't fit on the sky: subband {max_subband} gives a spacing of {spacing_deg:.1}°")]
    BeamGrid {
        target: String,
        max_subband: u32,
        spacing_deg: f64,
    },

    #[error("Malformed schedule on line {line}: {msg}")]
    MalformedSchedule { line: usize, msg: String },

    #[error(transparent)]
    SubbandSpec(#[from] SubbandSpecError),

    #[error("Couldn't read schedule template {}: {err}", file.display())]
    Io {
        file: PathBuf,
        #[source]
        err: std::io::Error,
    },
}

/// Errors from parsing a textual subband specification like `12..499`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubbandSpecError {
    #[error("Subband specification is empty")]
    Empty,

    #[error("Couldn't parse '{item}' in subband specification '{spec}'")]
    BadItem { spec: String, item: String },

    #[error("Subband range {first}..{last} runs backwards in '{spec}'")]
    Reversed { spec: String, first: u32, last: u32 },

    #[error("Subband {subband} in '{spec}' is above the highest subband, {max}")]
    OutOfRange { spec: String, subband: u32, max: u32 },
}
