//! Error types for the IDX reader and the linear scorer

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while decoding IDX files.
///
/// A missing file is not an error: decoders report it as an empty result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdxError {
    #[error("Invalid IDX magic: expected 0x{expected:08X}, got 0x{actual:08X}")]
    MagicMismatch { expected: u32, actual: u32 },

    #[error("IDX data truncated: need {expected} bytes, buffer holds {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("Image header declares {count} records of {rows}x{columns} pixels")]
    EmptyRecords { count: u32, rows: u32, columns: u32 },

    #[error("Label {class} out of range for {classes} classes")]
    ClassOutOfRange { class: u8, classes: usize },

    #[error("Categorical labels need a class count")]
    MissingClassCount,

    #[error("Record holds {actual} elements, expected {expected}")]
    RecordShape { expected: usize, actual: usize },

    #[error("Destination is {rows}x{columns}, need at least {needed_rows}x{needed_columns}")]
    DestinationTooSmall {
        rows: usize,
        columns: usize,
        needed_rows: usize,
        needed_columns: usize,
    },

    #[error("{split} split has {images} images but {labels} labels")]
    SplitMismatch {
        split: &'static str,
        images: usize,
        labels: usize,
    },
}

/// Errors raised by the linear scorer.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Feature vector has {actual} values, model expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Failed to read weights from {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid weight file: {0}")]
    InvalidWeights(String),
}
