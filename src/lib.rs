//! Reader for the IDX files the MNIST family of handwritten-digit corpora
//! ships in, with per-image preprocessing and a logistic regression scorer.

pub mod error;
pub mod model;
pub mod parsing;
pub mod preprocessing;

pub use error::{IdxError, ModelError};
pub use parsing::{read_dataset, Dataset, DatasetPaths};
