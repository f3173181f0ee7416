//! Transforms applied to the images of a dataset before scoring

use crate::parsing::record::{Element, Record};
use crate::parsing::Dataset;

/// Pixel intensity above which `binarize` sets a pixel
pub const DEFAULT_THRESHOLD: f64 = 30.0;

/// Set every value above `threshold` to 1 and every other value to 0.
/// Only a threshold in [0, 1) leaves already binarized records unchanged
pub fn binarize_each<R: Record>(records: &mut [R], threshold: f64) {
    let on = R::Elem::from_u8(1);
    let off = R::Elem::from_u8(0);

    for record in records.iter_mut() {
        for i in 0..record.len() {
            let value = record.value_mut(i);
            *value = if value.to_f64() > threshold { on } else { off };
        }
    }
}

pub fn mean<R: Record>(record: &R) -> f64 {
    let total: f64 = (0..record.len()).map(|i| record.value(i).to_f64()).sum();
    total / record.len() as f64
}

/// Root mean square deviation of the values around `mean`
pub fn stddev<R: Record>(record: &R, mean: f64) -> f64 {
    let total: f64 = (0..record.len())
        .map(|i| {
            let delta = record.value(i).to_f64() - mean;
            delta * delta
        })
        .sum();

    (total / record.len() as f64).sqrt()
}

/// Shift each record to zero mean, then scale it to unit variance.
/// Records with no variance are left as they are
pub fn normalize_each<R: Record>(records: &mut [R]) {
    for record in records.iter_mut() {
        let m = mean(record);
        let s = stddev(record, m);
        if s == 0.0 || !s.is_finite() {
            continue;
        }

        for i in 0..record.len() {
            let value = record.value_mut(i);
            *value = R::Elem::from_f64((value.to_f64() - m) / s);
        }
    }
}

/// Binarize the training and test images. Labels are untouched
pub fn binarize_dataset<I: Record, L>(dataset: &mut Dataset<I, L>, threshold: f64) {
    binarize_each(&mut dataset.training_images, threshold);
    binarize_each(&mut dataset.test_images, threshold);
}

pub fn normalize_dataset<I: Record, L>(dataset: &mut Dataset<I, L>) {
    normalize_each(&mut dataset.training_images);
    normalize_each(&mut dataset.test_images);
}
