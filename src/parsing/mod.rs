use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::IdxError;

pub mod buffer;
pub mod header;
pub mod mnist;
pub mod record;

use mnist::{read_image_file, read_label_file};
use record::{Label, LabelMode, Record};

/// Folder the corpus files are looked up in by default
pub const DEFAULT_FOLDER: &str = "mnist";

pub const TRAINING_IMAGES_FILE: &str = "train-images-idx3-ubyte";
pub const TRAINING_LABELS_FILE: &str = "train-labels-idx1-ubyte";
pub const TEST_IMAGES_FILE: &str = "t10k-images-idx3-ubyte";
pub const TEST_LABELS_FILE: &str = "t10k-labels-idx1-ubyte";

/// A corpus split into training and test sets.
/// Within a split there are as many labels as images
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset<I, L> {
    pub training_images: Vec<I>,
    pub training_labels: Vec<L>,
    pub test_images: Vec<I>,
    pub test_labels: Vec<L>,
}

impl<I, L> Dataset<I, L> {
    /// Shrink the training set to `new_size` records. Never grows it
    pub fn resize_training(&mut self, new_size: usize) {
        if self.training_images.len() > new_size {
            self.training_images.truncate(new_size);
            self.training_labels.truncate(new_size);
        }
    }

    /// Shrink the test set to `new_size` records. Never grows it
    pub fn resize_test(&mut self, new_size: usize) {
        if self.test_images.len() > new_size {
            self.test_images.truncate(new_size);
            self.test_labels.truncate(new_size);
        }
    }

    pub fn training_len(&self) -> usize {
        self.training_images.len()
    }

    pub fn test_len(&self) -> usize {
        self.test_images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.training_images.is_empty() && self.test_images.is_empty()
    }
}

/// Location of the four files of a corpus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPaths {
    pub training_images: PathBuf,
    pub training_labels: PathBuf,
    pub test_images: PathBuf,
    pub test_labels: PathBuf,
}

impl DatasetPaths {
    /// The standard file names inside `folder`
    pub fn in_folder<P: AsRef<Path>>(folder: P) -> DatasetPaths {
        let folder = folder.as_ref();

        DatasetPaths {
            training_images: folder.join(TRAINING_IMAGES_FILE),
            training_labels: folder.join(TRAINING_LABELS_FILE),
            test_images: folder.join(TEST_IMAGES_FILE),
            test_labels: folder.join(TEST_LABELS_FILE),
        }
    }
}

impl Default for DatasetPaths {
    fn default() -> Self {
        DatasetPaths::in_folder(DEFAULT_FOLDER)
    }
}

fn check_split(split: &'static str, images: usize, labels: usize) -> Result<(), IdxError> {
    if images != labels {
        return Err(IdxError::SplitMismatch {
            split,
            images,
            labels,
        });
    }

    Ok(())
}

/// Read the four files of a corpus. A limit of 0 reads the whole split.
/// Missing files leave their split empty
pub fn read_dataset_from<I: Record, L: Label>(
    paths: &DatasetPaths,
    training_limit: usize,
    test_limit: usize,
    mode: LabelMode,
) -> Result<Dataset<I, L>, IdxError> {
    let dataset = Dataset {
        training_images: read_image_file(&paths.training_images, training_limit, 0)?,
        training_labels: read_label_file(&paths.training_labels, training_limit, 0, mode)?,
        test_images: read_image_file(&paths.test_images, test_limit, 0)?,
        test_labels: read_label_file(&paths.test_labels, test_limit, 0, mode)?,
    };

    check_split(
        "training",
        dataset.training_images.len(),
        dataset.training_labels.len(),
    )?;
    check_split("test", dataset.test_images.len(), dataset.test_labels.len())?;

    info!(
        training = dataset.training_len(),
        test = dataset.test_len(),
        "Loaded dataset"
    );

    Ok(dataset)
}

/// Read the corpus in `folder` with class-index labels
pub fn read_dataset<I: Record, L: Label, P: AsRef<Path>>(
    folder: P,
    training_limit: usize,
    test_limit: usize,
) -> Result<Dataset<I, L>, IdxError> {
    read_dataset_from(
        &DatasetPaths::in_folder(folder),
        training_limit,
        test_limit,
        LabelMode::Scalar,
    )
}

/// Read the corpus in `folder` with one-hot labels of width `classes`
pub fn read_categorical_dataset<I: Record, L: Label, P: AsRef<Path>>(
    folder: P,
    training_limit: usize,
    test_limit: usize,
    classes: usize,
) -> Result<Dataset<I, L>, IdxError> {
    read_dataset_from(
        &DatasetPaths::in_folder(folder),
        training_limit,
        test_limit,
        LabelMode::Categorical { classes },
    )
}

/// Read the corpus from the default `mnist` folder
pub fn read_default_dataset<I: Record, L: Label>(
    training_limit: usize,
    test_limit: usize,
) -> Result<Dataset<I, L>, IdxError> {
    read_dataset(DEFAULT_FOLDER, training_limit, test_limit)
}
