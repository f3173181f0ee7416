use super::buffer::{load, ByteCursor};
use super::header::{FileKind, Header};
use super::record::{Element, Label, LabelMode, Record};
use crate::error::IdxError;
use ndarray::{Array1, Array2};
use std::path::Path;
use tracing::debug;

/// The records selected from one file: a cursor on the first selected record
/// and the number of records to read from there
struct Records<'a> {
    header: Header,
    cursor: ByteCursor<'a>,
    count: usize,
}

impl<'a> Records<'a> {
    /// Check the header of `bytes` and position on record `start`.
    /// `limit == 0` means no limit
    fn select(
        bytes: &'a [u8],
        kind: FileKind,
        limit: usize,
        start: usize,
    ) -> Result<Records<'a>, IdxError> {
        let header = Header::parse(bytes, kind)?;
        header.validate_length(bytes.len())?;

        let declared = header.count as usize;
        let skipped = start.min(declared);
        let available = declared - skipped;
        let count = if limit > 0 && limit < available {
            limit
        } else {
            available
        };

        let mut cursor = ByteCursor::new(bytes);
        let offset = header.header_size() + skipped * header.record_size();
        cursor.skip(offset).ok_or(IdxError::Truncated {
            expected: offset,
            actual: bytes.len(),
        })?;

        debug!(
            ?kind,
            declared,
            start = skipped,
            count,
            "Selected IDX records"
        );

        Ok(Records {
            header,
            cursor,
            count,
        })
    }

    /// Bytes of the next record
    fn next_record(&mut self) -> Result<&'a [u8], IdxError> {
        let size = self.header.record_size();
        let position = self.cursor.position();

        self.cursor.take(size).ok_or(IdxError::Truncated {
            expected: position + size,
            actual: position + self.cursor.remaining(),
        })
    }
}

/// Decode the images of an IDX image file held in `bytes`.
/// Skips the first `start` images and reads at most `limit` of them (0 reads all)
pub fn decode_images<R: Record>(
    bytes: &[u8],
    limit: usize,
    start: usize,
) -> Result<Vec<R>, IdxError> {
    decode_images_with(bytes, limit, start, R::allocate)
}

/// Same as `decode_images`, with storage for each image created by
/// `factory(rows, columns)`
pub fn decode_images_with<R, F>(
    bytes: &[u8],
    limit: usize,
    start: usize,
    mut factory: F,
) -> Result<Vec<R>, IdxError>
where
    R: Record,
    F: FnMut(usize, usize) -> R,
{
    let mut records = Records::select(bytes, FileKind::Images, limit, start)?;
    let rows = records.header.rows as usize;
    let columns = records.header.columns as usize;
    let mut images = Vec::with_capacity(records.count);

    for _ in 0..records.count {
        let pixels = records.next_record()?;
        let mut image = factory(rows, columns);

        if image.len() != pixels.len() {
            return Err(IdxError::RecordShape {
                expected: pixels.len(),
                actual: image.len(),
            });
        }

        for (j, &pixel) in pixels.iter().enumerate() {
            *image.value_mut(j) = R::Elem::from_u8(pixel);
        }

        images.push(image);
    }

    Ok(images)
}

/// Decode the labels of an IDX label file held in `bytes`
pub fn decode_labels<L: Label>(
    bytes: &[u8],
    limit: usize,
    start: usize,
    mode: LabelMode,
) -> Result<Vec<L>, IdxError> {
    let mut records = Records::select(bytes, FileKind::Labels, limit, start)?;
    let mut labels = Vec::with_capacity(records.count);

    for _ in 0..records.count {
        let class = records.next_record()?[0];
        labels.push(L::encode(class, mode)?);
    }

    Ok(labels)
}

/// Read an image file. A missing file gives no images
pub fn read_image_file<R: Record, P: AsRef<Path>>(
    path: P,
    limit: usize,
    start: usize,
) -> Result<Vec<R>, IdxError> {
    read_image_file_with(path, limit, start, R::allocate)
}

pub fn read_image_file_with<R, F, P>(
    path: P,
    limit: usize,
    start: usize,
    factory: F,
) -> Result<Vec<R>, IdxError>
where
    R: Record,
    F: FnMut(usize, usize) -> R,
    P: AsRef<Path>,
{
    match load(path) {
        Some(bytes) => decode_images_with(&bytes, limit, start, factory),
        None => Ok(Vec::new()),
    }
}

/// Read a label file. A missing file gives no labels
pub fn read_label_file<L: Label, P: AsRef<Path>>(
    path: P,
    limit: usize,
    start: usize,
    mode: LabelMode,
) -> Result<Vec<L>, IdxError> {
    match load(path) {
        Some(bytes) => decode_labels(&bytes, limit, start, mode),
        None => Ok(Vec::new()),
    }
}

fn check_destination(
    (rows, columns): (usize, usize),
    needed_rows: usize,
    needed_columns: usize,
) -> Result<(), IdxError> {
    if rows < needed_rows || columns < needed_columns {
        return Err(IdxError::DestinationTooSmall {
            rows,
            columns,
            needed_rows,
            needed_columns,
        });
    }

    Ok(())
}

/// Read an image file into a pre-allocated matrix, one image per row.
/// Returns false if the file is missing
pub fn read_image_file_flat<E: Element, P: AsRef<Path>>(
    images: &mut Array2<E>,
    path: P,
    limit: usize,
    start: usize,
) -> Result<bool, IdxError> {
    let Some(bytes) = load(path) else {
        return Ok(false);
    };
    let mut records = Records::select(&bytes, FileKind::Images, limit, start)?;
    check_destination(images.dim(), records.count, records.header.record_size())?;

    for i in 0..records.count {
        let pixels = records.next_record()?;
        for (j, &pixel) in pixels.iter().enumerate() {
            images[[i, j]] = E::from_u8(pixel);
        }
    }

    Ok(true)
}

/// Read a label file into a pre-allocated vector of class indices.
/// Returns false if the file is missing
pub fn read_label_file_flat<E: Element, P: AsRef<Path>>(
    labels: &mut Array1<E>,
    path: P,
    limit: usize,
    start: usize,
) -> Result<bool, IdxError> {
    let Some(bytes) = load(path) else {
        return Ok(false);
    };
    let mut records = Records::select(&bytes, FileKind::Labels, limit, start)?;
    check_destination((labels.dim(), 1), records.count, 1)?;

    for i in 0..records.count {
        labels[i] = E::from_u8(records.next_record()?[0]);
    }

    Ok(true)
}

/// Read a label file into a pre-allocated, zeroed matrix of one-hot rows
/// (one column per class). Returns false if the file is missing
pub fn read_label_file_categorical<E: Element, P: AsRef<Path>>(
    labels: &mut Array2<E>,
    path: P,
    limit: usize,
    start: usize,
) -> Result<bool, IdxError> {
    let Some(bytes) = load(path) else {
        return Ok(false);
    };
    let mut records = Records::select(&bytes, FileKind::Labels, limit, start)?;
    check_destination(labels.dim(), records.count, 0)?;
    let classes = labels.ncols();

    for i in 0..records.count {
        let class = records.next_record()?[0];
        if class as usize >= classes {
            return Err(IdxError::ClassOutOfRange { class, classes });
        }
        labels[[i, class as usize]] = E::from_u8(1);
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::header::{IMAGE_MAGIC, LABEL_MAGIC};
    use ndarray::{arr1, arr2, Array3};
    use std::fs;

    fn idx_bytes(header: &[u32], body: &[u8]) -> Vec<u8> {
        let mut bytes: Vec<u8> = header.iter().flat_map(|f| f.to_be_bytes()).collect();
        bytes.extend_from_slice(body);
        bytes
    }

    fn images() -> Vec<u8> {
        idx_bytes(&[IMAGE_MAGIC, 3, 2, 2], &[10, 20, 30, 40, 50, 60, 70, 80, 250, 251, 252, 253])
    }

    fn labels() -> Vec<u8> {
        idx_bytes(&[LABEL_MAGIC, 3], &[3, 7, 1])
    }

    #[test]
    fn test_decode_images() {
        let decoded: Vec<Vec<u8>> = decode_images(&images(), 0, 0).unwrap();

        assert_eq!(
            decoded,
            vec![vec![10, 20, 30, 40], vec![50, 60, 70, 80], vec![250, 251, 252, 253]]
        );
    }

    #[test]
    fn test_limit_clamps_never_extends() {
        let bytes = images();

        assert_eq!(decode_images::<Vec<u8>>(&bytes, 2, 0).unwrap().len(), 2);
        assert_eq!(decode_images::<Vec<u8>>(&bytes, 3, 0).unwrap().len(), 3);
        assert_eq!(decode_images::<Vec<u8>>(&bytes, 100, 0).unwrap().len(), 3);
        assert_eq!(decode_labels::<u8>(&labels(), 1, 0, LabelMode::Scalar).unwrap(), vec![3]);
    }

    #[test]
    fn test_start_skips_records() {
        let bytes = images();
        let all: Vec<Vec<f32>> = decode_images(&bytes, 0, 0).unwrap();
        let skipped: Vec<Vec<f32>> = decode_images(&bytes, 0, 1).unwrap();

        assert_eq!(skipped.len(), 2);
        assert_eq!(skipped[0], all[1]);
        assert_eq!(decode_images::<Vec<f32>>(&bytes, 1, 2).unwrap(), vec![all[2].clone()]);
        assert!(decode_images::<Vec<f32>>(&bytes, 0, 5).unwrap().is_empty());

        let labels: Vec<i32> = decode_labels(&labels(), 0, 2, LabelMode::Scalar).unwrap();
        assert_eq!(labels, vec![1]);
    }

    #[test]
    fn test_grid_and_channel_shapes() {
        let grids: Vec<Array2<u8>> = decode_images(&images(), 1, 0).unwrap();
        assert_eq!(grids[0], arr2(&[[10, 20], [30, 40]]));

        let cubes: Vec<Array3<f64>> = decode_images(&images(), 1, 1).unwrap();
        assert_eq!(cubes[0].dim(), (1, 2, 2));
        assert_eq!(cubes[0][[0, 1, 0]], 70.0);
    }

    #[test]
    fn test_factory_shape_is_checked() {
        let result = decode_images_with(&images(), 0, 0, |_, _| vec![0u8; 3]);

        assert_eq!(
            result,
            Err(IdxError::RecordShape {
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn test_categorical_labels() {
        let one_hot: Vec<Vec<u8>> =
            decode_labels(&labels(), 0, 1, LabelMode::Categorical { classes: 10 }).unwrap();

        assert_eq!(one_hot.len(), 2);
        assert_eq!(one_hot[0], vec![0, 0, 0, 0, 0, 0, 0, 1, 0, 0]);
        assert_eq!(one_hot[1].iter().position(|&v| v == 1), Some(1));

        let narrow = decode_labels::<Vec<u8>>(&labels(), 0, 0, LabelMode::Categorical { classes: 5 });
        assert_eq!(
            narrow,
            Err(IdxError::ClassOutOfRange {
                class: 7,
                classes: 5
            })
        );
    }

    #[test]
    fn test_wrong_file_kind() {
        let result = decode_labels::<u8>(&images(), 0, 0, LabelMode::Scalar);

        assert_eq!(
            result,
            Err(IdxError::MagicMismatch {
                expected: LABEL_MAGIC,
                actual: IMAGE_MAGIC
            })
        );
    }

    #[test]
    fn test_truncated_file() {
        let mut bytes = images();
        bytes.pop();

        assert_eq!(
            decode_images::<Vec<u8>>(&bytes, 1, 0),
            Err(IdxError::Truncated {
                expected: 28,
                actual: 27
            })
        );
    }

    #[test]
    fn test_zero_sized_images_are_rejected() {
        let bytes = idx_bytes(&[IMAGE_MAGIC, u32::MAX, 0, 0], &[]);

        assert_eq!(
            decode_images::<Vec<u8>>(&bytes, 0, 0),
            Err(IdxError::EmptyRecords {
                count: u32::MAX,
                rows: 0,
                columns: 0
            })
        );
    }

    #[test]
    fn test_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("train-images-idx3-ubyte");

        assert!(read_image_file::<Vec<u8>, _>(&missing, 0, 0).unwrap().is_empty());
        assert!(read_label_file::<u8, _>(&missing, 0, 0, LabelMode::Scalar)
            .unwrap()
            .is_empty());

        let mut matrix = Array2::<f32>::zeros((3, 4));
        assert_eq!(read_image_file_flat(&mut matrix, &missing, 0, 0), Ok(false));
    }

    #[test]
    fn test_flat_variants() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("images");
        let label_path = dir.path().join("labels");
        fs::write(&image_path, images()).unwrap();
        fs::write(&label_path, labels()).unwrap();

        let mut matrix = Array2::<f64>::zeros((2, 4));
        assert_eq!(read_image_file_flat(&mut matrix, &image_path, 0, 1), Ok(true));
        assert_eq!(
            matrix,
            arr2(&[[50.0, 60.0, 70.0, 80.0], [250.0, 251.0, 252.0, 253.0]])
        );

        let mut small = Array2::<f64>::zeros((2, 4));
        assert!(matches!(
            read_image_file_flat(&mut small, &image_path, 0, 0),
            Err(IdxError::DestinationTooSmall { .. })
        ));

        let mut classes = Array1::<u8>::zeros(3);
        assert_eq!(read_label_file_flat(&mut classes, &label_path, 0, 0), Ok(true));
        assert_eq!(classes, arr1(&[3, 7, 1]));

        let mut one_hot = Array2::<f32>::zeros((2, 10));
        assert_eq!(
            read_label_file_categorical(&mut one_hot, &label_path, 2, 1),
            Ok(true)
        );
        assert_eq!(one_hot[[0, 7]], 1.0);
        assert_eq!(one_hot[[1, 1]], 1.0);
        assert_eq!(one_hot.sum(), 2.0);
    }
}
