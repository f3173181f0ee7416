//! Storage for decoded records.
//!
//! `Element` is the numeric type of a single pixel or scalar label, `Record`
//! is a container of pixels for one image, and `Label` is anything a label
//! byte can be decoded into (a class index or a one-hot vector).

use crate::error::IdxError;
use ndarray::{Array1, Array2, Array3};
use std::fmt::Debug;

/// Numeric type that can hold a pixel or a class index
pub trait Element: Copy + Default + PartialEq + Debug {
    /// Widen a raw (always unsigned) byte
    fn from_u8(byte: u8) -> Self;
    /// Convert back from a computed value, with `as` semantics for integers
    fn from_f64(value: f64) -> Self;
    fn to_f64(self) -> f64;
}

macro_rules! impl_element {
    ($($t:ty),*) => {
        $(
            impl Element for $t {
                fn from_u8(byte: u8) -> Self {
                    byte as $t
                }

                fn from_f64(value: f64) -> Self {
                    value as $t
                }

                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_element!(u8, u16, u32, i32, i64, usize, f32, f64);

/// Container for the pixels of one image, addressed in row-major order
pub trait Record {
    type Elem: Element;

    /// Create a zeroed record for a `rows` x `columns` image
    fn allocate(rows: usize, columns: usize) -> Self
    where
        Self: Sized;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn value(&self, index: usize) -> Self::Elem;

    fn value_mut(&mut self, index: usize) -> &mut Self::Elem;
}

impl<E: Element> Record for Vec<E> {
    type Elem = E;

    fn allocate(rows: usize, columns: usize) -> Self {
        vec![E::default(); rows * columns]
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn value(&self, index: usize) -> E {
        self[index]
    }

    fn value_mut(&mut self, index: usize) -> &mut E {
        &mut self[index]
    }
}

impl<E: Element> Record for Array1<E> {
    type Elem = E;

    fn allocate(rows: usize, columns: usize) -> Self {
        Array1::from_elem(rows * columns, E::default())
    }

    fn len(&self) -> usize {
        self.dim()
    }

    fn value(&self, index: usize) -> E {
        self[index]
    }

    fn value_mut(&mut self, index: usize) -> &mut E {
        &mut self[index]
    }
}

/// A `rows` x `columns` grid
impl<E: Element> Record for Array2<E> {
    type Elem = E;

    fn allocate(rows: usize, columns: usize) -> Self {
        Array2::from_elem((rows, columns), E::default())
    }

    fn len(&self) -> usize {
        let (rows, columns) = self.dim();
        rows * columns
    }

    fn value(&self, index: usize) -> E {
        let columns = self.ncols();
        self[[index / columns, index % columns]]
    }

    fn value_mut(&mut self, index: usize) -> &mut E {
        let columns = self.ncols();
        &mut self[[index / columns, index % columns]]
    }
}

/// A single channel image, shaped `1` x `rows` x `columns`
impl<E: Element> Record for Array3<E> {
    type Elem = E;

    fn allocate(rows: usize, columns: usize) -> Self {
        Array3::from_elem((1, rows, columns), E::default())
    }

    fn len(&self) -> usize {
        let (channels, rows, columns) = self.dim();
        channels * rows * columns
    }

    fn value(&self, index: usize) -> E {
        self[grid_index3(self.dim(), index)]
    }

    fn value_mut(&mut self, index: usize) -> &mut E {
        let idx = grid_index3(self.dim(), index);
        &mut self[idx]
    }
}

fn grid_index3((_, rows, columns): (usize, usize, usize), index: usize) -> [usize; 3] {
    let plane = rows * columns;
    [index / plane, (index % plane) / columns, index % columns]
}

/// How label bytes are turned into labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelMode {
    /// The class index itself
    Scalar,
    /// A one-hot vector of width `classes`
    Categorical { classes: usize },
}

/// Anything a label byte decodes into
pub trait Label: Sized {
    fn encode(class: u8, mode: LabelMode) -> Result<Self, IdxError>;
}

fn check_class(class: u8, classes: usize) -> Result<usize, IdxError> {
    let index = class as usize;
    if index >= classes {
        return Err(IdxError::ClassOutOfRange { class, classes });
    }

    Ok(index)
}

macro_rules! impl_scalar_label {
    ($($t:ty),*) => {
        $(
            impl Label for $t {
                fn encode(class: u8, mode: LabelMode) -> Result<Self, IdxError> {
                    if let LabelMode::Categorical { classes } = mode {
                        check_class(class, classes)?;
                    }

                    Ok(<$t as Element>::from_u8(class))
                }
            }
        )*
    };
}

impl_scalar_label!(u8, u16, u32, i32, i64, usize, f32, f64);

/// Construct the one-hot encoding of `class`
fn one_hot<E: Element>(class: u8, mode: LabelMode) -> Result<Vec<E>, IdxError> {
    let classes = match mode {
        LabelMode::Categorical { classes } => classes,
        LabelMode::Scalar => return Err(IdxError::MissingClassCount),
    };
    let index = check_class(class, classes)?;

    Ok((0..classes)
        .map(|idx| E::from_u8((idx == index) as u8))
        .collect())
}

impl<E: Element> Label for Vec<E> {
    fn encode(class: u8, mode: LabelMode) -> Result<Self, IdxError> {
        one_hot(class, mode)
    }
}

impl<E: Element> Label for Array1<E> {
    fn encode(class: u8, mode: LabelMode) -> Result<Self, IdxError> {
        one_hot(class, mode).map(Array1::from)
    }
}
