#![forbid(unsafe_code)]

//! Errors raised by index translation and cell access.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ViewError>;

/// An index handed to a [`crate::FilteredView`] was outside its valid range.
///
/// Indices are never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("view row {index} out of range (visible rows: {len})")]
    ViewIndexOutOfRange { index: usize, len: usize },

    #[error("model row {index} out of range (model rows: {len})")]
    ModelIndexOutOfRange { index: usize, len: usize },

    #[error("column {column} out of range (columns: {len})")]
    ColumnOutOfRange { column: usize, len: usize },
}
