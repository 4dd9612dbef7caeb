#![forbid(unsafe_code)]

//! The predicate contract: [`RowFilter`] evaluated against one [`Entry`].
//!
//! A predicate is a pure decision over a row accessor. The core never caches
//! decisions; every call to [`RowFilter::include`] re-evaluates.
//!
//! Predicates that panic are not guarded: the panic propagates to whoever
//! asked for the row test.

use std::rc::Rc;

use crate::value::CellValue;

/// Read-only access to the cells of one row.
pub trait Entry {
    /// Value at `column`, `None` for a null cell.
    fn value(&self, column: usize) -> Option<&CellValue>;

    /// Number of columns in the row.
    fn column_count(&self) -> usize;

    /// String form of the value at `column`; empty for a null cell.
    fn string_value(&self, column: usize) -> String {
        self.value(column).map(ToString::to_string).unwrap_or_default()
    }
}

impl Entry for [Option<CellValue>] {
    fn value(&self, column: usize) -> Option<&CellValue> {
        self.get(column).and_then(Option::as_ref)
    }

    fn column_count(&self) -> usize {
        self.len()
    }
}

impl Entry for Vec<Option<CellValue>> {
    fn value(&self, column: usize) -> Option<&CellValue> {
        self.as_slice().value(column)
    }

    fn column_count(&self) -> usize {
        self.len()
    }
}

/// Decision function over one row.
pub trait RowFilter {
    /// `true` to keep the row visible.
    fn include(&self, entry: &dyn Entry) -> bool;
}

impl<F> RowFilter for F
where
    F: Fn(&dyn Entry) -> bool,
{
    fn include(&self, entry: &dyn Entry) -> bool {
        self(entry)
    }
}

/// Shared handle to a predicate.
pub type FilterRef = Rc<dyn RowFilter>;

/// Wrap a closure into a [`FilterRef`].
///
/// Exists mostly to pin the higher-ranked closure signature for inference.
pub fn filter_fn<F>(f: F) -> FilterRef
where
    F: Fn(&dyn Entry) -> bool + 'static,
{
    Rc::new(f)
}
