#![forbid(unsafe_code)]

//! The underlying data source and its mutation events.
//!
//! # Design
//!
//! A [`TableModel`] is an indexable sequence of rows with a fixed column
//! count. The view never subscribes to the model: whoever mutates the model
//! pushes the corresponding [`ModelEvent`] into
//! [`crate::FilteredView::model_changed`]. [`VecTableModel`]'s mutators
//! return the event to push.

use std::cell::RefCell;
use std::rc::Rc;

use tabfilter_core::{CellValue, Entry};

/// Row-indexed tabular data.
pub trait TableModel {
    fn row_count(&self) -> usize;

    fn column_count(&self) -> usize;

    /// Value at (`row`, `column`), `None` for a null cell or out of range.
    fn value_at(&self, row: usize, column: usize) -> Option<&CellValue>;

    fn column_name(&self, _column: usize) -> Option<&str> {
        None
    }

    fn is_cell_editable(&self, _row: usize, _column: usize) -> bool {
        false
    }

    /// Store `value` at (`row`, `column`). Returns whether the cell changed.
    fn set_value_at(&mut self, _value: Option<CellValue>, _row: usize, _column: usize) -> bool {
        false
    }
}

/// Shared, mutable handle to a model.
pub type SharedModel = Rc<RefCell<dyn TableModel>>;

/// A change to the model's rows or shape.
///
/// Row ranges are inclusive and expressed in model coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModelEvent {
    /// Columns changed, or anything else invalidating the whole model.
    StructureChanged,
    RowsInserted { first: usize, last: usize },
    RowsDeleted { first: usize, last: usize },
    /// Cells changed in place. `last == None` means "every row from
    /// `first` on"; `column == None` means every column.
    RowsUpdated {
        first: usize,
        last: Option<usize>,
        column: Option<usize>,
    },
}

impl ModelEvent {
    /// Update covering every row.
    #[must_use]
    pub const fn all_rows_updated() -> Self {
        Self::RowsUpdated {
            first: 0,
            last: None,
            column: None,
        }
    }

    /// Whether this is an update with a bounded row range.
    #[must_use]
    pub const fn is_bounded_update(&self) -> bool {
        matches!(self, Self::RowsUpdated { last: Some(_), .. })
    }
}

/// One model row seen through the [`Entry`] accessor.
pub(crate) struct ModelRow<'a> {
    pub(crate) model: &'a dyn TableModel,
    pub(crate) row: usize,
}

impl Entry for ModelRow<'_> {
    fn value(&self, column: usize) -> Option<&CellValue> {
        self.model.value_at(self.row, column)
    }

    fn column_count(&self) -> usize {
        self.model.column_count()
    }
}

/// In-memory model backed by a vector of rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VecTableModel {
    columns: Vec<String>,
    rows: Vec<Vec<Option<CellValue>>>,
    editable: bool,
}

impl VecTableModel {
    /// Empty, read-only model with the given column names.
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            editable: false,
        }
    }

    /// Model filled with `rows`. Rows are padded or truncated to the column
    /// count.
    #[must_use]
    pub fn with_rows<I, S>(columns: I, rows: Vec<Vec<Option<CellValue>>>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut model = Self::new(columns);
        model.rows = rows.into_iter().map(|r| model.fit(r)).collect();
        model
    }

    /// Single-column model of integers.
    #[must_use]
    pub fn from_ints(column: &str, values: impl IntoIterator<Item = i64>) -> Self {
        let rows = values
            .into_iter()
            .map(|v| vec![Some(CellValue::Int(v))])
            .collect();
        Self::with_rows([column], rows)
    }

    #[must_use]
    pub const fn editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    pub fn push_row(&mut self, row: Vec<Option<CellValue>>) -> ModelEvent {
        let index = self.rows.len();
        self.insert_row(index, row)
    }

    /// Insert `row` before `index` (clamped to the row count).
    pub fn insert_row(&mut self, index: usize, row: Vec<Option<CellValue>>) -> ModelEvent {
        let index = index.min(self.rows.len());
        let row = self.fit(row);
        self.rows.insert(index, row);
        ModelEvent::RowsInserted {
            first: index,
            last: index,
        }
    }

    /// Remove the row at `index`, if present.
    pub fn remove_row(&mut self, index: usize) -> Option<(Vec<Option<CellValue>>, ModelEvent)> {
        if index >= self.rows.len() {
            return None;
        }
        let row = self.rows.remove(index);
        Some((
            row,
            ModelEvent::RowsDeleted {
                first: index,
                last: index,
            },
        ))
    }

    /// Overwrite one cell regardless of editability.
    pub fn set_cell(
        &mut self,
        row: usize,
        column: usize,
        value: Option<CellValue>,
    ) -> Option<ModelEvent> {
        let slot = self.rows.get_mut(row)?.get_mut(column)?;
        *slot = value;
        Some(ModelEvent::RowsUpdated {
            first: row,
            last: Some(row),
            column: Some(column),
        })
    }

    /// Remove every row.
    pub fn clear(&mut self) -> Option<ModelEvent> {
        if self.rows.is_empty() {
            return None;
        }
        let last = self.rows.len() - 1;
        self.rows.clear();
        Some(ModelEvent::RowsDeleted { first: 0, last })
    }

    /// Replace the column set, dropping or padding cells. Always a
    /// structural change.
    pub fn set_columns<I, S>(&mut self, columns: I) -> ModelEvent
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        let width = self.columns.len();
        for row in &mut self.rows {
            row.resize(width, None);
        }
        ModelEvent::StructureChanged
    }

    fn fit(&self, mut row: Vec<Option<CellValue>>) -> Vec<Option<CellValue>> {
        row.resize(self.columns.len(), None);
        row
    }
}

impl TableModel for VecTableModel {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn value_at(&self, row: usize, column: usize) -> Option<&CellValue> {
        self.rows.get(row)?.get(column)?.as_ref()
    }

    fn column_name(&self, column: usize) -> Option<&str> {
        self.columns.get(column).map(String::as_str)
    }

    fn is_cell_editable(&self, row: usize, column: usize) -> bool {
        self.editable && row < self.rows.len() && column < self.columns.len()
    }

    fn set_value_at(&mut self, value: Option<CellValue>, row: usize, column: usize) -> bool {
        self.is_cell_editable(row, column) && self.set_cell(row, column, value).is_some()
    }
}
