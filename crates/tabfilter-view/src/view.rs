#![forbid(unsafe_code)]

//! Filtered view over a [`TableModel`] with bidirectional row translation.
//!
//! # Design
//!
//! [`FilteredView`] is a cheap, cloneable handle. It keeps:
//!
//! - `rows`: view→model, the first `valid_rows` slots meaningful and strictly
//!   increasing;
//! - an [`InverseMap`]: model→view, rebuilt lazily on the first reverse
//!   lookup after each rescan and never read while stale.
//!
//! A rescan tests every model row against the current predicate (an absent
//! predicate passes all rows). Rescans run on a new predicate, on row
//! insertion or deletion, on unbounded updates and on structural changes.
//! Bounded updates are forwarded untouched under
//! [`UpdatePolicy::PassThrough`].
//!
//! # Invariants
//!
//! 1. After any rescan, the visible rows are exactly the model rows passing
//!    the predicate, in ascending model order.
//! 2. Whenever the inverse is valid, `view_index_of(model_index_of(v)) ==
//!    Some(v)` for every visible `v`.
//! 3. Out-of-range indices are reported as [`ViewError`], never clamped.
//! 4. No internal borrow is held while predicates or listeners run.
//! 5. While predicates run, the view reads as empty: `row_count() == 0` and
//!    every index lookup reports out of range.
//!
//! # Failure Modes
//!
//! - **Pass-through drift**: with [`UpdatePolicy::PassThrough`], a bounded
//!   update that flips a row's predicate result leaves the visible set stale
//!   until the next rescan.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tabfilter_core::{CellValue, FilterRef, RowFilter};
#[cfg(feature = "tracing")]
use tracing::{debug, trace};

use crate::buffer::{IndexBuffer, InverseMap};
use crate::config::{UpdatePolicy, ViewConfig};
use crate::error::{Result, ViewError};
use crate::model::{ModelEvent, ModelRow, SharedModel};

/// Notification emitted by a [`FilteredView`] to its listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    /// Columns may have changed; everything must be re-read.
    StructureChanged,
    /// The visible row set was rebuilt.
    DataChanged,
    /// A model event passed through unchanged, in model coordinates.
    Forwarded(ModelEvent),
}

/// Handle returned by [`FilteredView::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Rc<dyn Fn(&ViewEvent)>;

#[derive(Debug, Default)]
struct Mapping {
    rows: IndexBuffer,
    valid_rows: usize,
    inverse: InverseMap,
    /// Model row count at the last rescan.
    model_rows: usize,
    columns: usize,
}

struct Inner {
    config: ViewConfig,
    model: RefCell<SharedModel>,
    filter: RefCell<Option<FilterRef>>,
    mapping: RefCell<Mapping>,
    listeners: RefCell<Vec<(ListenerId, Listener)>>,
    next_listener: Cell<u64>,
}

/// Filtered, index-translating view over a shared model.
#[derive(Clone)]
pub struct FilteredView {
    inner: Rc<Inner>,
}

impl fmt::Debug for FilteredView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mapping = self.inner.mapping.borrow();
        f.debug_struct("FilteredView")
            .field("visible", &mapping.valid_rows)
            .field("model_rows", &mapping.model_rows)
            .field("columns", &mapping.columns)
            .field("has_filter", &self.inner.filter.borrow().is_some())
            .field("listeners", &self.inner.listeners.borrow().len())
            .finish()
    }
}

impl FilteredView {
    /// View over `model` with no predicate and default configuration.
    #[must_use]
    pub fn new(model: SharedModel) -> Self {
        Self::with_config(model, ViewConfig::default())
    }

    #[must_use]
    pub fn with_config(model: SharedModel, config: ViewConfig) -> Self {
        let view = Self {
            inner: Rc::new(Inner {
                config,
                model: RefCell::new(model),
                filter: RefCell::new(None),
                mapping: RefCell::new(Mapping::default()),
                listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(0),
            }),
        };
        view.reset_structure();
        view
    }

    #[must_use]
    pub fn config(&self) -> ViewConfig {
        self.inner.config
    }

    #[must_use]
    pub fn model(&self) -> SharedModel {
        Rc::clone(&self.inner.model.borrow())
    }

    /// Replace the data source and rebuild everything.
    pub fn set_model(&self, model: SharedModel) {
        *self.inner.model.borrow_mut() = model;
        #[cfg(feature = "tracing")]
        debug!(message = "view.set_model");
        self.reset_structure();
        self.emit(&ViewEvent::StructureChanged);
    }

    #[must_use]
    pub fn row_filter(&self) -> Option<FilterRef> {
        self.inner.filter.borrow().clone()
    }

    /// Install a new predicate (`None` passes every row). Always rescans.
    pub fn set_row_filter(&self, filter: Option<FilterRef>) {
        *self.inner.filter.borrow_mut() = filter;
        self.rescan();
        self.emit(&ViewEvent::DataChanged);
    }

    /// Rescan with the current predicate without notifying listeners.
    pub fn reapply_filter(&self) {
        self.rescan();
    }

    /// React to a mutation of the underlying model.
    pub fn model_changed(&self, event: &ModelEvent) {
        #[cfg(feature = "tracing")]
        trace!(message = "view.model_changed", event = ?event);
        match event {
            ModelEvent::StructureChanged => {
                self.reset_structure();
                self.emit(&ViewEvent::StructureChanged);
            }
            e if e.is_bounded_update()
                && self.inner.config.update_policy == UpdatePolicy::PassThrough =>
            {
                self.emit(&ViewEvent::Forwarded(*event));
            }
            _ => {
                self.rescan();
                self.emit(&ViewEvent::DataChanged);
            }
        }
    }

    /// Number of visible rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.inner.mapping.borrow().valid_rows
    }

    /// Model row count as of the last rescan.
    #[must_use]
    pub fn model_row_count(&self) -> usize {
        self.inner.mapping.borrow().model_rows
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.inner.mapping.borrow().columns
    }

    #[must_use]
    pub fn column_name(&self, column: usize) -> Option<String> {
        let model = self.model();
        let model = model.borrow();
        model.column_name(column).map(str::to_owned)
    }

    /// Model indices of the visible rows, in view order.
    #[must_use]
    pub fn model_indices(&self) -> Vec<usize> {
        let mapping = self.inner.mapping.borrow();
        mapping
            .rows
            .as_slice()
            .get(..mapping.valid_rows)
            .unwrap_or_default()
            .to_vec()
    }

    /// Model row shown at `view_index`.
    pub fn model_index_of(&self, view_index: usize) -> Result<usize> {
        let mapping = self.inner.mapping.borrow();
        if view_index >= mapping.valid_rows {
            return Err(ViewError::ViewIndexOutOfRange {
                index: view_index,
                len: mapping.valid_rows,
            });
        }
        mapping
            .rows
            .get(view_index)
            .ok_or(ViewError::ViewIndexOutOfRange {
                index: view_index,
                len: mapping.valid_rows,
            })
    }

    /// View row showing `model_index`, `None` when it is filtered out.
    ///
    /// The first call after a rescan builds the inverse map in O(N); later
    /// calls are O(1).
    pub fn view_index_of(&self, model_index: usize) -> Result<Option<usize>> {
        let slack = self.inner.config.buffer_slack_percent;
        let mut mapping = self.inner.mapping.borrow_mut();
        let Mapping {
            rows,
            valid_rows,
            inverse,
            model_rows,
            ..
        } = &mut *mapping;
        if model_index >= *model_rows {
            return Err(ViewError::ModelIndexOutOfRange {
                index: model_index,
                len: *model_rows,
            });
        }
        #[cfg(feature = "tracing")]
        if !inverse.is_valid() {
            debug!(message = "view.inverse.build", model_rows = *model_rows);
        }
        let visible = rows.as_slice().get(..*valid_rows).unwrap_or_default();
        let map = inverse.ensure(visible, *model_rows, slack);
        Ok(map.get(model_index))
    }

    /// Cell at (`view_row`, `column`), `Ok(None)` for a null cell.
    pub fn value_at(&self, view_row: usize, column: usize) -> Result<Option<CellValue>> {
        let row = self.model_index_of(view_row)?;
        self.check_column(column)?;
        let model = self.model();
        let model = model.borrow();
        Ok(model.value_at(row, column).cloned())
    }

    pub fn is_cell_editable(&self, view_row: usize, column: usize) -> Result<bool> {
        let row = self.model_index_of(view_row)?;
        self.check_column(column)?;
        let model = self.model();
        let editable = model.borrow().is_cell_editable(row, column);
        Ok(editable)
    }

    /// Write through to the model cell behind (`view_row`, `column`).
    ///
    /// A successful write is handled like a bounded `RowsUpdated` event for
    /// that model row. Returns whether the model accepted the value.
    pub fn set_value_at(
        &self,
        value: Option<CellValue>,
        view_row: usize,
        column: usize,
    ) -> Result<bool> {
        let row = self.model_index_of(view_row)?;
        self.check_column(column)?;
        let model = self.model();
        let changed = model.borrow_mut().set_value_at(value, row, column);
        if changed {
            self.model_changed(&ModelEvent::RowsUpdated {
                first: row,
                last: Some(row),
                column: Some(column),
            });
        }
        Ok(changed)
    }

    /// Register a listener for [`ViewEvent`]s.
    pub fn subscribe(&self, listener: impl Fn(&ViewEvent) + 'static) -> ListenerId {
        let id = ListenerId(self.inner.next_listener.get());
        self.inner.next_listener.set(id.0 + 1);
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));
        id
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let removed = {
            let mut listeners = self.inner.listeners.borrow_mut();
            let pos = listeners.iter().position(|(l, _)| *l == id);
            pos.map(|pos| listeners.remove(pos))
        };
        removed.is_some()
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Whether both handles point at the same view.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn check_column(&self, column: usize) -> Result<()> {
        let columns = self.column_count();
        if column >= columns {
            return Err(ViewError::ColumnOutOfRange {
                column,
                len: columns,
            });
        }
        Ok(())
    }

    fn reset_structure(&self) {
        let columns = self.model().borrow().column_count();
        self.inner.mapping.borrow_mut().columns = columns;
        self.rescan();
    }

    fn rescan(&self) {
        let slack = self.inner.config.buffer_slack_percent;
        let model = self.model();
        let filter = self.row_filter();
        let mut rows = {
            let mut mapping = self.inner.mapping.borrow_mut();
            mapping.inverse.invalidate();
            mapping.valid_rows = 0;
            mapping.model_rows = 0;
            std::mem::take(&mut mapping.rows)
        };

        let model_ref = model.borrow();
        let total = model_ref.row_count();
        #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
        let reallocated = rows.reset(total, slack);
        let mut visible = 0;
        for row in 0..total {
            let keep = filter.as_ref().is_none_or(|f| {
                f.include(&ModelRow {
                    model: &*model_ref,
                    row,
                })
            });
            if keep {
                rows.set(visible, row);
                visible += 1;
            }
        }
        drop(model_ref);

        let mut mapping = self.inner.mapping.borrow_mut();
        mapping.rows = rows;
        mapping.valid_rows = visible;
        mapping.model_rows = total;
        // A nested rescan may have validated the inverse meanwhile.
        mapping.inverse.invalidate();
        #[cfg(feature = "tracing")]
        debug!(
            message = "view.rescan",
            model_rows = total,
            visible,
            capacity = mapping.rows.len(),
            reallocated,
            filtered = filter.is_some()
        );
    }

    fn emit(&self, event: &ViewEvent) {
        let snapshot: Vec<Listener> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }
}
