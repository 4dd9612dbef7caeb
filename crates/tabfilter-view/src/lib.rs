#![forbid(unsafe_code)]

//! Filtered views over tabular models.
//!
//! - [`FilteredView`]: visible-row mapping over a [`TableModel`], with
//!   view→model and lazy model→view translation.
//! - [`TableFilter`]: the root AND composition whose changes are batched
//!   through a gate and pushed into a view.
//! - [`VecTableModel`]: an in-memory model whose mutators return the
//!   [`ModelEvent`] to push into the view.

mod buffer;
pub mod config;
pub mod error;
pub mod model;
pub mod table_filter;
pub mod view;

pub use config::{UpdatePolicy, ViewConfig};
pub use error::{Result, ViewError};
pub use model::{ModelEvent, SharedModel, TableModel, VecTableModel};
pub use table_filter::TableFilter;
pub use view::{FilteredView, ListenerId, ViewEvent};
