#![forbid(unsafe_code)]

//! tabfilter public facade crate.
//!
//! Composable row filters over tabular models: build leaf filters, combine
//! them with AND / OR / NOT, and let a [`prelude::TableFilter`] keep a
//! [`prelude::FilteredView`] in sync.

pub mod prelude {
    pub use tabfilter_core as core;
    #[cfg(feature = "options")]
    pub use tabfilter_options as options;
    pub use tabfilter_view as view;

    pub use tabfilter_core::{
        CellValue, Combinator, ComposedFilter, Entry, FilterObservable, FilterRef, RowFilter,
        SharedObservable, UserFilter, filter_fn,
    };
    #[cfg(feature = "options")]
    pub use tabfilter_options::{DateComparator, Granularity, OptionsList};
    pub use tabfilter_view::{
        FilteredView, ModelEvent, TableFilter, TableModel, VecTableModel, ViewConfig, ViewError,
        ViewEvent,
    };
}
