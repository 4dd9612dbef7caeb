#![forbid(unsafe_code)]

//! Option lists and value ordering for filter columns.
//!
//! - [`DateComparator`]: orders dates at the resolution a formatter shows.
//! - [`OptionsList`]: the sorted, de-duplicated choices offered for a column.

pub mod comparator;
pub mod options;

pub use comparator::{DateComparator, Granularity};
pub use options::{EMPTY_OPTION, OptionMatch, OptionOrder, OptionsList};
