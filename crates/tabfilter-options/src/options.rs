#![forbid(unsafe_code)]

//! Sorted, de-duplicated option labels for a filter column.
//!
//! # Design
//!
//! Values are formatted into labels when added. Entries are kept sorted by
//! the list's [`OptionOrder`] and de-duplicated under it: with
//! [`OptionOrder::Dates`], dates the comparator considers equal collapse
//! into the first one added. A non-empty list always starts with the empty
//! option (`""`, index 0), which stands for "no filter".
//!
//! [`OptionsList::closest_match`] looks for the first option starting with
//! the hint, shrinking the hint one character at a time until something
//! matches (unless an exact match is requested).

use std::cmp::Ordering;
use std::fmt;

use tabfilter_core::CellValue;
#[cfg(feature = "tracing")]
use tracing::debug;

use crate::comparator::DateComparator;

/// Label of the leading "no filter" option.
pub const EMPTY_OPTION: &str = "";

/// Sort order of an [`OptionsList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptionOrder {
    /// String order of the labels.
    #[default]
    Lexical,
    /// Date values by the comparator, other values first, by label.
    Dates(DateComparator),
}

/// Result of [`OptionsList::closest_match`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionMatch {
    /// Index of the matching option.
    pub index: usize,
    /// Number of leading hint characters that matched.
    pub len: usize,
    /// Whether the option is exactly as long as the whole hint.
    pub exact: bool,
}

type Formatter = Box<dyn Fn(&CellValue) -> String>;

#[derive(Debug, Clone)]
struct OptionEntry {
    value: CellValue,
    label: String,
}

/// Ordered list of the distinct options offered for a column.
pub struct OptionsList {
    entries: Vec<OptionEntry>,
    formatter: Formatter,
    order: OptionOrder,
    ignore_case: bool,
}

impl fmt::Debug for OptionsList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionsList")
            .field("len", &self.len())
            .field("order", &self.order)
            .field("ignore_case", &self.ignore_case)
            .finish()
    }
}

impl Default for OptionsList {
    fn default() -> Self {
        Self::new()
    }
}

impl OptionsList {
    /// Empty list labelling values with their `Display` form.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            formatter: Box::new(|value: &CellValue| value.to_string()),
            order: OptionOrder::Lexical,
            ignore_case: false,
        }
    }

    #[must_use]
    pub fn with_formatter(mut self, formatter: impl Fn(&CellValue) -> String + 'static) -> Self {
        self.set_formatter(formatter);
        self
    }

    #[must_use]
    pub fn with_order(mut self, order: OptionOrder) -> Self {
        self.set_order(order);
        self
    }

    #[must_use]
    pub fn with_ignore_case(mut self, ignore_case: bool) -> Self {
        self.set_ignore_case(ignore_case);
        self
    }

    /// Replace the formatter and relabel every option.
    pub fn set_formatter(&mut self, formatter: impl Fn(&CellValue) -> String + 'static) {
        self.formatter = Box::new(formatter);
        self.rebuild();
    }

    pub fn set_order(&mut self, order: OptionOrder) {
        if self.order != order {
            self.order = order;
            self.rebuild();
        }
    }

    pub fn set_ignore_case(&mut self, ignore_case: bool) {
        if self.ignore_case != ignore_case {
            self.ignore_case = ignore_case;
            self.rebuild();
        }
    }

    #[must_use]
    pub const fn order(&self) -> OptionOrder {
        self.order
    }

    #[must_use]
    pub const fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    /// Add `values`, skipping duplicates. Returns how many options were
    /// added, not counting the leading empty option.
    pub fn add_values(&mut self, values: impl IntoIterator<Item = CellValue>) -> usize {
        let added = values
            .into_iter()
            .map(|value| self.insert(value))
            .filter(|&inserted| inserted)
            .count();
        #[cfg(feature = "tracing")]
        if added > 0 {
            debug!(message = "options.add", added, total = self.len());
        }
        added
    }

    /// Remove every option. Returns whether anything was removed.
    pub fn clear(&mut self) -> bool {
        let had_options = !self.entries.is_empty();
        self.entries.clear();
        had_options
    }

    /// Number of options, including the leading empty one.
    #[must_use]
    pub fn len(&self) -> usize {
        if self.entries.is_empty() {
            0
        } else {
            self.entries.len() + 1
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        match index {
            _ if self.entries.is_empty() => None,
            0 => Some(EMPTY_OPTION),
            i => self.entries.get(i - 1).map(|e| e.label.as_str()),
        }
    }

    /// Value behind the option at `index`; `None` for the empty option.
    #[must_use]
    pub fn value(&self, index: usize) -> Option<&CellValue> {
        index
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .map(|e| &e.value)
    }

    /// Every label, in order.
    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        self.iter().collect()
    }

    /// Whether `label` is exactly one of the options.
    #[must_use]
    pub fn is_valid_option(&self, label: &str) -> bool {
        self.iter().any(|l| l == label)
    }

    /// First option starting with the longest possible prefix of `hint`.
    ///
    /// With `exact`, only the whole hint is tried and `None` is returned when
    /// nothing starts with it. Otherwise a hint matching nothing at all
    /// yields index 0 with a zero-length match. `None` on an empty list.
    #[must_use]
    pub fn closest_match(&self, hint: &str, exact: bool) -> Option<OptionMatch> {
        if self.is_empty() {
            return None;
        }
        let hint: Vec<char> = hint.chars().collect();
        let full = hint.len();
        let sorted_by_label = self.order == OptionOrder::Lexical;
        let mut len = full;
        while len > 0 {
            let prefix: String = hint[..len].iter().collect();
            for (index, label) in self.iter().enumerate() {
                match self.compare_prefix(label, &prefix, len) {
                    Some(Ordering::Equal) => {
                        return Some(OptionMatch {
                            index,
                            len,
                            exact: label.chars().count() == full,
                        });
                    }
                    Some(Ordering::Greater) if sorted_by_label => break,
                    _ => {}
                }
            }
            if exact {
                return None;
            }
            len -= 1;
        }
        Some(OptionMatch {
            index: 0,
            len: 0,
            exact: full == 0,
        })
    }

    fn iter(&self) -> impl Iterator<Item = &str> {
        let head = (!self.entries.is_empty()).then_some(EMPTY_OPTION);
        head.into_iter()
            .chain(self.entries.iter().map(|e| e.label.as_str()))
    }

    /// Compares the first `len` characters of `label` with `prefix`; `None`
    /// when the label is shorter.
    fn compare_prefix(&self, label: &str, prefix: &str, len: usize) -> Option<Ordering> {
        let head: String = label.chars().take(len).collect();
        if head.chars().count() < len {
            return None;
        }
        Some(if self.ignore_case {
            head.to_lowercase().cmp(&prefix.to_lowercase())
        } else {
            head.as_str().cmp(prefix)
        })
    }

    fn insert(&mut self, value: CellValue) -> bool {
        let label = (self.formatter)(&value);
        if label.is_empty() {
            return false;
        }
        let entry = OptionEntry { value, label };
        match self
            .entries
            .binary_search_by(|existing| self.compare_entries(existing, &entry))
        {
            Ok(_) => false,
            Err(pos) => {
                self.entries.insert(pos, entry);
                true
            }
        }
    }

    fn rebuild(&mut self) {
        let entries = std::mem::take(&mut self.entries);
        for entry in entries {
            self.insert(entry.value);
        }
    }

    fn compare_entries(&self, a: &OptionEntry, b: &OptionEntry) -> Ordering {
        match self.order {
            OptionOrder::Lexical => self.compare_labels(&a.label, &b.label),
            OptionOrder::Dates(comparator) => {
                let (da, db) = (a.value.as_date_time(), b.value.as_date_time());
                if da.is_none() && db.is_none() {
                    self.compare_labels(&a.label, &b.label)
                } else {
                    comparator.compare_nullable(da, db)
                }
            }
        }
    }

    fn compare_labels(&self, a: &str, b: &str) -> Ordering {
        if self.ignore_case {
            a.to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b))
        } else {
            a.cmp(b)
        }
    }
}
