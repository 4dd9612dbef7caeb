#![forbid(unsafe_code)]

//! Date comparison at the resolution a formatter actually displays.
//!
//! # Design
//!
//! [`DateComparator::infer`] takes a formatting function and a reference
//! instant. It sets the sub-second, second, minute, hour, day-of-year, month
//! and year fields of a probe to 10 and then 11, in that order, keeping each
//! assignment. The first field whose change alters the formatted text fixes
//! the [`Granularity`]: dates that only differ below it format identically
//! and therefore compare equal.
//!
//! # Invariants
//!
//! 1. `compare(a, b) == Ordering::Equal` iff `key(a) == key(b)`.
//! 2. Null sorts before every non-null value.
//!
//! # Failure Modes
//!
//! - **Reference-dependent formatters**: a formatter whose output for the
//!   probed values happens to coincide (e.g. it elides a field only on some
//!   dates) yields a coarser granularity than intended.

use std::cmp::Ordering;

use chrono::{Datelike, Local, NaiveDateTime, Timelike};
#[cfg(feature = "tracing")]
use tracing::debug;

const MILLIS_PER_SECOND: i64 = 1_000;
const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;

/// Coarsest date resolution a formatter still distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Granularity {
    /// Sub-second changes are visible: full comparison.
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
    Month,
    Year,
    /// Nothing the probe changes is visible: every date compares equal.
    Indistinct,
}

/// Orders dates at a fixed [`Granularity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateComparator {
    granularity: Granularity,
}

impl DateComparator {
    #[must_use]
    pub const fn new(granularity: Granularity) -> Self {
        Self { granularity }
    }

    /// Infer the granularity of `format`, probing around `reference`.
    pub fn infer<F>(format: F, reference: NaiveDateTime) -> Self
    where
        F: Fn(&NaiveDateTime) -> String,
    {
        let mut probe = reference;
        let steps: [(Granularity, fn(&NaiveDateTime, u32) -> Option<NaiveDateTime>); 7] = [
            (Granularity::Millisecond, |d, v| d.with_nanosecond(v * 1_000_000)),
            (Granularity::Second, |d, v| d.with_second(v)),
            (Granularity::Minute, |d, v| d.with_minute(v)),
            (Granularity::Hour, |d, v| d.with_hour(v)),
            (Granularity::Day, |d, v| d.with_ordinal(v)),
            (Granularity::Month, |d, v| d.with_month(v)),
            (Granularity::Year, |d, v| i32::try_from(v).ok().and_then(|y| d.with_year(y))),
        ];
        let mut granularity = Granularity::Indistinct;
        for (candidate, set) in steps {
            let (Some(ten), Some(eleven)) = (set(&probe, 10), set(&probe, 11)) else {
                continue;
            };
            probe = eleven;
            if format(&ten) != format(&eleven) {
                granularity = candidate;
                break;
            }
        }
        #[cfg(feature = "tracing")]
        debug!(message = "comparator.infer", granularity = ?granularity);
        Self { granularity }
    }

    /// [`DateComparator::infer`] around the current local time.
    pub fn infer_now<F>(format: F) -> Self
    where
        F: Fn(&NaiveDateTime) -> String,
    {
        Self::infer(format, Local::now().naive_local())
    }

    #[must_use]
    pub const fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Ordering key of `value` truncated to the granularity.
    #[must_use]
    pub fn key(&self, value: &NaiveDateTime) -> i64 {
        let millis = value.and_utc().timestamp_millis();
        match self.granularity {
            Granularity::Millisecond => millis,
            Granularity::Second => millis.div_euclid(MILLIS_PER_SECOND),
            Granularity::Minute => millis.div_euclid(MILLIS_PER_MINUTE),
            Granularity::Hour => millis.div_euclid(MILLIS_PER_HOUR),
            Granularity::Day => i64::from(value.year()) * 400 + i64::from(value.ordinal()),
            Granularity::Month => i64::from(value.year()) * 12 + i64::from(value.month0()),
            Granularity::Year => i64::from(value.year()),
            Granularity::Indistinct => 0,
        }
    }

    #[must_use]
    pub fn compare(&self, a: &NaiveDateTime, b: &NaiveDateTime) -> Ordering {
        self.key(a).cmp(&self.key(b))
    }

    /// Like [`DateComparator::compare`], with nulls first.
    #[must_use]
    pub fn compare_nullable(
        &self,
        a: Option<&NaiveDateTime>,
        b: Option<&NaiveDateTime>,
    ) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => self.compare(a, b),
        }
    }
}
