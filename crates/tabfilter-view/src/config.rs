#![forbid(unsafe_code)]

//! View configuration.

/// What a bounded `RowsUpdated` event does to the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdatePolicy {
    /// Forward the event unchanged without re-testing the updated rows.
    ///
    /// The visible set may then disagree with the predicate until the next
    /// rescan.
    #[default]
    PassThrough,
    /// Rescan and report a full data change.
    Refilter,
}

/// Tuning for a [`crate::FilteredView`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewConfig {
    /// Handling of bounded cell updates. Default: [`UpdatePolicy::PassThrough`].
    pub update_policy: UpdatePolicy,
    /// How far (in percent of the required size) an index buffer may exceed
    /// the requirement and still be reused. Default: 25.
    pub buffer_slack_percent: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            update_policy: UpdatePolicy::PassThrough,
            buffer_slack_percent: 25,
        }
    }
}

impl ViewConfig {
    #[must_use]
    pub const fn with_update_policy(mut self, policy: UpdatePolicy) -> Self {
        self.update_policy = policy;
        self
    }

    #[must_use]
    pub const fn with_buffer_slack_percent(mut self, percent: usize) -> Self {
        self.buffer_slack_percent = percent;
        self
    }
}
