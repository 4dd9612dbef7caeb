#![forbid(unsafe_code)]

//! Index buffers reused across rescans.

/// Slot value meaning "no mapping".
pub const UNMAPPED: usize = usize::MAX;

/// Fixed-length index buffer with a slack-based reuse policy.
///
/// The buffer is kept when its length is at least the required size and at
/// most `required + required * slack_percent / 100`; otherwise it is
/// reallocated at exactly the required size. Either way every slot is reset
/// to [`UNMAPPED`].
#[derive(Debug, Clone, Default)]
pub(crate) struct IndexBuffer {
    slots: Vec<usize>,
}

impl IndexBuffer {
    /// Prepare the buffer for `required` slots. Returns `true` when a new
    /// allocation was made.
    pub(crate) fn reset(&mut self, required: usize, slack_percent: usize) -> bool {
        let limit = required.saturating_add(required.saturating_mul(slack_percent) / 100);
        let reuse = self.slots.len() >= required && self.slots.len() <= limit;
        if reuse {
            self.slots.fill(UNMAPPED);
        } else {
            self.slots = vec![UNMAPPED; required];
        }
        !reuse
    }

    #[inline]
    pub(crate) fn get(&self, index: usize) -> Option<usize> {
        self.slots.get(index).copied().filter(|&v| v != UNMAPPED)
    }

    #[inline]
    pub(crate) fn set(&mut self, index: usize, value: usize) {
        self.slots[index] = value;
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn as_slice(&self) -> &[usize] {
        &self.slots
    }
}

/// Model→view map, built lazily after each rescan.
#[derive(Debug, Clone)]
pub(crate) enum InverseMap {
    Valid(IndexBuffer),
    /// Out of date. The buffer is kept only for reuse and is never read.
    Stale(IndexBuffer),
}

impl Default for InverseMap {
    fn default() -> Self {
        Self::Stale(IndexBuffer::default())
    }
}

impl InverseMap {
    pub(crate) fn invalidate(&mut self) {
        if let Self::Valid(buffer) = self {
            *self = Self::Stale(std::mem::take(buffer));
        }
    }

    #[cfg_attr(not(feature = "tracing"), allow(dead_code))]
    pub(crate) const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// The valid map, rebuilding it from `rows` (view→model) when stale.
    pub(crate) fn ensure(
        &mut self,
        rows: &[usize],
        model_rows: usize,
        slack_percent: usize,
    ) -> &IndexBuffer {
        if let Self::Stale(buffer) = self {
            let mut buffer = std::mem::take(buffer);
            buffer.reset(model_rows, slack_percent);
            for (view, &model) in rows.iter().enumerate() {
                buffer.set(model, view);
            }
            *self = Self::Valid(buffer);
        }
        match self {
            Self::Valid(buffer) | Self::Stale(buffer) => buffer,
        }
    }
}
