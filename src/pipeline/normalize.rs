use crate::types::Bounds;

/// Which rescaling policy a partition went through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalization {
    /// `x = (x - min) / (max - min)` was applied
    Rescaled,
    /// Zero range or no samples at all: values left untouched
    Unchanged,
}

impl Normalization {
    /// The policy every worker applies for the given global bounds
    #[inline]
    #[must_use]
    pub fn for_bounds(bounds: Bounds) -> Self {
        if bounds.is_identity() || bounds.range() == 0.0 {
            Self::Unchanged
        } else {
            Self::Rescaled
        }
    }
}

/// Rescale `values` in place against the global bounds
///
/// When `max == min` (all samples equal, or nothing was reduced) the values
/// are left as they are instead of being forced to a constant.
#[inline]
pub fn normalize_in_place(values: &mut [f32], bounds: Bounds) -> Normalization {
    let policy = Normalization::for_bounds(bounds);
    if policy == Normalization::Unchanged {
        return policy;
    }

    let min = bounds.min;
    let range = bounds.range();
    for v in values.iter_mut() {
        *v = (*v - min) / range;
    }
    policy
}
