use std::sync::Mutex;

use crate::types::Bounds;

/// Local bounds of one partition in a single linear scan
///
/// An empty partition yields [`Bounds::IDENTITY`].
#[inline]
#[must_use]
pub fn local_bounds(values: &[f32]) -> Bounds {
    values.iter().fold(Bounds::IDENTITY, |acc, &v| acc.include(v))
}

/// Combine per-worker bounds into the global bounds
#[must_use]
pub fn global_bounds<I>(locals: I) -> Bounds
where
    I: IntoIterator<Item = Bounds>,
{
    locals.into_iter().fold(Bounds::IDENTITY, Bounds::combine)
}

/// Global bounds shared by the threads of one run
///
/// Each thread merges its private local bounds exactly once; the lock is
/// held for the merge only, never across the scan.
#[derive(Debug, Default)]
pub struct SharedBounds {
    inner: Mutex<Bounds>,
}

impl SharedBounds {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&self, local: Bounds) {
        // Bounds is Copy and every stored value is valid, so a poisoned lock is still usable
        let mut global = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        *global = global.combine(local);
    }

    #[must_use]
    pub fn snapshot(&self) -> Bounds {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[must_use]
    pub fn into_inner(self) -> Bounds {
        self.inner.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}
