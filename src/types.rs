//! Domain types shared by every execution strategy

use std::fmt;
use std::ops::Range;

/// A (min, max) pair of samples
///
/// `IDENTITY` is the neutral element of [`Bounds::combine`]: it never wins a
/// minimum or maximum comparison, so empty partitions contribute nothing to
/// the global reduction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f32,
    pub max: f32,
}

impl Bounds {
    pub const IDENTITY: Self = Self {
        min: f32::INFINITY,
        max: f32::NEG_INFINITY,
    };

    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Widen `self` by one sample
    #[inline(always)]
    #[must_use]
    // Hot path: called for every sample during the local scan
    pub fn include(self, value: f32) -> Self {
        Self {
            min: if value < self.min { value } else { self.min },
            max: if value > self.max { value } else { self.max },
        }
    }

    /// Associative, commutative merge of two bounds
    #[inline]
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        Self {
            min: if other.min < self.min { other.min } else { self.min },
            max: if other.max > self.max { other.max } else { self.max },
        }
    }

    /// True when no real sample has been folded in yet
    #[inline]
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.min == f32::INFINITY && self.max == f32::NEG_INFINITY
    }

    #[inline]
    #[must_use]
    pub fn range(&self) -> f32 {
        self.max - self.min
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{min:.6}, {max:.6}]", min = self.min, max = self.max)
    }
}

/// Contiguous sub-range of the logical array owned by one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub owner: usize,
    pub offset: usize,
    pub len: usize,
}

impl Partition {
    #[must_use]
    pub fn new(owner: usize, offset: usize, len: usize) -> Self {
        Self { owner, offset, len }
    }

    #[inline]
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.len
    }

    #[inline]
    #[must_use]
    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "worker {owner}: {start}..{end} ({len} samples)",
            owner = self.owner,
            start = self.offset,
            end = self.end(),
            len = self.len
        )
    }
}

/// How the pipeline is scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// One control flow, one partition
    Serial,
    /// Worker threads over disjoint ranges of one shared buffer
    Threaded,
    /// Workers owning only their partition, exchanging messages
    Distributed,
    /// Distributed over MPI processes
    Mpi,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serial => write!(f, "SERIAL"),
            Self::Threaded => write!(f, "THREADED"),
            Self::Distributed => write!(f, "DISTRIBUTED"),
            Self::Mpi => write!(f, "MPI"),
        }
    }
}
