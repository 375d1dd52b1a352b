//! Inclusive `[min, max]` ranges.

use core::fmt;

/// Inclusive range of values, e.g. the timesteps or the value span of a report.
///
/// No ordering is enforced: a timestep domain built from an empty report is
/// `[offset, offset - 1]`, which contains nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Domain<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> Domain<T> {
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    /// True if `min <= value <= max`.
    pub fn contains(&self, value: T) -> bool {
        self.min <= value && value <= self.max
    }

    /// True if the range contains no value at all.
    pub fn is_empty(&self) -> bool {
        self.max < self.min
    }

    /// Widen the range to include `value`.
    pub fn include(&mut self, value: T) {
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    /// Smallest domain covering every value, or `None` for an empty iterator.
    pub fn spanning<I: IntoIterator<Item = T>>(values: I) -> Option<Self> {
        let mut iter = values.into_iter();
        let first = iter.next()?;
        let mut domain = Self::new(first, first);
        for v in iter {
            domain.include(v);
        }
        Some(domain)
    }
}

impl Domain<i64> {
    /// Number of integers in the range.
    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.max - self.min + 1) as usize
        }
    }
}

impl<T: fmt::Display> fmt::Display for Domain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}
