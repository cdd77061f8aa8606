//! DOM Generation IDs
//!
//! The tree carries a generation counter that increments on any effective
//! mutation. If unchanged, nothing in the document moved, which is how the
//! scheduler proves a re-evaluation was a no-op.

/// Generation counter - incremented on every mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Generation(u32);

impl Generation {
    /// Initial generation (never mutated)
    pub const INITIAL: Self = Generation(0);

    /// Get the raw value
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Get the next generation
    #[inline]
    pub const fn next(self) -> Self {
        Generation(self.0.wrapping_add(1))
    }

    /// Check if this generation is newer than another
    #[inline]
    pub fn is_newer_than(self, other: Self) -> bool {
        // Handle wraparound
        let diff = self.0.wrapping_sub(other.0);
        diff > 0 && diff < u32::MAX / 2
    }
}

impl Default for Generation {
    fn default() -> Self {
        Self::INITIAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_next() {
        let g = Generation::INITIAL;
        assert_eq!(g.next().value(), 1);
        assert!(g.next().is_newer_than(g));
        assert!(!g.is_newer_than(g));
    }

    #[test]
    fn test_generation_wraparound() {
        let near_max = Generation(u32::MAX);
        let wrapped = near_max.next();
        assert_eq!(wrapped.value(), 0);
        assert!(wrapped.is_newer_than(near_max));
    }
}
