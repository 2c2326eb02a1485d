// src/analysis/bitmask.rs

use std::fmt;

/// Set of requested analysis kinds, one power-of-two bit per kind.
///
/// The numeric value is what the engine receives on its command line, so bit
/// assignments must stay stable for the lifetime of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AnalysisBitmask(u32);

impl AnalysisBitmask {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when every bit of `bit` is set.
    pub const fn contains(self, bit: u32) -> bool {
        bit != 0 && self.0 & bit == bit
    }

    pub fn insert(&mut self, bit: u32) {
        self.0 |= bit;
    }

    /// Individual set bits in ascending order.
    pub fn iter(self) -> impl Iterator<Item = u32> {
        (0..u32::BITS)
            .map(|shift| 1u32 << shift)
            .filter(move |bit| self.0 & bit != 0)
    }
}

impl fmt::Display for AnalysisBitmask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromIterator<u32> for AnalysisBitmask {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut mask = Self::empty();
        for bit in iter {
            mask.insert(bit);
        }
        mask
    }
}
