//! Magic shards and cast tiers.

use bevy::prelude::*;

/// Strength of a cast, picked from the charges spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MagicTier {
    One,
    Two,
    Three,
}

impl MagicTier {
    /// 1-2 charges cast tier 1, 3-4 tier 2, 5 or more tier 3.
    pub fn for_charges(charges: u8) -> Option<Self> {
        match charges {
            0 => None,
            1..=2 => Some(MagicTier::One),
            3..=4 => Some(MagicTier::Two),
            _ => Some(MagicTier::Three),
        }
    }

    pub fn index(self) -> usize {
        match self {
            MagicTier::One => 0,
            MagicTier::Two => 1,
            MagicTier::Three => 2,
        }
    }
}

/// A player's magic charges.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MagicPool {
    charges: u8,
}

impl MagicPool {
    pub const CAPACITY: u8 = 9;

    pub fn new(charges: u8) -> Self {
        Self {
            charges: charges.min(Self::CAPACITY),
        }
    }

    pub fn charges(&self) -> u8 {
        self.charges
    }

    /// Adds one charge unless full. Returns whether it was stored.
    pub fn add_shard(&mut self) -> bool {
        if self.charges >= Self::CAPACITY {
            return false;
        }
        self.charges += 1;
        true
    }

    /// Spends every charge. An empty pool casts nothing and stays empty.
    pub fn cast(&mut self) -> Option<(MagicTier, u8)> {
        let tier = MagicTier::for_charges(self.charges)?;
        let spent = self.charges;
        self.charges = 0;
        Some((tier, spent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_charges_cast_tier_one() {
        let mut pool = MagicPool::new(2);
        assert_eq!(pool.cast(), Some((MagicTier::One, 2)));
        assert_eq!(pool.charges(), 0);
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(MagicTier::for_charges(4), Some(MagicTier::Two));
        assert_eq!(MagicTier::for_charges(5), Some(MagicTier::Three));
        assert_eq!(MagicTier::for_charges(9), Some(MagicTier::Three));
    }

    #[test]
    fn test_empty_pool_is_a_no_op() {
        let mut pool = MagicPool::default();
        assert_eq!(pool.cast(), None);
        assert_eq!(pool.charges(), 0);
    }

    #[test]
    fn test_pool_saturates_at_capacity() {
        let mut pool = MagicPool::new(8);
        assert!(pool.add_shard());
        assert!(!pool.add_shard());
        assert_eq!(pool.charges(), 9);
        assert_eq!(MagicPool::new(40).charges(), 9);
    }
}
