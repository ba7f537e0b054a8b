//! Read-only lookup capability injected by the host.
//!
//! Name tables and per-species personal data are not part of the codec. The
//! trait's defaults return "unknown" answers, except for the experience
//! curves, which are closed-form and identical across generations.

use serde::{Deserialize, Serialize};

use crate::core_api::Game;
use crate::sav::Pouch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrowthGroup {
    MediumFast,
    Erratic,
    Fluctuating,
    MediumSlow,
    Fast,
    Slow,
}

impl GrowthGroup {
    pub fn from_raw(raw: u8) -> Option<Self> {
        Some(match raw {
            0 => Self::MediumFast,
            1 => Self::Erratic,
            2 => Self::Fluctuating,
            3 => Self::MediumSlow,
            4 => Self::Fast,
            5 => Self::Slow,
            _ => return None,
        })
    }
}

pub trait Lookup: Send + Sync {
    fn species_name(&self, _species: u16) -> Option<String> {
        None
    }

    fn move_name(&self, _move_id: u16) -> Option<String> {
        None
    }

    fn item_name(&self, _item: u16) -> Option<String> {
        None
    }

    fn nature_name(&self, _nature: u8) -> Option<String> {
        None
    }

    fn ability_name(&self, _ability: u16) -> Option<String> {
        None
    }

    /// Base stats in [`crate::stat::Stat`] order, from the host's personal
    /// table.
    fn base_stats(&self, _species: u16, _form: u16) -> Option<[u8; 6]> {
        None
    }

    /// Ability ids for slots 0, 1 and hidden.
    fn abilities(&self, _species: u16, _form: u16) -> Option<[u16; 3]> {
        None
    }

    fn growth_group(&self, _species: u16, _form: u16) -> GrowthGroup {
        GrowthGroup::MediumFast
    }

    /// Total experience needed to reach `level`.
    fn exp_for_level(&self, level: u8, group: GrowthGroup) -> u32 {
        exp_for_level(level, group)
    }

    fn valid_items(&self, _game: Game, _pouch: Pouch) -> Vec<u16> {
        Vec::new()
    }
}

/// Lookup with no name tables.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardLookup;

impl Lookup for StandardLookup {}

pub fn exp_for_level(level: u8, group: GrowthGroup) -> u32 {
    let n = level.clamp(1, 100) as u64;
    if n == 1 {
        return 0;
    }
    let cube = n * n * n;
    let exp = match group {
        GrowthGroup::MediumFast => cube,
        GrowthGroup::Erratic => match n {
            ..50 => cube * (100 - n) / 50,
            50..68 => cube * (150 - n) / 100,
            68..98 => cube * ((1911 - 10 * n) / 3) / 500,
            _ => cube * (160 - n) / 100,
        },
        GrowthGroup::Fluctuating => match n {
            ..15 => cube * ((n + 1) / 3 + 24) / 50,
            15..36 => cube * (n + 14) / 50,
            _ => cube * (n / 2 + 32) / 50,
        },
        GrowthGroup::MediumSlow => 6 * cube / 5 + 100 * n - 15 * n * n - 140,
        GrowthGroup::Fast => 4 * cube / 5,
        GrowthGroup::Slow => 5 * cube / 4,
    };
    exp as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curves_match_known_level_100_totals() {
        assert_eq!(exp_for_level(100, GrowthGroup::Erratic), 600_000);
        assert_eq!(exp_for_level(100, GrowthGroup::Fast), 800_000);
        assert_eq!(exp_for_level(100, GrowthGroup::MediumFast), 1_000_000);
        assert_eq!(exp_for_level(100, GrowthGroup::MediumSlow), 1_059_860);
        assert_eq!(exp_for_level(100, GrowthGroup::Slow), 1_250_000);
        assert_eq!(exp_for_level(100, GrowthGroup::Fluctuating), 1_640_000);
    }

    #[test]
    fn level_two_boundaries() {
        assert_eq!(exp_for_level(2, GrowthGroup::MediumSlow), 9);
        assert_eq!(exp_for_level(2, GrowthGroup::Erratic), 15);
        assert_eq!(exp_for_level(68, GrowthGroup::Erratic), 257_834);
        assert_eq!(exp_for_level(1, GrowthGroup::Slow), 0);
    }

    #[test]
    fn curves_are_monotonic() {
        for raw in 0..6 {
            let group = GrowthGroup::from_raw(raw).unwrap();
            for level in 1..100 {
                assert!(exp_for_level(level, group) < exp_for_level(level + 1, group));
            }
        }
    }
}
