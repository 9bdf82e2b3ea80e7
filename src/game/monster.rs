//! Monster templates and the fixed bestiary battles draw from.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::game::types::{percent, Item};

/// Damage a monster deals per round.
pub const MONSTER_DAMAGE: RangeInclusive<i32> = 5..=12;
/// Damage each party member deals per round.
pub const MEMBER_DAMAGE: RangeInclusive<i32> = 5..=15;

/// A combat opponent. Templates live in the bestiary; a battle works on a copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monster {
    pub name: String,
    pub level: u32,
    /// Current health. Config templates may omit it; battles start at `max_health`.
    #[serde(default)]
    pub health: i32,
    pub max_health: i32,
    /// Inclusive per-round damage bounds.
    pub damage: (i32, i32),
    #[serde(default)]
    pub loot: Vec<Item>,
}

impl Monster {
    pub fn new(name: &str, level: u32, max_health: i32, loot: Vec<Item>) -> Self {
        Self {
            name: name.to_string(),
            level,
            health: max_health,
            max_health,
            damage: (*MONSTER_DAMAGE.start(), *MONSTER_DAMAGE.end()),
            loot,
        }
    }

    pub fn damage_range(&self) -> RangeInclusive<i32> {
        let (lo, hi) = self.damage;
        lo.max(1)..=hi.max(lo.max(1))
    }

    pub fn health_percent(&self) -> f64 {
        percent(self.health, self.max_health)
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }
}

/// The built-in monster table.
pub fn default_bestiary() -> Vec<Monster> {
    vec![
        Monster::new("Goblin", 3, 50, vec![Item::currency("Gold", 50)]),
        Monster::new("Orc", 5, 80, vec![Item::currency("Gold", 80)]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bestiary_monsters_start_at_full_health() {
        for monster in default_bestiary() {
            assert_eq!(monster.health, monster.max_health);
            assert_eq!(monster.damage_range(), MONSTER_DAMAGE);
            assert!(!monster.loot.is_empty());
        }
    }

    #[test]
    fn damage_range_never_allows_zero_progress() {
        let mut m = Monster::new("Dummy", 1, 10, Vec::new());
        m.damage = (0, 0);
        assert_eq!(m.damage_range(), 1..=1);
    }
}
