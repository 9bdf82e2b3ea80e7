//! Turn-based party vs. monster combat.
//!
//! A [`Battle`] moves from `Engaged` to `Resolved(Victory | Defeat)`. Each round:
//!
//! 1. the monster rolls its damage,
//! 2. every present member (leader first, then party order) rolls and hits the monster,
//! 3. the monster's roll lands on the leader only.
//!
//! The fight ends once either side is at or below zero; health may go negative.
//! The leader is checked first, so if both sides drop in the same round the
//! result is a defeat.

use std::collections::VecDeque;
use std::ops::RangeInclusive;

use rand::Rng;

use crate::game::loot::MemberDamage;
use crate::game::monster::{Monster, MEMBER_DAMAGE};
use crate::game::types::{percent, PlayerRecord};

/// Source of combat randomness.
pub trait Dice {
    /// Uniform roll within `range` (inclusive).
    fn roll(&mut self, range: RangeInclusive<i32>) -> i32;
    /// Uniform index in `0..len`; `len` is never zero.
    fn pick(&mut self, len: usize) -> usize;
}

impl<R: Rng + ?Sized> Dice for R {
    fn roll(&mut self, range: RangeInclusive<i32>) -> i32 {
        self.gen_range(range)
    }

    fn pick(&mut self, len: usize) -> usize {
        self.gen_range(0..len)
    }
}

/// Dice that replay a fixed sequence of rolls, for reproducing a fight.
/// Rolls are clamped into the requested range; once the script runs out every
/// roll returns the range minimum.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    rolls: VecDeque<i32>,
    picks: VecDeque<usize>,
}

impl ScriptedDice {
    pub fn new(rolls: impl IntoIterator<Item = i32>) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
            picks: VecDeque::new(),
        }
    }

    pub fn with_picks(mut self, picks: impl IntoIterator<Item = usize>) -> Self {
        self.picks = picks.into_iter().collect();
        self
    }
}

impl Dice for ScriptedDice {
    fn roll(&mut self, range: RangeInclusive<i32>) -> i32 {
        let (lo, hi) = (*range.start(), *range.end());
        self.rolls.pop_front().map_or(lo, |r| r.clamp(lo, hi))
    }

    fn pick(&mut self, len: usize) -> usize {
        self.picks.pop_front().unwrap_or(0) % len.max(1)
    }
}

/// Draw a fresh copy of a monster uniformly from `bestiary`.
pub fn pick_monster(bestiary: &[Monster], dice: &mut impl Dice) -> Option<Monster> {
    if bestiary.is_empty() {
        return None;
    }
    let mut monster = bestiary[dice.pick(bestiary.len())].clone();
    monster.health = monster.max_health;
    Some(monster)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleResult {
    Victory,
    Defeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleState {
    Engaged,
    Resolved(BattleResult),
}

/// Snapshot after one round, for incremental narration.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundReport {
    pub round: u32,
    pub monster_roll: i32,
    pub hits: Vec<(String, i32)>,
    pub monster_name: String,
    pub player_health: i32,
    pub player_percent: f64,
    pub monster_health: i32,
    pub monster_percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BattleOutcome {
    pub result: BattleResult,
    /// Cumulative damage per present member, leader first.
    pub per_member_damage: Vec<MemberDamage>,
    /// The monster as it ended the fight.
    pub monster: Monster,
    pub rounds: u32,
    /// Leader health at the end of the fight (may be negative).
    pub player_health: i32,
}

#[derive(Debug, Clone)]
pub struct Battle {
    leader_id: String,
    health: i32,
    max_health: i32,
    damage: Vec<MemberDamage>,
    monster: Monster,
    rounds: u32,
    state: BattleState,
}

impl Battle {
    /// Engage `monster` with `leader` and the already-resolved `party` records.
    /// Party entries repeating the leader or each other fight once.
    pub fn new(leader: &PlayerRecord, party: &[PlayerRecord], monster: Monster) -> Self {
        let mut damage = vec![MemberDamage {
            id: leader.id.clone(),
            damage: 0,
        }];
        for member in party {
            if damage.iter().all(|m| m.id != member.id) {
                damage.push(MemberDamage {
                    id: member.id.clone(),
                    damage: 0,
                });
            }
        }
        let mut battle = Self {
            leader_id: leader.id.clone(),
            health: leader.health,
            max_health: leader.max_health,
            damage,
            monster,
            rounds: 0,
            state: BattleState::Engaged,
        };
        battle.check_resolution();
        battle
    }

    pub fn state(&self) -> BattleState {
        self.state
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.state, BattleState::Resolved(_))
    }

    pub fn leader_id(&self) -> &str {
        &self.leader_id
    }

    pub fn monster(&self) -> &Monster {
        &self.monster
    }

    /// Member ids in attack order.
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.damage.iter().map(|m| m.id.as_str())
    }

    fn check_resolution(&mut self) {
        if self.health <= 0 {
            self.state = BattleState::Resolved(BattleResult::Defeat);
        } else if !self.monster.is_alive() {
            self.state = BattleState::Resolved(BattleResult::Victory);
        }
    }

    /// Play one round. Returns `None` once the battle is resolved.
    pub fn round(&mut self, dice: &mut impl Dice) -> Option<RoundReport> {
        if self.is_resolved() {
            return None;
        }
        self.rounds += 1;
        let monster_roll = dice.roll(self.monster.damage_range());

        let mut hits = Vec::with_capacity(self.damage.len());
        for member in self.damage.iter_mut() {
            let hit = dice.roll(MEMBER_DAMAGE);
            self.monster.health -= hit;
            member.damage = member.damage.saturating_add(hit.max(0) as u32);
            hits.push((member.id.clone(), hit));
        }

        self.health -= monster_roll;
        self.check_resolution();

        Some(RoundReport {
            round: self.rounds,
            monster_roll,
            hits,
            monster_name: self.monster.name.clone(),
            player_health: self.health,
            player_percent: percent(self.health, self.max_health),
            monster_health: self.monster.health,
            monster_percent: self.monster.health_percent(),
        })
    }

    /// The final result, available once resolved.
    pub fn outcome(&self) -> Option<BattleOutcome> {
        match self.state {
            BattleState::Engaged => None,
            BattleState::Resolved(result) => Some(BattleOutcome {
                result,
                per_member_damage: self.damage.clone(),
                monster: self.monster.clone(),
                rounds: self.rounds,
                player_health: self.health,
            }),
        }
    }

    /// Play rounds until resolved without pausing.
    pub fn run_to_completion(&mut self, dice: &mut impl Dice) -> BattleOutcome {
        loop {
            if let Some(outcome) = self.outcome() {
                return outcome;
            }
            self.round(dice);
        }
    }
}
