//! Contribution-proportional loot distribution.
//!
//! Each member's share is their truncated integer percentage of the total
//! damage dealt; each loot template is scaled by that share and truncated
//! again. The double truncation can leave part of a template undistributed.
//! That loss is the default policy; [`RemainderPolicy::TopContributor`] hands
//! the leftover to the highest contributor instead.

use serde::{Deserialize, Serialize};

use crate::game::types::Item;

/// Cumulative damage one party member dealt during a battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDamage {
    pub id: String,
    pub damage: u32,
}

/// What to do with value lost to truncation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemainderPolicy {
    #[default]
    Truncate,
    TopContributor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberAward {
    pub id: String,
    /// Truncated percentage of total damage.
    pub share: u32,
    /// Non-zero awards only, in loot-table order.
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Distribution {
    pub awards: Vec<MemberAward>,
    /// Concatenation of every member's awards, for the combined summary.
    pub total: Vec<Item>,
}

/// Integer percentage of total damage per member, truncated. Members with no
/// damage still count toward the party but receive 0.
pub fn shares(damage: &[MemberDamage]) -> Vec<u32> {
    let total: u64 = damage.iter().map(|m| u64::from(m.damage)).sum();
    damage
        .iter()
        .map(|m| {
            if total == 0 {
                0
            } else {
                (u64::from(m.damage) * 100 / total) as u32
            }
        })
        .collect()
}

fn top_contributor(damage: &[MemberDamage]) -> Option<usize> {
    damage
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, u32)>, (idx, m)| match best {
            Some((_, top)) if top >= m.damage => best,
            _ => Some((idx, m.damage)),
        })
        .map(|(idx, _)| idx)
}

/// Split `loot` among the members in `damage` according to `policy`.
pub fn distribute(damage: &[MemberDamage], loot: &[Item], policy: RemainderPolicy) -> Distribution {
    let shares = shares(damage);

    // values[member][template]
    let mut values: Vec<Vec<u32>> = shares
        .iter()
        .map(|share| {
            loot.iter()
                .map(|template| (u64::from(template.value) * u64::from(*share) / 100) as u32)
                .collect()
        })
        .collect();

    if policy == RemainderPolicy::TopContributor {
        if let Some(top) = top_contributor(damage) {
            for (t, template) in loot.iter().enumerate() {
                let handed_out: u32 = values.iter().map(|row| row[t]).sum();
                let remainder = template.value.saturating_sub(handed_out);
                values[top][t] = values[top][t].saturating_add(remainder);
            }
        }
    }

    let mut dist = Distribution::default();
    for ((member, share), row) in damage.iter().zip(shares).zip(values) {
        let items: Vec<Item> = loot
            .iter()
            .zip(row)
            .filter(|(_, value)| *value > 0)
            .map(|(template, value)| template.with_value(value))
            .collect();
        dist.total.extend(items.iter().cloned());
        dist.awards.push(MemberAward {
            id: member.id.clone(),
            share,
            items,
        });
    }
    dist
}
