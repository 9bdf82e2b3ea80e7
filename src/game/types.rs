use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Starting and maximum health for freshly created characters.
pub const DEFAULT_MAX_HEALTH: i32 = 100;

/// Item category. `Currency` and `Healing` carry engine semantics; anything else
/// is kept verbatim as a free-form tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Currency,
    Healing,
    Other(String),
}

impl ItemKind {
    pub fn as_str(&self) -> &str {
        match self {
            ItemKind::Currency => "currency",
            ItemKind::Healing => "healing",
            ItemKind::Other(tag) => tag.as_str(),
        }
    }
}

impl From<&str> for ItemKind {
    fn from(raw: &str) -> Self {
        match raw {
            "currency" => ItemKind::Currency,
            "healing" => ItemKind::Healing,
            other => ItemKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Stored as a plain string: `"type": "healing"`.
impl Serialize for ItemKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ItemKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ItemKind::from(raw.as_str()))
    }
}

/// An owned item or a loot template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(default)]
    pub value: u32,
}

impl Item {
    pub fn new(name: impl Into<String>, kind: ItemKind, value: u32) -> Self {
        Self {
            name: name.into(),
            kind,
            value,
        }
    }

    pub fn currency(name: impl Into<String>, value: u32) -> Self {
        Self::new(name, ItemKind::Currency, value)
    }

    pub fn healing(name: impl Into<String>, value: u32) -> Self {
        Self::new(name, ItemKind::Healing, value)
    }

    /// Copy of this template carrying a different value (used for scaled loot awards).
    pub fn with_value(&self, value: u32) -> Self {
        Self {
            value,
            ..self.clone()
        }
    }
}

/// Persistent per-player game state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_level")]
    pub level: u32,
    /// Carried for compatibility; no operation awards experience yet.
    #[serde(default)]
    pub experience: u64,
    #[serde(default = "default_health")]
    pub health: i32,
    #[serde(default = "default_health")]
    pub max_health: i32,
    #[serde(default)]
    pub inventory: Vec<Item>,
    /// Authoritative wallet balance. Currency items are credited here and never
    /// kept in `inventory`.
    #[serde(default)]
    pub currency: u64,
    #[serde(default)]
    pub party: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_level() -> u32 {
    1
}

fn default_health() -> i32 {
    DEFAULT_MAX_HEALTH
}

impl PlayerRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            level: 1,
            experience: 0,
            health: DEFAULT_MAX_HEALTH,
            max_health: DEFAULT_MAX_HEALTH,
            inventory: Vec::new(),
            currency: 0,
            party: Vec::new(),
            created_at: Some(Utc::now()),
        }
    }

    /// Name used in narration: the display name when set, otherwise the id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Add an item. Currency is credited to the wallet; everything else is
    /// appended to the inventory in acquisition order.
    pub fn add_item(&mut self, item: Item) {
        match item.kind {
            ItemKind::Currency => {
                self.currency = self.currency.saturating_add(u64::from(item.value));
            }
            _ => self.inventory.push(item),
        }
    }

    /// Remove the first inventory entry equal to `item`. Returns whether one was removed.
    pub fn remove_item(&mut self, item: &Item) -> bool {
        match self.inventory.iter().position(|owned| owned == item) {
            Some(pos) => {
                self.inventory.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Raise health by `amount`, never above `max_health`. Returns the health actually restored.
    pub fn heal(&mut self, amount: u32) -> i32 {
        let before = self.health;
        let raised = i64::from(self.health) + i64::from(amount);
        self.health = raised.min(i64::from(self.max_health)) as i32;
        self.health - before
    }

    pub fn health_percent(&self) -> f64 {
        percent(self.health, self.max_health)
    }

    /// Restore the record invariants after loading data written by older versions:
    /// a positive `max_health`, `0 <= health <= max_health`, and no currency items
    /// in the inventory (their value was already counted in `currency`).
    pub fn normalize(&mut self) -> bool {
        let mut changed = false;
        if self.max_health <= 0 {
            self.max_health = DEFAULT_MAX_HEALTH;
            changed = true;
        }
        let clamped = self.health.clamp(0, self.max_health);
        if clamped != self.health {
            self.health = clamped;
            changed = true;
        }
        let before = self.inventory.len();
        self.inventory.retain(|item| item.kind != ItemKind::Currency);
        changed || before != self.inventory.len()
    }
}

/// Health expressed as a percentage of its maximum. Negative health yields a
/// negative percentage, matching the round narration.
pub fn percent(health: i32, max_health: i32) -> f64 {
    if max_health <= 0 {
        return 0.0;
    }
    f64::from(health) / f64::from(max_health) * 100.0
}

/// The whole persisted player collection, read and written as one unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Database {
    #[serde(default)]
    pub players: BTreeMap<String, PlayerRecord>,
}

impl Database {
    /// Apply [`PlayerRecord::normalize`] to every record; returns how many changed.
    pub fn normalize(&mut self) -> usize {
        self.players
            .values_mut()
            .map(|player| player.normalize())
            .filter(|changed| *changed)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_kind_round_trips_free_form_tags() {
        let item = Item::new("Rune", ItemKind::Other("trinket".into()), 3);
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"type\":\"trinket\""));
        let back: Item = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind, ItemKind::Other("trinket".into()));
    }

    #[test]
    fn currency_items_go_to_wallet() {
        let mut player = PlayerRecord::new("p1");
        player.add_item(Item::currency("Gold", 25));
        player.add_item(Item::healing("Health Potion", 20));
        assert_eq!(player.currency, 25);
        assert_eq!(player.inventory.len(), 1);
        assert_eq!(player.inventory[0].name, "Health Potion");
    }

    #[test]
    fn heal_clamps_to_max() {
        let mut player = PlayerRecord::new("p1");
        player.health = 90;
        assert_eq!(player.heal(50), 10);
        assert_eq!(player.health, player.max_health);
    }

    #[test]
    fn remove_item_takes_only_first_match() {
        let mut player = PlayerRecord::new("p1");
        let potion = Item::healing("Health Potion", 20);
        player.add_item(potion.clone());
        player.add_item(potion.clone());
        assert!(player.remove_item(&potion));
        assert_eq!(player.inventory.len(), 1);
        assert!(!player.remove_item(&Item::healing("Elixir", 5)));
    }

    #[test]
    fn normalize_reconciles_legacy_records() {
        let raw = r#"{
            "id": "42", "name": null, "level": 1, "experience": 0,
            "health": -7, "max_health": 100,
            "inventory": [{"name": "Gold", "type": "currency", "value": 50},
                          {"name": "Health Potion", "type": "healing", "value": 20, "price": 50}],
            "currency": 50, "party": []
        }"#;
        let mut player: PlayerRecord = serde_json::from_str(raw).unwrap();
        assert!(player.normalize());
        assert_eq!(player.health, 0);
        assert_eq!(player.currency, 50);
        assert_eq!(player.inventory, vec![Item::healing("Health Potion", 20)]);
    }
}
