//! Shop catalog and purchase transaction.
//!
//! The interactive part (show the catalog, wait for the player's choice) lives
//! in [`crate::game::service::GameService::shop`]; this module only knows how to
//! find a catalog entry and apply a purchase to a snapshot.

use serde::{Deserialize, Serialize};

use crate::game::errors::GameError;
use crate::game::types::{Database, Item, ItemKind};

/// A purchasable entry. `price` exists only here; owned copies drop it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub value: u32,
    pub price: u64,
}

impl CatalogItem {
    pub fn new(name: &str, kind: ItemKind, value: u32, price: u64) -> Self {
        Self {
            name: name.to_string(),
            kind,
            value,
            price,
        }
    }

    /// The owned item a buyer receives.
    pub fn to_item(&self) -> Item {
        Item::new(self.name.clone(), self.kind.clone(), self.value)
    }
}

pub fn default_catalog() -> Vec<CatalogItem> {
    vec![
        CatalogItem::new("Health Potion", ItemKind::Healing, 20, 50),
        CatalogItem::new("Super Potion", ItemKind::Healing, 50, 100),
        CatalogItem::new("Mega Potion", ItemKind::Healing, 100, 200),
    ]
}

/// Case-insensitive lookup of a catalog entry.
pub fn find<'a>(catalog: &'a [CatalogItem], name: &str) -> Option<&'a CatalogItem> {
    let wanted = name.trim();
    catalog
        .iter()
        .find(|entry| entry.name.eq_ignore_ascii_case(wanted))
}

/// Result of a successful purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub item: Item,
    pub price: u64,
    pub balance: u64,
}

/// Debit the price and hand over the item in one mutation of `db`. Nothing is
/// changed when the buyer is missing, the item is unknown, or funds are short.
pub fn apply_purchase(
    db: &mut Database,
    catalog: &[CatalogItem],
    id: &str,
    item_name: &str,
) -> Result<Receipt, GameError> {
    let player = db
        .players
        .get_mut(id)
        .ok_or_else(|| GameError::NotFound(id.to_string()))?;
    let entry = find(catalog, item_name)
        .ok_or_else(|| GameError::UnknownItem(item_name.trim().to_string()))?;
    if player.currency < entry.price {
        return Err(GameError::InsufficientFunds {
            price: entry.price,
            balance: player.currency,
        });
    }
    player.currency -= entry.price;
    let item = entry.to_item();
    player.add_item(item.clone());
    Ok(Receipt {
        item,
        price: entry.price,
        balance: player.currency,
    })
}

/// Terminal state of an interactive shop visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShopOutcome {
    Purchased(Receipt),
    InsufficientFunds { item: String, price: u64, balance: u64 },
    UnknownItem(String),
    /// No reply arrived in time (or the conversation went away).
    Cancelled,
}
