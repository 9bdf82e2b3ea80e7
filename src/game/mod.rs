//! # Game Engine
//!
//! Character records, turn-based battles with party loot sharing, the shop and
//! item use, all persisted through a single JSON snapshot file.
//!
//! ## Layout
//!
//! - [`types`] - Player records, items and the snapshot database
//! - [`storage`] - Locked, atomically replaced snapshot file
//! - [`actor`] - Serializes store access on one blocking worker
//! - [`monster`] / [`battle`] - Bestiary, dice and the round state machine
//! - [`loot`] - Damage-proportional reward splitting
//! - [`shop`] - Catalog lookup and the purchase transaction
//! - [`service`] - Async operations combining the above
//! - [`commands`] - Chat-style text front-end

pub mod actor;
pub mod battle;
pub mod commands;
pub mod errors;
pub mod loot;
pub mod monster;
pub mod service;
pub mod shop;
pub mod storage;
pub mod types;

pub use actor::{start_store, StoreHandle};
pub use battle::{Battle, BattleOutcome, BattleResult, Dice, RoundReport, ScriptedDice};
pub use commands::{Command, CommandProcessor};
pub use errors::GameError;
pub use loot::{distribute, Distribution, MemberDamage, RemainderPolicy};
pub use monster::Monster;
pub use service::{BattleSummary, GameService};
pub use shop::{CatalogItem, ShopOutcome};
pub use storage::RecordStore;
pub use types::{Database, Item, ItemKind, PlayerRecord};
