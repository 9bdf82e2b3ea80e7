//! # Configuration Management Module
//!
//! Central TOML configuration for the battle bot, with serde defaults for every
//! field so a partial file still loads.
//!
//! ## Configuration Structure
//!
//! - [`GameConfig`] - Pacing, loot policy, monster table and shop catalog
//! - [`StorageConfig`] - Where the player snapshot lives
//! - [`LoggingConfig`] - Log level and optional log file
//!
//! ## Usage
//!
//! ```rust,no_run
//! use questbot::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     println!("Players file: {}", config.storage.players_path().display());
//!     Config::create_default("config.toml").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [game]
//! round_delay_ms = 1000
//! shop_timeout_secs = 30
//! loot_remainder = "truncate"   # or "top_contributor"
//!
//! [storage]
//! data_dir = "./data"
//! players_file = "players.json"
//!
//! [logging]
//! level = "info"
//! file = "questbot.log"
//! ```
//!
//! The monster table (`[[game.monsters]]`) and shop catalog (`[[game.shop]]`)
//! default to the built-in lists when omitted.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::game::loot::RemainderPolicy;
use crate::game::monster::{default_bestiary, Monster};
use crate::game::shop::{default_catalog, CatalogItem};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Pause between battle rounds so narration arrives incrementally.
    #[serde(default = "default_round_delay_ms")]
    pub round_delay_ms: u64,
    /// How long the shop waits for the player's choice before cancelling.
    #[serde(default = "default_shop_timeout_secs")]
    pub shop_timeout_secs: u64,
    #[serde(default)]
    pub loot_remainder: RemainderPolicy,
    #[serde(default = "default_bestiary")]
    pub monsters: Vec<Monster>,
    #[serde(default = "default_catalog")]
    pub shop: Vec<CatalogItem>,
}

fn default_round_delay_ms() -> u64 {
    1000
}

fn default_shop_timeout_secs() -> u64 {
    30
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            round_delay_ms: default_round_delay_ms(),
            shop_timeout_secs: default_shop_timeout_secs(),
            loot_remainder: RemainderPolicy::default(),
            monsters: default_bestiary(),
            shop: default_catalog(),
        }
    }
}

impl GameConfig {
    pub fn round_delay(&self) -> Duration {
        Duration::from_millis(self.round_delay_ms)
    }

    pub fn shop_timeout(&self) -> Duration {
        Duration::from_secs(self.shop_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
    #[serde(default = "default_players_file")]
    pub players_file: String,
}

fn default_players_file() -> String {
    "players.json".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            players_file: default_players_file(),
        }
    }
}

impl StorageConfig {
    pub fn players_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.players_file)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Parse `level`, falling back to `Info` for unknown values.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Reject tables the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.game.monsters.is_empty() {
            return Err(anyhow!("game.monsters must list at least one monster"));
        }
        for monster in &self.game.monsters {
            if monster.max_health <= 0 {
                return Err(anyhow!("monster {} needs a positive max_health", monster.name));
            }
            let (lo, hi) = monster.damage;
            if lo <= 0 || hi < lo {
                return Err(anyhow!(
                    "monster {} has an invalid damage range ({}, {})",
                    monster.name,
                    lo,
                    hi
                ));
            }
        }
        if self.storage.players_file.trim().is_empty() {
            return Err(anyhow!("storage.players_file must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        config.validate().expect("valid");
        assert_eq!(config.game.round_delay(), Duration::from_secs(1));
        assert_eq!(config.game.shop_timeout(), Duration::from_secs(30));
        assert_eq!(config.game.monsters.len(), 2);
        assert_eq!(config.game.shop.len(), 3);
        assert_eq!(
            config.storage.players_path(),
            Path::new("./data").join("players.json")
        );
    }

    #[test]
    fn partial_file_fills_defaults() {
        let raw = r#"
            [game]
            round_delay_ms = 0
            loot_remainder = "top_contributor"

            [storage]
            data_dir = "/tmp/qb"
        "#;
        let config: Config = toml::from_str(raw).expect("parse");
        assert_eq!(config.game.round_delay_ms, 0);
        assert_eq!(config.game.shop_timeout_secs, 30);
        assert_eq!(config.game.loot_remainder, RemainderPolicy::TopContributor);
        assert_eq!(config.storage.players_file, "players.json");
        assert_eq!(config.logging.level_filter(), log::LevelFilter::Info);
    }

    #[test]
    fn default_config_survives_toml_round_trip() {
        let serialized = toml::to_string_pretty(&Config::default()).expect("serialize");
        let parsed: Config = toml::from_str(&serialized).expect("parse");
        assert_eq!(parsed.game.monsters, default_bestiary());
        assert_eq!(parsed.game.shop, default_catalog());
    }

    #[test]
    fn create_default_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        let path = path.to_str().expect("utf8 path");
        tokio_test::block_on(Config::create_default(path)).expect("create");
        let config = tokio_test::block_on(Config::load(path)).expect("load");
        assert_eq!(config.game.round_delay_ms, 1000);
        assert_eq!(config.logging.level, "info");
        assert!(tokio_test::block_on(Config::load("/nonexistent/questbot.toml")).is_err());
    }

    #[test]
    fn monster_entries_need_no_health() {
        let raw = r#"
            [[game.monsters]]
            name = "Slime"
            level = 1
            max_health = 30
            damage = [5, 8]
            loot = [{ name = "Gold", type = "currency", value = 10 }]
        "#;
        let config: Config = toml::from_str(raw).expect("parse");
        config.validate().expect("valid");
        let slime = crate::game::battle::pick_monster(
            &config.game.monsters,
            &mut crate::game::battle::ScriptedDice::default(),
        )
        .expect("monster");
        assert_eq!(slime.name, "Slime");
        assert_eq!(slime.health, 30);
        assert!(slime.is_alive());
    }

    #[test]
    fn invalid_damage_range_is_rejected() {
        let mut config = Config::default();
        config.game.monsters[0].damage = (0, 4);
        assert!(config.validate().is_err());
        config.game.monsters.clear();
        assert!(config.validate().is_err());
    }
}
