//! # Questbot - Chat RPG Combat and Loot Engine
//!
//! Questbot runs a small role-playing game behind chat commands: players
//! create a character, fight random monsters alone or with a party, split the
//! loot by damage dealt, buy potions and heal between fights.
//!
//! ## Features
//!
//! - **Turn-based battles**: Monster and party roll each round; narration is delivered per round.
//! - **Party loot**: Rewards split by damage share, with a configurable remainder policy.
//! - **Shop**: Interactive purchase with a reply timeout.
//! - **Durable records**: One JSON snapshot guarded by a file lock and replaced atomically.
//! - **Async Design**: Built with Tokio; store access is serialized through an actor.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use questbot::config::Config;
//! use questbot::game::{start_store, GameService, RecordStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let store = start_store(RecordStore::open(config.storage.players_path())?);
//!     let service = GameService::new(store, config.game.clone());
//!
//!     service.create("alice").await?;
//!     let summary = service.battle("alice", |_round| {}).await?;
//!     println!("{:?} in {} rounds", summary.outcome.result, summary.outcome.rounds);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`game`] - Engine, persistence and command front-end
//! - [`config`] - Configuration management and validation
//! - [`logutil`] - Single-line log sanitizing for player text

pub mod config;
pub mod game;
pub mod logutil;
