//! Test utilities & fixtures.
//! Builds a game service over a throwaway player file.

use questbot::config::GameConfig;
use questbot::game::{start_store, GameService, RecordStore};
use tempfile::TempDir;

/// Game settings with no pacing delay so battles finish instantly.
pub fn fast_game() -> GameConfig {
    GameConfig {
        round_delay_ms: 0,
        ..GameConfig::default()
    }
}

/// A service backed by `players.json` inside a fresh temp dir. Keep the
/// returned `TempDir` alive for the duration of the test.
pub fn service_with(game: GameConfig) -> (TempDir, GameService) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = RecordStore::open(dir.path().join("players.json")).expect("open store");
    let service = GameService::new(start_store(store), game);
    (dir, service)
}

#[allow(dead_code)]
pub fn service() -> (TempDir, GameService) {
    service_with(fast_game())
}
