use thiserror::Error;

/// Errors surfaced by the game engine and its record store.
///
/// Every variant is local and recoverable: callers render them as guidance
/// messages and carry on.
#[derive(Debug, Error)]
pub enum GameError {
    /// No character exists for the given player id.
    #[error("no character for player {0}")]
    NotFound(String),

    /// A character already exists for the given player id.
    #[error("player {0} already has a character")]
    AlreadyExists(String),

    /// Wallet balance is below the item price.
    #[error("insufficient funds: need {price}, have {balance}")]
    InsufficientFunds { price: u64, balance: u64 },

    /// Item name does not match any catalog entry.
    #[error("unknown item: {0}")]
    UnknownItem(String),

    /// Item use attempted with nothing in the inventory.
    #[error("inventory is empty")]
    EmptyInventory,

    /// The named item is not owned or cannot be used for healing.
    #[error("{0} cannot be used")]
    NotUsable(String),

    /// Rejected party edit.
    #[error("invalid party change: {0}")]
    InvalidParty(String),

    /// Rejected display name.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// The monster table is empty, so no battle can start.
    #[error("no monsters configured")]
    NoMonsters,

    /// Backing snapshot could not be parsed. The store recovers from this by
    /// loading an empty database; the variant exists for logging and reporting.
    #[error("player store is corrupt: {0}")]
    StoreCorrupt(String),

    /// Interactive exchange expired before the player replied.
    #[error("timed out waiting for a reply")]
    InteractionTimeout,

    /// The store actor is no longer running.
    #[error("player store is unavailable")]
    StoreClosed,

    /// Wrapper around IO errors (directory creation, locking, rename).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapper around JSON serialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
