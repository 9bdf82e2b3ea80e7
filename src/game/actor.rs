//! Serialized access point for the player store.
//!
//! A single worker owns the [`RecordStore`] and executes jobs one at a time in
//! arrival order. Every logical mutation (a battle commit, a purchase, an item
//! use) is submitted as one job, so its load → mutate → save sequence can never
//! interleave with another writer in this process.

use log::debug;
use tokio::sync::{mpsc, oneshot};

use crate::game::errors::GameError;
use crate::game::storage::RecordStore;
use crate::game::types::{Database, Item, PlayerRecord};

type Job = Box<dyn FnOnce(&RecordStore) + Send>;

enum StoreCommand {
    Run(Job),
    Shutdown(oneshot::Sender<()>),
}

/// Cloneable handle to the store worker.
#[derive(Clone, Debug)]
pub struct StoreHandle {
    tx: mpsc::UnboundedSender<StoreCommand>,
}

/// Start the store worker on tokio's blocking pool and return its handle.
pub fn start_store(store: RecordStore) -> StoreHandle {
    let (tx, mut rx) = mpsc::unbounded_channel::<StoreCommand>();
    tokio::task::spawn_blocking(move || {
        debug!("player store worker started for {:?}", store.path());
        while let Some(cmd) = rx.blocking_recv() {
            match cmd {
                StoreCommand::Run(job) => job(&store),
                StoreCommand::Shutdown(done) => {
                    let _ = done.send(());
                    break;
                }
            }
        }
        debug!("player store worker terminated");
    });
    StoreHandle { tx }
}

impl StoreHandle {
    /// Run `f` against the store on the worker and await its result.
    pub async fn call<T, F>(&self, f: F) -> Result<T, GameError>
    where
        T: Send + 'static,
        F: FnOnce(&RecordStore) -> T + Send + 'static,
    {
        let (resp_tx, resp_rx) = oneshot::channel();
        let job: Job = Box::new(move |store| {
            let _ = resp_tx.send(f(store));
        });
        self.tx
            .send(StoreCommand::Run(job))
            .map_err(|_| GameError::StoreClosed)?;
        resp_rx.await.map_err(|_| GameError::StoreClosed)
    }

    /// Atomic read-modify-write of the whole snapshot; nothing is written when `f` fails.
    pub async fn update<T, F>(&self, f: F) -> Result<T, GameError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Database) -> Result<T, GameError> + Send + 'static,
    {
        self.call(move |store| store.update(f)).await?
    }

    pub async fn load(&self) -> Result<Database, GameError> {
        self.call(|store| store.load()).await
    }

    pub async fn exists(&self, id: &str) -> Result<bool, GameError> {
        let id = id.to_string();
        self.call(move |store| store.exists(&id)).await
    }

    pub async fn get(&self, id: &str) -> Result<Option<PlayerRecord>, GameError> {
        let id = id.to_string();
        self.call(move |store| store.get(&id)).await
    }

    /// Fetch a record or fail with `NotFound`.
    pub async fn require(&self, id: &str) -> Result<PlayerRecord, GameError> {
        self.get(id)
            .await?
            .ok_or_else(|| GameError::NotFound(id.to_string()))
    }

    pub async fn create(&self, id: &str) -> Result<PlayerRecord, GameError> {
        let id = id.to_string();
        self.call(move |store| store.create(&id)).await?
    }

    pub async fn delete(&self, id: &str) -> Result<PlayerRecord, GameError> {
        let id = id.to_string();
        self.call(move |store| store.delete(&id)).await?
    }

    pub async fn add_item(&self, id: &str, item: Item) -> Result<(), GameError> {
        let id = id.to_string();
        self.call(move |store| store.add_item(&id, item)).await?
    }

    pub async fn remove_item(&self, id: &str, item: Item) -> Result<bool, GameError> {
        let id = id.to_string();
        self.call(move |store| store.remove_item(&id, &item)).await?
    }

    /// Stop the worker after already queued jobs have run.
    pub async fn shutdown(&self) {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(StoreCommand::Shutdown(tx)).is_ok() {
            let _ = rx.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn concurrent_updates_are_not_lost() {
        let dir = TempDir::new().expect("tempdir");
        let store = RecordStore::open(dir.path().join("players.json")).expect("store");
        let handle = start_store(store);
        handle.create("alice").await.expect("create");
        handle.create("bob").await.expect("create");

        let mut tasks = Vec::new();
        for i in 0..20u32 {
            let h = handle.clone();
            let id = if i % 2 == 0 { "alice" } else { "bob" };
            tasks.push(tokio::spawn(async move {
                h.add_item(id, Item::currency("Gold", 1)).await
            }));
        }
        for t in tasks {
            t.await.expect("join").expect("add");
        }
        let db = handle.load().await.expect("load");
        assert_eq!(db.players["alice"].currency, 10);
        assert_eq!(db.players["bob"].currency, 10);
    }

    #[tokio::test]
    async fn item_round_trip_through_the_worker() {
        let dir = TempDir::new().expect("tempdir");
        let handle = start_store(RecordStore::open(dir.path().join("p.json")).expect("store"));
        assert!(!handle.exists("dana").await.expect("exists"));
        handle.create("dana").await.expect("create");
        assert!(handle.exists("dana").await.expect("exists"));

        let herb = Item::healing("Herb", 5);
        handle.add_item("dana", herb.clone()).await.expect("add");
        assert!(handle.remove_item("dana", herb.clone()).await.expect("remove"));
        assert!(!handle.remove_item("dana", herb).await.expect("remove"));
        handle.delete("dana").await.expect("delete");
        assert!(matches!(handle.require("dana").await, Err(GameError::NotFound(_))));
    }

    #[tokio::test]
    async fn calls_after_shutdown_report_closed() {
        let dir = TempDir::new().expect("tempdir");
        let store = RecordStore::open(dir.path().join("players.json")).expect("store");
        let handle = start_store(store);
        handle.shutdown().await;
        assert!(matches!(handle.get("x").await, Err(GameError::StoreClosed)));
    }
}
