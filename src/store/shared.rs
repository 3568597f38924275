//! Concurrent handle over a [`Store`] with debounced persistence.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{debug, error, info};

use super::persist::JsonFile;
use super::{seed, Store};
use crate::config::StoreConfig;
use crate::publisher::EventPublisher;
use crate::Result;

/// Cheap to clone; every clone shares one store.
///
/// Reads run concurrently. Mutations are serialized through [`ShopStore::mutate`],
/// which also schedules a save and publishes the events the mutation raised.
#[derive(Clone)]
pub struct ShopStore {
    inner: Arc<Inner>,
}

struct Inner {
    store: RwLock<Store>,
    file: Option<JsonFile>,
    /// Serializes writers of the data file.
    write_lock: Mutex<()>,
    save_requests: Option<mpsc::Sender<()>>,
    publisher: EventPublisher,
    saves: AtomicU64,
}

impl ShopStore {
    /// Loads the configured data file (or starts in memory) and starts the writer task.
    pub async fn open(config: &StoreConfig, publisher: EventPublisher) -> Result<Self> {
        let file = config.data_file.clone().map(JsonFile::new);
        let mut store = match &file {
            Some(file) => file.load().await?,
            None => {
                info!("no data file configured, store is in memory only");
                Store::new()
            }
        };
        let seeded = config.seed_demo && seed::seed_demo(&mut store)?;

        let (tx, rx) = match file {
            Some(_) => {
                let (tx, rx) = mpsc::channel(1);
                (Some(tx), Some(rx))
            }
            None => (None, None),
        };
        let shop = Self::build(store, file, tx, publisher);
        if let Some(rx) = rx {
            spawn_writer(Arc::downgrade(&shop.inner), rx, config.persist_debounce);
        }
        if seeded {
            shop.flush().await?;
        }
        Ok(shop)
    }

    /// A store that is never written to disk and publishes nowhere.
    pub fn in_memory() -> Self {
        Self::from_store(Store::new())
    }

    pub fn from_store(store: Store) -> Self {
        Self::build(store, None, None, EventPublisher::disabled())
    }

    fn build(store: Store, file: Option<JsonFile>, save_requests: Option<mpsc::Sender<()>>, publisher: EventPublisher) -> Self {
        Self {
            inner: Arc::new(Inner {
                store: RwLock::new(store),
                file,
                write_lock: Mutex::new(()),
                save_requests,
                publisher,
                saves: AtomicU64::new(0),
            }),
        }
    }

    pub async fn read<R>(&self, f: impl FnOnce(&Store) -> R) -> R {
        let store = self.inner.store.read().await;
        f(&store)
    }

    /// Runs `f` with exclusive access. On success the change is scheduled for
    /// saving and raised events are published; on error events are discarded.
    pub async fn mutate<R>(&self, f: impl FnOnce(&mut Store) -> Result<R>) -> Result<R> {
        let (result, events) = {
            let mut store = self.inner.store.write().await;
            let result = f(&mut store);
            (result, store.take_events())
        };
        if result.is_ok() {
            self.schedule_save();
            self.inner.publisher.publish(&events).await;
        }
        result
    }

    /// A point-in-time copy of the whole store.
    pub async fn snapshot(&self) -> Store {
        self.inner.store.read().await.clone()
    }

    /// Writes the store now, bypassing the debounce.
    pub async fn flush(&self) -> Result<()> {
        self.inner.save().await
    }

    pub fn is_persistent(&self) -> bool { self.inner.file.is_some() }

    /// Number of times the data file has been written by this handle's store.
    pub fn saves_written(&self) -> u64 { self.inner.saves.load(Ordering::Relaxed) }

    fn schedule_save(&self) {
        if let Some(tx) = &self.inner.save_requests {
            // A full channel already has a save pending.
            let _ = tx.try_send(());
        }
    }
}

impl Inner {
    async fn save(&self) -> Result<()> {
        let Some(file) = &self.file else { return Ok(()) };
        let _guard = self.write_lock.lock().await;
        let contents = {
            let store = self.store.read().await;
            serde_json::to_string_pretty(&*store)?
        };
        file.write(&contents).await?;
        self.saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Coalesces save requests arriving within `debounce` into one write.
///
/// Holds only a weak reference, so it stops once every handle is dropped.
fn spawn_writer(inner: Weak<Inner>, mut requests: mpsc::Receiver<()>, debounce: Duration) {
    tokio::spawn(async move {
        while requests.recv().await.is_some() {
            tokio::time::sleep(debounce).await;
            while requests.try_recv().is_ok() {}
            let Some(inner) = inner.upgrade() else { break };
            match inner.save().await {
                Ok(()) => debug!("store persisted"),
                Err(err) => error!(%err, "failed to persist store"),
            }
        }
        debug!("store writer stopped");
    });
}
