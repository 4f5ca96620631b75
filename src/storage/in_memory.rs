//! In-memory implementation of Store for testing and development

use crate::core::field::Identity;
use crate::core::query::Predicate;
use crate::core::store::{Row, Store};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock};

/// Rows of one collection, keyed by encoded identity, in insertion order
type Collection = IndexMap<String, Row>;

/// Encode a composite key independently of component order
fn encode_key(key: &Identity) -> Result<String> {
    let ordered: BTreeMap<&String, _> = key.iter().collect();
    Ok(serde_json::to_string(&ordered)?)
}

/// In-memory store holding the committed state
///
/// Useful for testing and development. Uses RwLock for thread-safe access.
/// All access goes through [`InMemorySession`]s handed out by [`session`](Self::session).
#[derive(Clone, Default)]
pub struct InMemoryStore {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
}

impl InMemoryStore {
    /// Create a new, empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a unit of work against this store
    pub fn session(&self) -> InMemorySession {
        InMemorySession {
            store: self.clone(),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Number of committed rows in `collection`
    pub fn count(&self, collection: &str) -> Result<usize> {
        let collections = self
            .collections
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(collections.get(collection).map_or(0, IndexMap::len))
    }
}

#[derive(Debug, Clone)]
enum Change {
    Put {
        collection: String,
        key: String,
        row: Row,
    },
    Remove {
        collection: String,
        key: String,
    },
}

impl Change {
    fn collection(&self) -> &str {
        match self {
            Change::Put { collection, .. } | Change::Remove { collection, .. } => collection,
        }
    }

    fn apply(self, collections: &mut HashMap<String, Collection>) {
        match self {
            Change::Put {
                collection,
                key,
                row,
            } => {
                collections.entry(collection).or_default().insert(key, row);
            }
            Change::Remove { collection, key } => {
                if let Some(rows) = collections.get_mut(&collection) {
                    rows.shift_remove(&key);
                }
            }
        }
    }
}

/// A unit of work over an [`InMemoryStore`].
///
/// Staged changes are visible to this session's reads only, and are dropped
/// with the session unless committed.
pub struct InMemorySession {
    store: InMemoryStore,
    pending: Mutex<Vec<Change>>,
}

impl InMemorySession {
    /// Number of staged, uncommitted changes
    pub fn pending_changes(&self) -> Result<usize> {
        let pending = self
            .pending
            .lock()
            .map_err(|e| anyhow!("Failed to acquire pending lock: {}", e))?;

        Ok(pending.len())
    }

    fn stage(&self, change: Change) -> Result<()> {
        let mut pending = self
            .pending
            .lock()
            .map_err(|e| anyhow!("Failed to acquire pending lock: {}", e))?;

        pending.push(change);

        Ok(())
    }

    /// Committed rows of `collection` with this session's changes applied
    fn view(&self, collection: &str) -> Result<Collection> {
        let mut view = {
            let collections = self
                .store
                .collections
                .read()
                .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;
            let mut snapshot = HashMap::new();
            if let Some(rows) = collections.get(collection) {
                snapshot.insert(collection.to_string(), rows.clone());
            }
            snapshot
        };

        let pending = self
            .pending
            .lock()
            .map_err(|e| anyhow!("Failed to acquire pending lock: {}", e))?;
        for change in pending.iter().filter(|c| c.collection() == collection) {
            change.clone().apply(&mut view);
        }

        Ok(view.remove(collection).unwrap_or_default())
    }
}

#[async_trait]
impl Store for InMemorySession {
    async fn get(&self, collection: &str, key: &Identity) -> Result<Option<Row>> {
        let encoded = encode_key(key)?;
        Ok(self.view(collection)?.shift_remove(&encoded))
    }

    async fn add(&self, collection: &str, key: Identity, row: Row) -> Result<()> {
        self.stage(Change::Put {
            collection: collection.to_string(),
            key: encode_key(&key)?,
            row,
        })
    }

    async fn delete(&self, collection: &str, key: &Identity) -> Result<()> {
        self.stage(Change::Remove {
            collection: collection.to_string(),
            key: encode_key(key)?,
        })
    }

    async fn commit(&self) -> Result<()> {
        let changes: Vec<Change> = {
            let mut pending = self
                .pending
                .lock()
                .map_err(|e| anyhow!("Failed to acquire pending lock: {}", e))?;
            pending.drain(..).collect()
        };

        let mut collections = self
            .store
            .collections
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        for change in changes {
            change.apply(&mut collections);
        }

        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        let mut pending = self
            .pending
            .lock()
            .map_err(|e| anyhow!("Failed to acquire pending lock: {}", e))?;

        pending.clear();

        Ok(())
    }

    async fn select(&self, collection: &str, predicates: &[Predicate]) -> Result<Vec<Row>> {
        Ok(self
            .view(collection)?
            .into_values()
            .filter(|row| predicates.iter().all(|p| p.matches(row)))
            .collect())
    }
}
