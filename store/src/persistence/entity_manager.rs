//! Generic in-memory collection backed by a [`JsonStore`] file.
//!
//! The collection is read once when the manager is constructed and is the
//! source of truth from then on. Every mutation rewrites the file before it
//! returns. A failed write is logged and recorded in [`StorageStatus`]; the
//! in-memory change is kept.
//!
//! Stored records that no longer decode are held back verbatim and written
//! out again on every save. Their ids stay reserved and the collection
//! reports a load error until they are repaired by hand. A file that could
//! not be read at all is never overwritten.

use super::{EntityKind, JsonStore, StoreError};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

pub type EntityId = u64;

/// A record that lives in one collection and is keyed by an integer id.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> EntityId;
}

/// Insert payload that knows how to build the full record, filling defaults.
pub trait NewEntity<T> {
    fn build(self, id: EntityId) -> T;
}

/// Partial update. Fields left unset keep their current value.
pub trait Patch<T> {
    fn apply(self, target: &mut T);
}

/// Whether the backing file is in sync with memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageStatus {
    pub load_error: Option<String>,
    pub save_error: Option<String>,
}

impl StorageStatus {
    pub fn is_healthy(&self) -> bool {
        self.load_error.is_none() && self.save_error.is_none()
    }

    fn reason(&self) -> Option<String> {
        self.save_error.clone().or_else(|| self.load_error.clone())
    }
}

struct Collection<T> {
    records: BTreeMap<EntityId, T>,
    next_id: EntityId,
    status: StorageStatus,
    /// Undecodable records from the file, written back unchanged.
    retained: Vec<Value>,
    /// Set when the file exists but could not be read.
    read_only: bool,
}

pub struct EntityManager<T: Entity> {
    store: JsonStore,
    state: RwLock<Collection<T>>,
}

impl<T: Entity> EntityManager<T> {
    /// An empty manager that has not read its file. Ids start at 1.
    pub fn new(store: JsonStore) -> Self {
        Self {
            store,
            state: RwLock::new(Collection {
                records: BTreeMap::new(),
                next_id: 1,
                status: StorageStatus::default(),
                retained: Vec::new(),
                read_only: false,
            }),
        }
    }

    /// Construct a manager and populate it from its file.
    pub async fn load(store: JsonStore) -> Self {
        let manager = Self::new(store);
        manager.populate().await;
        manager
    }

    async fn populate(&self) {
        let kind = T::KIND;
        let mut state = self.state.write().await;
        match self.store.load_collection::<T>(kind).await {
            Ok(loaded) => {
                for record in loaded.records {
                    let id = record.id();
                    if state.records.insert(id, record).is_some() {
                        tracing::warn!(
                            entity = %kind,
                            id,
                            "Duplicate id in file, keeping the later one"
                        );
                    }
                }
                let decoded_max = state.records.keys().next_back().copied();
                let next_id = decoded_max.max(loaded.highest_id).map_or(1, |max| max + 1);
                state.next_id = next_id;
                if !loaded.skipped.is_empty() {
                    let skipped = loaded.skipped.len();
                    tracing::warn!(
                        entity = %kind,
                        skipped,
                        "Keeping undecodable records as stored"
                    );
                    state.status.load_error = Some(format!(
                        "{skipped} stored record(s) could not be decoded and are kept as-is"
                    ));
                    state.retained = loaded.skipped;
                }
                tracing::info!(
                    entity = %kind,
                    count = state.records.len(),
                    next_id = state.next_id,
                    "Loaded collection"
                );
            }
            Err(e) => {
                tracing::warn!(entity = %kind, "Failed to load collection, starting empty: {}", e);
                state.status.load_error = Some(e.to_string());
                state.read_only = true;
            }
        }
    }

    pub fn kind(&self) -> EntityKind {
        T::KIND
    }

    pub fn store(&self) -> &JsonStore {
        &self.store
    }

    pub async fn get(&self, id: EntityId) -> Option<T> {
        self.state.read().await.records.get(&id).cloned()
    }

    /// Like [`get`](Self::get), but says why nothing came back.
    pub async fn fetch(&self, id: EntityId) -> Result<T, StoreError> {
        let state = self.state.read().await;
        if let Some(record) = state.records.get(&id) {
            return Ok(record.clone());
        }
        match state.status.reason() {
            Some(reason) => Err(StoreError::StorageUnavailable {
                kind: T::KIND,
                reason,
            }),
            None => Err(StoreError::NotFound { kind: T::KIND, id }),
        }
    }

    /// All records, in ascending id order.
    pub async fn get_all(&self) -> Vec<T> {
        self.state.read().await.records.values().cloned().collect()
    }

    pub async fn find(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.state
            .read()
            .await
            .records
            .values()
            .filter(|r| predicate(r))
            .cloned()
            .collect()
    }

    pub async fn find_one(&self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        self.state
            .read()
            .await
            .records
            .values()
            .find(|r| predicate(r))
            .cloned()
    }

    pub async fn count(&self) -> usize {
        self.state.read().await.records.len()
    }

    pub async fn storage_status(&self) -> StorageStatus {
        self.state.read().await.status.clone()
    }

    /// Allocate the next id and insert the record built by `input`.
    pub async fn create(&self, input: impl NewEntity<T>) -> T {
        self.create_with(input, NewEntity::build).await
    }

    /// Allocate the next id and insert whatever `construct` builds from it.
    pub async fn create_with<I>(&self, input: I, construct: impl FnOnce(I, EntityId) -> T) -> T {
        let mut state = self.state.write().await;
        let id = state.next_id;
        state.next_id += 1;

        let record = construct(input, id);
        debug_assert_eq!(record.id(), id, "constructor must keep the allocated id");
        state.records.insert(id, record.clone());
        tracing::debug!(entity = %T::KIND, id, "Created record");

        self.persist(&mut state).await;
        record
    }

    /// Merge `patch` into the record. Returns `None` if there is no such id.
    pub async fn update(&self, id: EntityId, patch: impl Patch<T>) -> Option<T> {
        let mut state = self.state.write().await;
        let record = state.records.get_mut(&id)?;
        patch.apply(record);
        debug_assert_eq!(record.id(), id, "patches must not change the id");
        let updated = record.clone();
        tracing::debug!(entity = %T::KIND, id, "Updated record");

        self.persist(&mut state).await;
        Some(updated)
    }

    /// Patch the first record matching `predicate`, or create one from `input`.
    ///
    /// Lookup and write happen under one lock, so concurrent callers with the
    /// same key never create two records.
    pub async fn upsert(
        &self,
        predicate: impl Fn(&T) -> bool,
        patch: impl Patch<T>,
        input: impl NewEntity<T>,
    ) -> T {
        let mut state = self.state.write().await;
        let existing = state
            .records
            .values()
            .find(|r| predicate(r))
            .map(Entity::id);
        let found = match existing {
            Some(id) => state.records.get_mut(&id),
            None => None,
        };

        let record = match found {
            Some(record) => {
                patch.apply(record);
                tracing::debug!(entity = %T::KIND, id = record.id(), "Updated record");
                record.clone()
            }
            None => {
                let id = state.next_id;
                state.next_id += 1;
                let record = input.build(id);
                state.records.insert(id, record.clone());
                tracing::debug!(entity = %T::KIND, id, "Created record");
                record
            }
        };

        self.persist(&mut state).await;
        record
    }

    /// Remove a record. Returns `false` (and leaves the file alone) if it was absent.
    pub async fn delete(&self, id: EntityId) -> bool {
        let mut state = self.state.write().await;
        if state.records.remove(&id).is_none() {
            return false;
        }
        tracing::debug!(entity = %T::KIND, id, "Deleted record");

        self.persist(&mut state).await;
        true
    }

    /// Remove every record matching `predicate`, writing the file once.
    pub async fn delete_many(&self, predicate: impl Fn(&T) -> bool) -> usize {
        let mut state = self.state.write().await;
        let before = state.records.len();
        state.records.retain(|_, r| !predicate(r));
        let removed = before - state.records.len();
        if removed > 0 {
            tracing::debug!(entity = %T::KIND, removed, "Deleted records");
            self.persist(&mut state).await;
        }
        removed
    }

    async fn persist(&self, state: &mut Collection<T>) {
        if state.read_only {
            tracing::warn!(
                entity = %T::KIND,
                "Not overwriting a collection file that failed to load"
            );
            state.status.save_error =
                Some("changes kept in memory only: the file failed to load".to_string());
            return;
        }
        let result = if state.retained.is_empty() {
            let records: Vec<&T> = state.records.values().collect();
            self.store.save_data(T::KIND, &records).await
        } else {
            match Self::snapshot_with_retained(state) {
                Ok(rows) => self.store.save_data(T::KIND, &rows).await,
                Err(e) => Err(e.into()),
            }
        };
        match result {
            Ok(()) => state.status.save_error = None,
            Err(e) => {
                tracing::warn!(entity = %T::KIND, "Failed to persist collection: {}", e);
                state.status.save_error = Some(e.to_string());
            }
        }
    }

    fn snapshot_with_retained(state: &Collection<T>) -> Result<Vec<Value>, serde_json::Error> {
        let mut rows = state
            .records
            .values()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        rows.extend(state.retained.iter().cloned());
        Ok(rows)
    }
}
