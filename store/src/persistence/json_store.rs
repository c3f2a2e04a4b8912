use super::{dates, EntityKind, PersistenceError};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// One JSON array per entity kind, all in a single data directory.
///
/// Every save rewrites the whole collection. Writes go to a temp file that is
/// renamed over the target, so a crash never leaves a truncated file behind.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_path(&self, kind: EntityKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    /// Create the data directory if it does not exist yet.
    pub async fn init_data_directory(&self) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| PersistenceError::io(&self.dir, e))
    }

    /// Load a collection, treating any failure as an empty one.
    pub async fn load_data<T: DeserializeOwned>(&self, kind: EntityKind) -> Vec<T> {
        match self.try_load_data(kind).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(entity = %kind, "Failed to load collection: {}", e);
                Vec::new()
            }
        }
    }

    /// Load a collection, surfacing read and parse failures.
    ///
    /// A missing or blank file is an empty collection, not an error. Records
    /// that do not decode into `T` are skipped with a warning.
    pub async fn try_load_data<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
    ) -> Result<Vec<T>, PersistenceError> {
        Ok(self.load_collection(kind).await?.records)
    }

    /// Load a collection and keep what could not be decoded.
    ///
    /// Records that do not decode into `T` come back untouched in
    /// [`LoadedCollection::skipped`] so the caller can write them back.
    pub async fn load_collection<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
    ) -> Result<LoadedCollection<T>, PersistenceError> {
        let path = self.file_path(kind);
        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(LoadedCollection::default())
            }
            Err(e) => return Err(PersistenceError::io(&path, e)),
        };
        if contents.trim().is_empty() {
            return Ok(LoadedCollection::default());
        }

        let Value::Array(raw) = serde_json::from_str::<Value>(&contents)? else {
            return Err(PersistenceError::NotAnArray(path));
        };

        let fields = kind.date_fields();
        let mut loaded = LoadedCollection::default();
        for (index, mut value) in raw.into_iter().enumerate() {
            if let Some(id) = value.get("id").and_then(Value::as_u64) {
                loaded.highest_id = loaded.highest_id.max(Some(id));
            }
            for name in dates::rehydrate_record(&mut value, fields) {
                tracing::warn!(entity = %kind, index, field = name, "Unreadable timestamp");
            }
            match T::deserialize(&value) {
                Ok(record) => loaded.records.push(record),
                Err(e) => {
                    tracing::warn!(entity = %kind, index, "Skipping undecodable record: {}", e);
                    loaded.skipped.push(value);
                }
            }
        }

        Ok(loaded)
    }

    /// Overwrite the file for `kind` with the full collection.
    pub async fn save_data<T: Serialize>(
        &self,
        kind: EntityKind,
        records: &[T],
    ) -> Result<(), PersistenceError> {
        self.init_data_directory().await?;
        let json = serde_json::to_string_pretty(records)?;
        atomic_write_file(&self.file_path(kind), json.as_bytes()).await
    }
}

/// Result of reading one collection file.
#[derive(Debug)]
pub struct LoadedCollection<T> {
    pub records: Vec<T>,
    /// Records that did not decode, as stored (after timestamp normalisation).
    pub skipped: Vec<Value>,
    /// Largest numeric `id` in the file, counting skipped records.
    pub highest_id: Option<u64>,
}

impl<T> Default for LoadedCollection<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: Vec::new(),
            highest_id: None,
        }
    }
}

/// Write data to a temp file, fsync it, then rename it over the final path.
async fn atomic_write_file(final_path: &Path, data: &[u8]) -> Result<(), PersistenceError> {
    let file_name = final_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("collection");
    let temp_path = final_path.with_file_name(format!(
        ".{}.{}.tmp",
        file_name,
        uuid::Uuid::new_v4().simple()
    ));

    let mut file = fs::File::create(&temp_path)
        .await
        .map_err(|e| PersistenceError::io(&temp_path, e))?;
    file.write_all(data)
        .await
        .map_err(|e| PersistenceError::io(&temp_path, e))?;
    file.sync_all()
        .await
        .map_err(|e| PersistenceError::io(&temp_path, e))?;
    drop(file);

    if let Err(e) = fs::rename(&temp_path, final_path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(PersistenceError::io(final_path, e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: u64,
        #[serde(with = "dates")]
        joined_at: chrono::DateTime<chrono::Utc>,
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("data"));
        let rows: Vec<Row> = store.try_load_data(EntityKind::TeamMembers).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_init_data_directory_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("a").join("b"));
        store.init_data_directory().await.unwrap();
        store.init_data_directory().await.unwrap();
        assert!(store.dir().is_dir());
    }

    #[tokio::test]
    async fn test_save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        let rows = vec![
            Row {
                id: 1,
                joined_at: dates::parse_text("2024-02-03T10:00:00Z").unwrap(),
            },
            Row {
                id: 2,
                joined_at: dates::parse_text("2024-02-04T11:30:15.5Z").unwrap(),
            },
        ];
        store.save_data(EntityKind::TeamMembers, &rows).await.unwrap();

        let loaded: Vec<Row> = store.load_data(EntityKind::TeamMembers).await;
        assert_eq!(loaded, rows);

        let text = std::fs::read_to_string(store.file_path(EntityKind::TeamMembers)).unwrap();
        assert!(text.contains("\n  {"), "expected pretty-printed output");
        assert!(text.contains("2024-02-03T10:00:00Z"));
    }

    #[tokio::test]
    async fn test_save_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        store
            .save_data(EntityKind::Users, &[json!({ "id": 1 })])
            .await
            .unwrap();
        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["users.json".to_string()]);
    }

    #[tokio::test]
    async fn test_legacy_timestamps_are_rehydrated() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        std::fs::write(
            store.file_path(EntityKind::TeamMembers),
            r#"[{"id": 4, "joined_at": "2024-02-03 10:00:00"}]"#,
        )
        .unwrap();

        let rows: Vec<Row> = store.load_data(EntityKind::TeamMembers).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].joined_at,
            dates::parse_text("2024-02-03T10:00:00Z").unwrap()
        );
    }

    #[tokio::test]
    async fn test_malformed_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        std::fs::write(store.file_path(EntityKind::Users), "{ not json").unwrap();

        assert!(store.try_load_data::<Value>(EntityKind::Users).await.is_err());
        assert!(store.load_data::<Value>(EntityKind::Users).await.is_empty());
    }

    #[tokio::test]
    async fn test_non_array_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        std::fs::write(store.file_path(EntityKind::Teams), r#"{"id": 1}"#).unwrap();

        let err = store.try_load_data::<Value>(EntityKind::Teams).await.unwrap_err();
        assert!(matches!(err, PersistenceError::NotAnArray(_)));
    }

    #[tokio::test]
    async fn test_blank_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        std::fs::write(store.file_path(EntityKind::Teams), "  \n").unwrap();
        let rows = store.try_load_data::<Value>(EntityKind::Teams).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_records_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        std::fs::write(
            store.file_path(EntityKind::TeamMembers),
            r#"[{"id": 1, "joined_at": "2024-01-01"}, {"id": "two"}]"#,
        )
        .unwrap();

        let rows: Vec<Row> = store.load_data(EntityKind::TeamMembers).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 1);
    }

    #[tokio::test]
    async fn test_load_collection_returns_skipped_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        std::fs::write(
            store.file_path(EntityKind::TeamMembers),
            r#"[{"id": 2, "joined_at": "2024-01-01"}, {"id": 9, "joined_at": null}]"#,
        )
        .unwrap();

        let loaded = store
            .load_collection::<Row>(EntityKind::TeamMembers)
            .await
            .unwrap();
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.skipped, vec![json!({"id": 9, "joined_at": null})]);
        assert_eq!(loaded.highest_id, Some(9));
    }
}
