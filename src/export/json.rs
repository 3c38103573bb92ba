//! JSON persistence for item collections.
//! The file holds `{ "items": [...], "savedAt": "<ISO-8601>" }`.

use crate::error::StoreError;
use crate::models::{ItemCollection, ItemRecord, LearningItem};
use crate::store::{ItemStore, Loaded};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionFile {
    pub items: Vec<ItemRecord>,
    pub saved_at: DateTime<Utc>,
}

/// Writes items to `path`. The content goes to a sibling temporary file
/// first and is then renamed over the target.
pub fn export_json_to_path<'a>(
    items: impl IntoIterator<Item = &'a LearningItem>,
    path: &Path,
    saved_at: DateTime<Utc>,
) -> Result<(), StoreError> {
    let file = CollectionFile {
        items: items.into_iter().map(LearningItem::to_record).collect(),
        saved_at,
    };
    let json_string = serde_json::to_string_pretty(&file)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut tmp_name = OsString::from(path.as_os_str());
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);
    fs::write(&tmp_path, json_string)?;
    fs::rename(&tmp_path, path)?;

    info!(path = %path.display(), items = file.items.len(), "collection saved");
    Ok(())
}

/// Reads items from `path`. Out-of-range scheduling fields are clamped and
/// reported in [`Loaded::repairs`].
pub fn import_json(path: &Path) -> Result<Loaded, StoreError> {
    let contents = fs::read_to_string(path)?;
    let file: CollectionFile = serde_json::from_str(&contents)?;
    info!(path = %path.display(), items = file.items.len(), "collection loaded");
    Ok(Loaded::from_records(file.items))
}

/// An [`ItemStore`] backed by a single JSON file.
/// A missing file is treated as an empty collection.
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load_collection(&mut self) -> Result<ItemCollection, StoreError> {
        Ok(ItemCollection::from_items(self.load_all()?.items))
    }

    fn save_collection(&self, collection: &ItemCollection) -> Result<(), StoreError> {
        export_json_to_path(collection.items(), &self.path, self.current_time()?)
    }
}

impl ItemStore for JsonStore {
    fn load_all(&mut self) -> Result<Loaded, StoreError> {
        match import_json(&self.path) {
            Err(StoreError::Io(err)) if err.kind() == ErrorKind::NotFound => Ok(Loaded::default()),
            other => other,
        }
    }

    fn put(&mut self, item: &LearningItem) -> Result<(), StoreError> {
        let mut collection = self.load_collection()?;
        collection.put(item.clone());
        self.save_collection(&collection)
    }

    fn remove(&mut self, id: &str) -> Result<bool, StoreError> {
        let mut collection = self.load_collection()?;
        if collection.remove(id).is_none() {
            return Ok(false);
        }
        self.save_collection(&collection)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Policy;
    use std::fs;

    fn create_test_items() -> Vec<LearningItem> {
        let now = Utc::now();
        let mut reviewed = LearningItem::new("hello", "cześć", Policy::Light, now);
        reviewed.rate(4, now).unwrap();
        vec![
            reviewed,
            LearningItem::new("goodbye", "do widzenia", Policy::Simple, now),
        ]
    }

    #[test]
    fn test_export_and_import_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.json");
        let items = create_test_items();

        export_json_to_path(&items, &path, Utc::now()).unwrap();
        assert!(fs::metadata(&path).is_ok(), "File should exist");

        let loaded = import_json(&path).unwrap();
        assert!(loaded.repairs.is_empty());
        assert_eq!(loaded.items, items);
    }

    #[test]
    fn test_file_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.json");
        export_json_to_path(&create_test_items(), &path, Utc::now()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(value["savedAt"].is_string());
        let first = &value["items"][0];
        assert_eq!(first["intervalDays"], 1);
        assert_eq!(first["repetitionCount"], 1);
        assert_eq!(first["easeFactor"], 2.6);
        assert_eq!(first["reviewHistory"][0]["rating"], 4);
        assert_eq!(first["reviewHistory"][0]["intervalBefore"], 1);
        assert!(value["items"][1].get("easeFactor").is_none());
        assert!(!dir.path().join("items.json.tmp").exists());
    }

    #[test]
    fn test_import_repairs_corrupt_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.json");
        let json_content = r#"{
  "items": [
    {
      "id": "item_1",
      "prompt": "Was ist 7 * 8?",
      "answer": "56",
      "lastReviewedAt": "2024-05-01T10:00:00Z",
      "intervalDays": 0,
      "repetitionCount": 2,
      "easeFactor": 9.5,
      "reviewHistory": []
    }
  ],
  "savedAt": "2024-05-01T10:00:00Z"
}"#;
        fs::write(&path, json_content).unwrap();

        let loaded = import_json(&path).unwrap();
        assert_eq!(loaded.repairs.len(), 2);
        assert_eq!(loaded.items[0].interval_days(), 1);
        assert_eq!(loaded.items[0].ease_factor(), Some(3.0));
    }

    #[test]
    fn test_import_nonexistent_file() {
        let result = import_json(Path::new("nonexistent_file_xyz123.json"));
        assert!(result.is_err());
    }

    #[test]
    fn test_import_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invalid.json");
        fs::write(&path, "{ this is not valid json }").unwrap();

        assert!(matches!(import_json(&path), Err(StoreError::Json(_))));
    }

    #[test]
    fn test_store_put_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonStore::new(dir.path().join("nested").join("store.json"));
        assert!(store.load_all().unwrap().items.is_empty());

        let mut item = LearningItem::new("q", "a", Policy::Simple, Utc::now());
        store.put(&item).unwrap();
        item.rate(3, Utc::now()).unwrap();
        store.put(&item).unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.items.len(), 1);
        assert_eq!(store.get(item.id()).unwrap(), Some(item.clone()));

        assert!(store.remove(item.id()).unwrap());
        assert!(!store.remove(item.id()).unwrap());
        assert!(store.get(item.id()).unwrap().is_none());
    }
}
