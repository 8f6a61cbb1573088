use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

use super::collection::{CollectionSnapshot, ImageCollection};
use crate::error::Result;

/// Key under which the whole gallery snapshot is stored
const COLLECTION_KEY: &str = "image_collection";

/// The Library persists the gallery in a small SQLite key-value table.
/// The whole collection is written as one JSON blob, member order preserved.
pub struct Library {
    conn: Connection,
    db_path: Option<PathBuf>,
}

impl Library {
    /// Open (or create) the database at `db_path`, creating parent directories as needed.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&db_path)?;
        tracing::info!(path = %db_path.display(), "gallery database opened");

        let library = Library {
            conn,
            db_path: Some(db_path),
        };
        library.init_schema()?;
        Ok(library)
    }

    /// In-memory database, nothing survives the process
    pub fn open_in_memory() -> Result<Self> {
        let library = Library {
            conn: Connection::open_in_memory()?,
            db_path: None,
        };
        library.init_schema()?;
        Ok(library)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key             TEXT PRIMARY KEY,
                value           TEXT NOT NULL,
                updated_at      INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Path of the database file, `None` for in-memory libraries
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, chrono::Utc::now().timestamp()],
        )?;
        Ok(())
    }

    /// Load the stored gallery, or an empty collection if nothing was stored yet.
    pub fn load_collection(&self) -> Result<ImageCollection> {
        let Some(json) = self.get(COLLECTION_KEY)? else {
            tracing::info!("no stored gallery, starting empty");
            return Ok(ImageCollection::new());
        };

        let snapshot = CollectionSnapshot::from_json(&json)?;
        let collection = ImageCollection::from_snapshot(snapshot)?;
        tracing::info!(images = collection.len(), "gallery loaded");
        Ok(collection)
    }

    /// Overwrite the stored gallery with the current state of `collection`.
    pub fn store_collection(&self, collection: &ImageCollection) -> Result<()> {
        let json = collection.to_snapshot().to_json()?;
        self.put(COLLECTION_KEY, &json)?;
        tracing::info!(images = collection.len(), "gallery stored");
        Ok(())
    }
}

// Implement Debug for better error messages
impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("db_path", &self.db_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GalleryError;
    use crate::state::image::Image;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_empty_library_loads_empty_collection() {
        let library = Library::open_in_memory().unwrap();
        let collection = library.load_collection().unwrap();
        assert!(collection.is_empty());
        assert!(library.path().is_none());
    }

    #[test]
    fn test_store_then_load_round_trip() {
        let library = Library::open_in_memory().unwrap();
        let collection = ImageCollection::new();
        let date = Utc.with_ymd_and_hms(2016, 3, 9, 12, 0, 0).unwrap();
        collection.add_image(Image::new("images/a.jpg", date, "beach", 4));
        collection.add_image(Image::new("images/b.jpg", date, "", 0));

        library.store_collection(&collection).unwrap();
        let loaded = library.load_collection().unwrap();

        assert_eq!(loaded.to_snapshot(), collection.to_snapshot());
        assert!(!loaded.images()[0].ptr_eq(&collection.images()[0]));
    }

    #[test]
    fn test_store_overwrites_previous_snapshot() {
        let library = Library::open_in_memory().unwrap();
        let collection = ImageCollection::new();
        let photo = Image::new("images/a.jpg", Utc::now(), "", 1);
        collection.add_image(photo.clone());
        library.store_collection(&collection).unwrap();

        collection.remove_image(&photo);
        library.store_collection(&collection).unwrap();

        assert!(library.load_collection().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_blob_is_reported() {
        let library = Library::open_in_memory().unwrap();
        library.put(COLLECTION_KEY, "not json").unwrap();

        assert!(matches!(
            library.load_collection(),
            Err(GalleryError::Serialization(_))
        ));
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("gallery.db");

        let library = Library::open(&db_path).unwrap();
        library.store_collection(&ImageCollection::new()).unwrap();
        drop(library);

        assert!(db_path.exists());
        let reopened = Library::open(&db_path).unwrap();
        assert!(reopened.load_collection().unwrap().is_empty());
    }
}
