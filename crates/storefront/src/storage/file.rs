//! File-backed [`KeyValueStore`].

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::{KeyValueStore, StorageError};

/// Stores each key as one file inside a directory.
///
/// Keys are percent-encoded into file names, so `@RocketShoes:cart` lands in
/// `%40RocketShoes%3Acart.json`. Writes go to a temporary sibling that is then
/// renamed over the target, so readers see either the old or the new value.
/// Each write gets its own temporary file, so concurrent writers of one key
/// never share a partially written file.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store files under `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the store's files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", urlencoding::encode(key)))
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;

        let target = self.path_for(key);
        let tmp = self.dir.join(format!(
            ".{}.{}.json.tmp",
            urlencoding::encode(key),
            Uuid::new_v4().simple()
        ));

        let mut file = fs::File::create(&tmp)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp, &target)?;
        tracing::debug!(path = %target.display(), bytes = value.len(), "Wrote storage file");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_store() -> FileStore {
        FileStore::new(std::env::temp_dir().join(format!("rocketshoes-store-{}", uuid::Uuid::new_v4())))
    }

    fn entries(store: &FileStore) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(store.dir())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_path_encodes_key() {
        let store = FileStore::new("/data");
        assert_eq!(
            store.path_for("@RocketShoes:cart"),
            PathBuf::from("/data/%40RocketShoes%3Acart.json")
        );
    }

    #[test]
    fn test_get_missing_is_none() {
        let store = temp_store();
        assert!(store.get_item("missing").unwrap().is_none());
    }

    #[test]
    fn test_set_creates_dir_and_overwrites() {
        let store = temp_store();

        store.set_item("@RocketShoes:cart", "[1]").unwrap();
        store.set_item("@RocketShoes:cart", "[1,2]").unwrap();

        assert_eq!(
            store.get_item("@RocketShoes:cart").unwrap().as_deref(),
            Some("[1,2]")
        );
        assert_eq!(entries(&store), vec!["%40RocketShoes%3Acart.json".to_string()]);

        fs::remove_dir_all(store.dir()).unwrap();
    }

    #[test]
    fn test_concurrent_writers_publish_whole_values() {
        let store = temp_store();
        store.set_item("cart", "[]").unwrap();

        let values: Vec<String> = (0..8).map(|n| format!("[{}]", n.to_string().repeat(4096))).collect();
        std::thread::scope(|scope| {
            for value in &values {
                let store = store.clone();
                scope.spawn(move || {
                    for _ in 0..10 {
                        store.set_item("cart", value).unwrap();
                    }
                });
            }
        });

        let stored = store.get_item("cart").unwrap().unwrap();
        assert!(values.contains(&stored));
        assert_eq!(entries(&store), vec!["cart.json".to_string()]);

        fs::remove_dir_all(store.dir()).unwrap();
    }

    #[test]
    fn test_keys_are_independent() {
        let store = temp_store();

        store.set_item("a", "1").unwrap();
        store.set_item("b", "2").unwrap();

        assert_eq!(store.get_item("a").unwrap().as_deref(), Some("1"));
        assert_eq!(store.get_item("b").unwrap().as_deref(), Some("2"));

        fs::remove_dir_all(store.dir()).unwrap();
    }
}
