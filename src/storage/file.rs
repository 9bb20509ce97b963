//! JSON file storage

use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::{fs, sync::Mutex};
use tracing::{debug, warn};

use super::{KeyValueStore, StorageError};

/// Key-value store persisted as a single JSON object file.
///
/// The whole map is held in memory and the file is rewritten on every
/// change. Writes go to a sibling temporary file first and are renamed
/// into place; the in-memory map only changes once the write succeeded.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    inner: Arc<Mutex<BTreeMap<String, String>>>,
    file_path: PathBuf,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is treated as empty.
    ///
    /// A file that is not a JSON object of strings is moved aside to
    /// `<name>.corrupt` and the store starts empty.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the file exists but cannot be read.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let file_path = path.into();

        let map = match fs::read(&file_path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(map) => map,
                Err(error) => {
                    quarantine(&file_path, &error).await;
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %file_path.display(), "storage file missing, starting empty");
                BTreeMap::new()
            }
            Err(err) => return Err(err.into()),
        };

        Ok(Self {
            inner: Arc::new(Mutex::new(map)),
            file_path,
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    async fn save(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.file_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }

        let data = serde_json::to_vec_pretty(map)?;
        let tmp = self.file_path.with_extension("json.tmp");

        fs::write(&tmp, data).await?;
        fs::rename(&tmp, &self.file_path).await?;

        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.inner.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let mut map = self.inner.lock().await;

        let mut next = map.clone();
        next.insert(key.to_string(), value);
        self.save(&next).await?;

        *map = next;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut map = self.inner.lock().await;

        if !map.contains_key(key) {
            return Ok(());
        }

        let mut next = map.clone();
        next.remove(key);
        self.save(&next).await?;

        *map = next;

        Ok(())
    }
}

async fn quarantine(file_path: &Path, error: &serde_json::Error) {
    let aside = file_path.with_extension("json.corrupt");

    warn!(
        path = %file_path.display(),
        moved_to = %aside.display(),
        error = %error,
        "storage file is corrupt, starting empty"
    );

    if let Err(source) = fs::rename(file_path, &aside).await {
        warn!(path = %file_path.display(), "failed to move corrupt storage file: {source}");
    }
}
