use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::debug;

use crate::persistence::{PersistenceAdapter, PersistenceError};
use crate::words::WordsSnapshot;

/// Snapshot stored as one pretty-printed JSON file. Writes go to a sibling
/// temp file first and are renamed into place.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "words.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn read(&self) -> Result<WordsSnapshot, PersistenceError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no snapshot file yet");
                return Ok(WordsSnapshot::default());
            }
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn write(&self, snapshot: &WordsSnapshot) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let encoded = serde_json::to_vec_pretty(snapshot)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, encoded).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        debug!(path = %self.path.display(), count = snapshot.words.len(), "snapshot written");
        Ok(())
    }
}

impl PersistenceAdapter for JsonFileStore {
    fn load(&self) -> BoxFuture<'_, Result<WordsSnapshot, PersistenceError>> {
        self.read().boxed()
    }

    fn save<'a>(
        &'a self,
        snapshot: &'a WordsSnapshot,
    ) -> BoxFuture<'a, Result<(), PersistenceError>> {
        self.write(snapshot).boxed()
    }
}
