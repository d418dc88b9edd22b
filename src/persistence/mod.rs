//! Load/save of the word snapshot. The engine only sees
//! [`PersistenceAdapter`]; where the bytes live is up to the adapter.

pub mod file;
pub mod memory;
pub mod remote;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use remote::RemoteStore;

use futures::future::BoxFuture;
use thiserror::Error;

use crate::client::ApiError;
use crate::words::WordsSnapshot;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot encoding error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub trait PersistenceAdapter: Send + Sync {
    fn load(&self) -> BoxFuture<'_, Result<WordsSnapshot, PersistenceError>>;

    fn save<'a>(
        &'a self,
        snapshot: &'a WordsSnapshot,
    ) -> BoxFuture<'a, Result<(), PersistenceError>>;
}
