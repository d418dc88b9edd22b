use futures::future::BoxFuture;
use futures::FutureExt;

use crate::client::ApiClient;
use crate::persistence::{PersistenceAdapter, PersistenceError};
use crate::words::WordsSnapshot;

/// Snapshot kept on the remote service, reached through the authenticated
/// client.
#[derive(Clone)]
pub struct RemoteStore {
    client: ApiClient,
}

impl RemoteStore {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

impl PersistenceAdapter for RemoteStore {
    fn load(&self) -> BoxFuture<'_, Result<WordsSnapshot, PersistenceError>> {
        async move { Ok(self.client.fetch_snapshot().await?) }.boxed()
    }

    fn save<'a>(
        &'a self,
        snapshot: &'a WordsSnapshot,
    ) -> BoxFuture<'a, Result<(), PersistenceError>> {
        async move { Ok(self.client.put_snapshot(snapshot).await?) }.boxed()
    }
}
