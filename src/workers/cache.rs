//! Secure blob cache workers and their fallback chain.
//!
//! Cache workers share one keyed-bytes interface so they can be stacked in
//! a [`FallbackChain`]: reads take the first store that answers, writes and
//! deletes must land in every store.

use std::sync::Arc;

use async_trait::async_trait;

use crate::chain::{ChainPolicy, FallbackChain};
use crate::error::{WorkerError, WorkerResult};
use crate::platform::{SharedReauthBlob, SharedSecureBlob};

/// Option string that arms a re-authentication prompt for one key.
pub const REAUTH_OPTION_PREFIX: &str = "require-prompt-on-next-access:";

/// Keyed binary cache backed by some secure store.
#[async_trait]
pub trait CacheWorker: Send + Sync {
    fn label(&self) -> &str;
    async fn contains(&self, key: &str) -> WorkerResult<bool>;
    async fn read(&self, key: &str) -> WorkerResult<Vec<u8>>;
    async fn write(&self, key: &str, value: Vec<u8>) -> WorkerResult<()>;
    async fn delete(&self, key: &str) -> WorkerResult<()>;

    /// Apply a worker-specific option. Unrecognized options are ignored so
    /// an option can be fanned out across a whole chain.
    async fn enable_option(&self, option: &str) -> WorkerResult<()>;
}

pub type SharedCacheWorker = Arc<dyn CacheWorker>;

fn tag(label: &str, error: WorkerError) -> WorkerError {
    match error {
        WorkerError::Platform { message, .. } => WorkerError::platform(label, message),
        other => other,
    }
}

/// Cache worker over a plain secure blob store. A key that is absent reads
/// as empty bytes rather than an error.
pub struct BlobCacheWorker {
    label: String,
    store: SharedSecureBlob,
}

impl BlobCacheWorker {
    pub fn new(label: &str, store: SharedSecureBlob) -> Self {
        Self {
            label: label.to_string(),
            store,
        }
    }
}

#[async_trait]
impl CacheWorker for BlobCacheWorker {
    fn label(&self) -> &str {
        &self.label
    }

    async fn contains(&self, key: &str) -> WorkerResult<bool> {
        self.store
            .contains(key)
            .await
            .map_err(|error| tag(&self.label, error))
    }

    async fn read(&self, key: &str) -> WorkerResult<Vec<u8>> {
        if !self
            .store
            .contains(key)
            .await
            .map_err(|error| tag(&self.label, error))?
        {
            return Ok(Vec::new());
        }
        self.store
            .read(key)
            .await
            .map_err(|error| tag(&self.label, error))
    }

    async fn write(&self, key: &str, value: Vec<u8>) -> WorkerResult<()> {
        self.store
            .write(key, value)
            .await
            .map_err(|error| tag(&self.label, error))
    }

    async fn delete(&self, key: &str) -> WorkerResult<()> {
        self.store
            .delete(key)
            .await
            .map_err(|error| tag(&self.label, error))
    }

    async fn enable_option(&self, _option: &str) -> WorkerResult<()> {
        Ok(())
    }
}

/// Cache worker over a store that can demand re-authentication. The
/// `require-prompt-on-next-access:<key>` option arms the prompt.
pub struct ReauthCacheWorker {
    label: String,
    store: SharedReauthBlob,
}

impl ReauthCacheWorker {
    pub fn new(label: &str, store: SharedReauthBlob) -> Self {
        Self {
            label: label.to_string(),
            store,
        }
    }
}

#[async_trait]
impl CacheWorker for ReauthCacheWorker {
    fn label(&self) -> &str {
        &self.label
    }

    async fn contains(&self, key: &str) -> WorkerResult<bool> {
        self.store
            .contains(key)
            .await
            .map_err(|error| tag(&self.label, error))
    }

    async fn read(&self, key: &str) -> WorkerResult<Vec<u8>> {
        if !self
            .store
            .contains(key)
            .await
            .map_err(|error| tag(&self.label, error))?
        {
            return Ok(Vec::new());
        }
        self.store
            .read(key)
            .await
            .map_err(|error| tag(&self.label, error))
    }

    async fn write(&self, key: &str, value: Vec<u8>) -> WorkerResult<()> {
        self.store
            .write(key, value)
            .await
            .map_err(|error| tag(&self.label, error))
    }

    async fn delete(&self, key: &str) -> WorkerResult<()> {
        self.store
            .delete(key)
            .await
            .map_err(|error| tag(&self.label, error))
    }

    async fn enable_option(&self, option: &str) -> WorkerResult<()> {
        if let Some(key) = option.strip_prefix(REAUTH_OPTION_PREFIX) {
            self.store
                .force_prompt_on_next_access(key)
                .await
                .map_err(|error| tag(&self.label, error))?;
        }
        Ok(())
    }
}

/// An ordered chain of cache workers. Reads and existence checks stop at
/// the first store that answers; writes and deletes must reach every store.
pub struct CacheChain {
    chain: FallbackChain<dyn CacheWorker>,
}

impl CacheChain {
    pub fn new(workers: Vec<SharedCacheWorker>) -> Self {
        Self {
            chain: FallbackChain::new(workers),
        }
    }

    pub async fn contains(&self, key: &str) -> WorkerResult<bool> {
        let key = key.to_string();
        self.chain
            .run(ChainPolicy::FirstSuccess, |worker| {
                let key = key.clone();
                async move { worker.contains(&key).await }
            })
            .await
    }

    pub async fn read(&self, key: &str) -> WorkerResult<Vec<u8>> {
        let key = key.to_string();
        self.chain
            .run(ChainPolicy::FirstSuccess, |worker| {
                let key = key.clone();
                async move { worker.read(&key).await }
            })
            .await
    }

    pub async fn write(&self, key: &str, value: Vec<u8>) -> WorkerResult<()> {
        let key = key.to_string();
        self.chain
            .run(ChainPolicy::AllSucceed, |worker| {
                let key = key.clone();
                let value = value.clone();
                async move { worker.write(&key, value).await }
            })
            .await
    }

    pub async fn delete(&self, key: &str) -> WorkerResult<()> {
        let key = key.to_string();
        self.chain
            .run(ChainPolicy::AllSucceed, |worker| {
                let key = key.clone();
                async move { worker.delete(&key).await }
            })
            .await
    }

    /// Fan one option out to every worker in the chain.
    pub async fn enable_option(&self, option: &str) -> WorkerResult<()> {
        let option = option.to_string();
        self.chain
            .run(ChainPolicy::AllSucceed, |worker| {
                let option = option.clone();
                async move { worker.enable_option(&option).await }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::portable::{MemoryBlobStore, ReauthMemoryBlobStore};
    use crate::platform::SecureBlobStore;

    fn blob_worker(label: &str) -> (Arc<MemoryBlobStore>, SharedCacheWorker) {
        let store = Arc::new(MemoryBlobStore::new(label));
        let worker = Arc::new(BlobCacheWorker::new(label, store.clone()));
        (store, worker)
    }

    #[tokio::test]
    async fn absent_key_reads_as_empty_bytes() {
        let (_, worker) = blob_worker("primary");
        assert_eq!(worker.read("missing").await, Ok(Vec::new()));
        assert_eq!(worker.contains("missing").await, Ok(false));
    }

    #[tokio::test]
    async fn read_falls_back_to_the_next_store() {
        let (primary_store, primary) = blob_worker("primary");
        let (secondary_store, secondary) = blob_worker("secondary");
        secondary_store
            .write("token", b"abc".to_vec())
            .await
            .expect("write");
        primary_store.set_failing(true);

        let chain = CacheChain::new(vec![primary, secondary]);
        assert_eq!(chain.read("token").await, Ok(b"abc".to_vec()));
    }

    #[tokio::test]
    async fn write_requires_every_store() {
        let (_, primary) = blob_worker("primary");
        let (secondary_store, secondary) = blob_worker("secondary");
        secondary_store.set_failing(true);

        let chain = CacheChain::new(vec![primary, secondary]);
        let error = chain
            .write("token", b"abc".to_vec())
            .await
            .expect_err("secondary failure");
        assert_eq!(error, WorkerError::platform("secondary", "store unavailable"));
    }

    #[tokio::test]
    async fn write_then_read_round_trips_through_the_chain() {
        let (_, primary) = blob_worker("primary");
        let (_, secondary) = blob_worker("secondary");
        let chain = CacheChain::new(vec![primary, secondary]);

        chain.write("token", b"abc".to_vec()).await.expect("write");
        assert_eq!(chain.read("token").await, Ok(b"abc".to_vec()));
        chain.delete("token").await.expect("delete");
        assert_eq!(chain.contains("token").await, Ok(false));
    }

    #[tokio::test]
    async fn reauth_option_arms_the_prompt_through_the_chain() {
        let (_, primary) = blob_worker("primary");
        let reauth_store = Arc::new(ReauthMemoryBlobStore::new("enclave"));
        let reauth: SharedCacheWorker =
            Arc::new(ReauthCacheWorker::new("enclave", reauth_store.clone()));

        let chain = CacheChain::new(vec![primary, reauth]);
        chain
            .enable_option("require-prompt-on-next-access:secret")
            .await
            .expect("option");
        assert!(reauth_store.prompt_armed("secret"));
    }

    #[tokio::test]
    async fn unrecognized_option_is_ignored() {
        let (_, primary) = blob_worker("primary");
        let chain = CacheChain::new(vec![primary]);
        assert_eq!(chain.enable_option("compact-on-idle").await, Ok(()));
    }

    #[tokio::test]
    async fn platform_failures_carry_the_worker_label() {
        let (store, worker) = blob_worker("keychain-cache");
        store.set_failing(true);
        let error = worker.read("token").await.expect_err("failure");
        assert_eq!(
            error,
            WorkerError::platform("keychain-cache", "store unavailable")
        );
    }
}
