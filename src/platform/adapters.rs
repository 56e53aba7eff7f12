use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::WorkerResult;
use crate::permissions::types::{AuthorizationStatus, Capability};

use super::types::{AskEvent, Position, PositionEvent};

/// Live system authorization state plus the ability to present an ask.
pub trait AuthorizationAdapter: Send + Sync {
    fn current_status(&self, capability: Capability) -> AuthorizationStatus;

    /// Present one authorization ask covering `capabilities`. The returned
    /// stream carries per-capability resolutions and is terminated by an
    /// aggregate [`AskEvent::Dismissed`].
    fn present_ask(&self, capabilities: Vec<Capability>) -> mpsc::Receiver<AskEvent>;
}

pub type SharedAuthorization = Arc<dyn AuthorizationAdapter>;

/// Secure keyed blob storage (OS keychain or equivalent).
#[async_trait]
pub trait SecureBlobStore: Send + Sync {
    async fn contains(&self, key: &str) -> WorkerResult<bool>;
    async fn read(&self, key: &str) -> WorkerResult<Vec<u8>>;
    async fn write(&self, key: &str, value: Vec<u8>) -> WorkerResult<()>;
    async fn delete(&self, key: &str) -> WorkerResult<()>;
}

pub type SharedSecureBlob = Arc<dyn SecureBlobStore>;

/// Secure blob storage that can demand user re-authentication before the
/// next read of a key.
#[async_trait]
pub trait ReauthBlobStore: SecureBlobStore {
    async fn force_prompt_on_next_access(&self, key: &str) -> WorkerResult<()>;
}

pub type SharedReauthBlob = Arc<dyn ReauthBlobStore>;

/// Store review prompt presentation.
pub trait ReviewAdapter: Send + Sync {
    fn present_prompt(&self) -> WorkerResult<()>;
}

pub type SharedReview = Arc<dyn ReviewAdapter>;

/// Positioning and geocoding backend.
#[async_trait]
pub trait LocationAdapter: Send + Sync {
    fn request_authorization(&self) -> AuthorizationStatus;
    fn start_updates(&self) -> mpsc::Receiver<PositionEvent>;
    fn stop_updates(&self);
    async fn reverse_geocode(&self, address: &str) -> WorkerResult<Position>;
}

pub type SharedLocation = Arc<dyn LocationAdapter>;

pub mod portable;
