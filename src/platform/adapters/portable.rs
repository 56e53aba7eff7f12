//! In-memory adapter implementations for tests and platform-less builds.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{WorkerError, WorkerResult};
use crate::permissions::types::{AuthorizationStatus, Capability, Decision};
use crate::platform::types::{AskEvent, Position, PositionEvent};

use super::{AuthorizationAdapter, LocationAdapter, ReauthBlobStore, ReviewAdapter, SecureBlobStore};

const ASK_CHANNEL_CAPACITY: usize = 32;

/// Scriptable authorization backend. Tests set statuses up front and drive
/// an outstanding ask by injecting resolutions and the final dismissal.
pub struct ScriptedAuthorization {
    state: Mutex<ScriptedState>,
}

struct ScriptedState {
    statuses: HashMap<Capability, AuthorizationStatus>,
    asks: Vec<Vec<Capability>>,
    live: Option<mpsc::Sender<AskEvent>>,
}

impl ScriptedAuthorization {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ScriptedState {
                statuses: HashMap::new(),
                asks: Vec::new(),
                live: None,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptedState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_status(&self, capability: Capability, status: AuthorizationStatus) {
        self.lock().statuses.insert(capability, status);
    }

    /// Number of asks presented so far.
    pub fn ask_count(&self) -> usize {
        self.lock().asks.len()
    }

    /// Capabilities covered by the most recent ask.
    pub fn last_ask(&self) -> Option<Vec<Capability>> {
        self.lock().asks.last().cloned()
    }

    /// Resolve one capability of the outstanding ask and update its live
    /// status to match.
    pub fn resolve(&self, capability: Capability, decision: Decision) {
        let sender = {
            let mut state = self.lock();
            let status = match decision {
                Decision::Allowed => AuthorizationStatus::Allowed,
                Decision::Denied => AuthorizationStatus::Denied,
                Decision::Unknown | Decision::Skipped => AuthorizationStatus::Unknown,
            };
            state.statuses.insert(capability, status);
            state.live.clone()
        };
        if let Some(sender) = sender {
            let _ = sender.try_send(AskEvent::Resolved(capability, decision));
        }
    }

    /// Dismiss the outstanding ask, terminating its event stream.
    pub fn dismiss(&self) {
        let sender = self.lock().live.take();
        if let Some(sender) = sender {
            let _ = sender.try_send(AskEvent::Dismissed);
        }
    }
}

impl Default for ScriptedAuthorization {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthorizationAdapter for ScriptedAuthorization {
    fn current_status(&self, capability: Capability) -> AuthorizationStatus {
        self.lock()
            .statuses
            .get(&capability)
            .copied()
            .unwrap_or(AuthorizationStatus::Unknown)
    }

    fn present_ask(&self, capabilities: Vec<Capability>) -> mpsc::Receiver<AskEvent> {
        let (sender, receiver) = mpsc::channel(ASK_CHANNEL_CAPACITY);
        let mut state = self.lock();
        if state.live.is_some() {
            tracing::warn!("scripted authorization replacing a still-open ask");
        }
        state.asks.push(capabilities);
        state.live = Some(sender);
        receiver
    }
}

/// In-memory secure blob store with a failure toggle for chain tests.
pub struct MemoryBlobStore {
    label: String,
    values: Mutex<HashMap<String, Vec<u8>>>,
    failing: AtomicBool,
}

impl MemoryBlobStore {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            values: Mutex::new(HashMap::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// When set, every operation fails with a platform error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> WorkerResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(WorkerError::platform(&self.label, "store unavailable"))
        } else {
            Ok(())
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SecureBlobStore for MemoryBlobStore {
    async fn contains(&self, key: &str) -> WorkerResult<bool> {
        self.check()?;
        Ok(self.lock().contains_key(key))
    }

    async fn read(&self, key: &str) -> WorkerResult<Vec<u8>> {
        self.check()?;
        self.lock()
            .get(key)
            .cloned()
            .ok_or_else(|| WorkerError::platform(&self.label, format!("no value for key {key}")))
    }

    async fn write(&self, key: &str, value: Vec<u8>) -> WorkerResult<()> {
        self.check()?;
        self.lock().insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> WorkerResult<()> {
        self.check()?;
        self.lock().remove(key);
        Ok(())
    }
}

/// In-memory reauth-capable blob store. Armed keys record that a prompt
/// would have been shown on the next read.
pub struct ReauthMemoryBlobStore {
    inner: MemoryBlobStore,
    armed: Mutex<HashSet<String>>,
    prompts_shown: AtomicUsize,
}

impl ReauthMemoryBlobStore {
    pub fn new(label: &str) -> Self {
        Self {
            inner: MemoryBlobStore::new(label),
            armed: Mutex::new(HashSet::new()),
            prompts_shown: AtomicUsize::new(0),
        }
    }

    pub fn prompt_armed(&self, key: &str) -> bool {
        self.armed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(key)
    }

    pub fn prompts_shown(&self) -> usize {
        self.prompts_shown.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecureBlobStore for ReauthMemoryBlobStore {
    async fn contains(&self, key: &str) -> WorkerResult<bool> {
        self.inner.contains(key).await
    }

    async fn read(&self, key: &str) -> WorkerResult<Vec<u8>> {
        let was_armed = self
            .armed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(key);
        if was_armed {
            self.prompts_shown.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.read(key).await
    }

    async fn write(&self, key: &str, value: Vec<u8>) -> WorkerResult<()> {
        self.inner.write(key, value).await
    }

    async fn delete(&self, key: &str) -> WorkerResult<()> {
        self.inner.delete(key).await
    }
}

#[async_trait]
impl ReauthBlobStore for ReauthMemoryBlobStore {
    async fn force_prompt_on_next_access(&self, key: &str) -> WorkerResult<()> {
        self.armed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string());
        Ok(())
    }
}

/// Review adapter that records prompt presentations.
pub struct RecordingReview {
    prompts: AtomicUsize,
}

impl RecordingReview {
    pub fn new() -> Self {
        Self {
            prompts: AtomicUsize::new(0),
        }
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }
}

impl Default for RecordingReview {
    fn default() -> Self {
        Self::new()
    }
}

impl ReviewAdapter for RecordingReview {
    fn present_prompt(&self) -> WorkerResult<()> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Location backend that reports a fixed position.
pub struct FixedLocation {
    authorization: Mutex<AuthorizationStatus>,
    position: Position,
    addresses: Mutex<HashMap<String, Position>>,
    updates_stopped: AtomicUsize,
}

impl FixedLocation {
    pub fn new(position: Position) -> Self {
        Self {
            authorization: Mutex::new(AuthorizationStatus::Allowed),
            position,
            addresses: Mutex::new(HashMap::new()),
            updates_stopped: AtomicUsize::new(0),
        }
    }

    pub fn set_authorization(&self, status: AuthorizationStatus) {
        *self
            .authorization
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = status;
    }

    pub fn add_address(&self, address: &str, position: Position) {
        self.addresses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(address.to_string(), position);
    }

    pub fn stops(&self) -> usize {
        self.updates_stopped.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocationAdapter for FixedLocation {
    fn request_authorization(&self) -> AuthorizationStatus {
        *self
            .authorization
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn start_updates(&self) -> mpsc::Receiver<PositionEvent> {
        let (sender, receiver) = mpsc::channel(1);
        let _ = sender.try_send(PositionEvent::Position(self.position));
        receiver
    }

    fn stop_updates(&self) {
        self.updates_stopped.fetch_add(1, Ordering::SeqCst);
    }

    async fn reverse_geocode(&self, address: &str) -> WorkerResult<Position> {
        self.addresses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(address)
            .copied()
            .ok_or_else(|| WorkerError::platform("fixed-location", format!("no match for {address}")))
    }
}
