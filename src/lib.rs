pub mod error;
pub mod chain;
pub mod settings;
pub mod platform;
pub mod permissions;
pub mod validation;
pub mod workers;

pub use crate::chain::{ChainPolicy, FallbackChain};
pub use crate::error::{ValidationError, WorkerError, WorkerResult};
pub use crate::permissions::orchestrator::{PermissionOrchestrator, RequestOutcome};
pub use crate::permissions::store::DecisionStore;
pub use crate::permissions::types::{Capability, CapabilityGrant, Decision, Desire};
pub use crate::settings::{MemorySettings, SettingsStore, SharedSettings};
pub use crate::validation::engine::{FieldCheck, ValidationEngine};
pub use crate::workers::cache::CacheChain;
pub use crate::workers::geo::GeoWorker;
pub use crate::workers::review::ReviewWorker;
