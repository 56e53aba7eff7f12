//! Capability permission model: decision caching, request coalescing, and
//! the orchestrator that ties them to the live platform.

pub mod types;
pub mod store;
pub mod coalescer;
pub mod orchestrator;

pub use coalescer::{PermissionTicket, RequestCoalescer};
pub use orchestrator::{PermissionOrchestrator, RequestOutcome};
pub use store::{DecisionStore, Tier};
pub use types::{AuthorizationStatus, Capability, CapabilityGrant, Decision, Desire};
