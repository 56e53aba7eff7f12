//! Permission request orchestration.
//!
//! The orchestrator answers request/await/status questions by composing the
//! live platform status, the two-tier decision store, and the request
//! coalescer. The store only ever governs whether to re-ask; reported
//! status always comes from the platform.

use std::sync::Arc;

use crate::error::{WorkerError, WorkerResult};
use crate::platform::SharedAuthorization;

use super::coalescer::{PermissionTicket, RequestCoalescer};
use super::store::{DecisionStore, Tier};
use super::types::{AuthorizationStatus, Capability, CapabilityGrant, Decision, Desire};

const ORIGIN: &str = "permission-orchestrator";

/// Outcome of a permission request.
pub enum RequestOutcome {
    /// Every capability was already allowed; no ask was presented.
    Granted(Vec<CapabilityGrant>),
    /// An ask is in flight (possibly shared); await the ticket.
    Pending(PermissionTicket),
    /// The re-prompt gate held the request back. A soft no-op, not an
    /// error: the platform was not contacted.
    Suppressed,
}

pub struct PermissionOrchestrator {
    platform: SharedAuthorization,
    decisions: Arc<DecisionStore>,
    coalescer: Arc<RequestCoalescer>,
}

impl PermissionOrchestrator {
    pub fn new(platform: SharedAuthorization, decisions: Arc<DecisionStore>) -> Self {
        let coalescer = Arc::new(RequestCoalescer::new(platform.clone(), decisions.clone()));
        Self {
            platform,
            decisions,
            coalescer,
        }
    }

    pub fn request_capability(
        &self,
        desire: Desire,
        capability: Capability,
    ) -> WorkerResult<RequestOutcome> {
        self.request_capabilities(desire, vec![capability])
    }

    pub fn request_capabilities(
        &self,
        desire: Desire,
        capabilities: Vec<Capability>,
    ) -> WorkerResult<RequestOutcome> {
        if capabilities.is_empty() {
            return Err(WorkerError::invalid_parameters(&["capabilities"], ORIGIN));
        }
        if self.all_live_allowed(&capabilities) {
            return Ok(RequestOutcome::Granted(
                capabilities
                    .into_iter()
                    .map(|capability| CapabilityGrant::new(capability, Decision::Allowed))
                    .collect(),
            ));
        }
        if !self.should_continue(desire, &capabilities)? {
            return Ok(RequestOutcome::Suppressed);
        }
        Ok(RequestOutcome::Pending(
            self.coalescer.submit(desire, capabilities)?,
        ))
    }

    /// Live platform status for each capability. Never consults the
    /// decision cache.
    pub fn status_of(&self, capabilities: &[Capability]) -> WorkerResult<Vec<CapabilityGrant>> {
        if capabilities.is_empty() {
            return Err(WorkerError::invalid_parameters(&["capabilities"], ORIGIN));
        }
        Ok(capabilities
            .iter()
            .map(|capability| {
                CapabilityGrant::new(
                    *capability,
                    self.platform.current_status(*capability).as_decision(),
                )
            })
            .collect())
    }

    /// Wait for `capability` to resolve without opening an ask.
    pub fn await_capability(&self, capability: Capability) -> WorkerResult<RequestOutcome> {
        if self.platform.current_status(capability) == AuthorizationStatus::Allowed {
            return Ok(RequestOutcome::Granted(vec![CapabilityGrant::new(
                capability,
                Decision::Allowed,
            )]));
        }
        Ok(RequestOutcome::Pending(self.coalescer.watch(capability)?))
    }

    fn all_live_allowed(&self, capabilities: &[Capability]) -> bool {
        capabilities
            .iter()
            .all(|capability| self.platform.current_status(*capability) == AuthorizationStatus::Allowed)
    }

    /// The re-prompt gate. `WouldLike` is suppressed when every unresolved
    /// capability carries a persisted skip or deny, then falls through to
    /// the `Want` check against the ephemeral tier. `Need` and `Present`
    /// are never suppressed. Gate reads advance pause counts; that is the
    /// cool-down clock.
    fn should_continue(&self, desire: Desire, capabilities: &[Capability]) -> WorkerResult<bool> {
        let pending: Vec<Capability> = capabilities
            .iter()
            .copied()
            .filter(|capability| {
                self.platform.current_status(*capability) != AuthorizationStatus::Allowed
            })
            .collect();
        match desire {
            Desire::WouldLike => {
                if !self.any_promptable(Tier::Persisted, &pending)? {
                    return Ok(false);
                }
                self.any_promptable(Tier::Ephemeral, &pending)
            }
            Desire::Want => self.any_promptable(Tier::Ephemeral, &pending),
            Desire::Need | Desire::Present => Ok(true),
        }
    }

    fn any_promptable(&self, tier: Tier, capabilities: &[Capability]) -> WorkerResult<bool> {
        for capability in capabilities {
            let decision = self.decisions.read(tier, *capability)?;
            if decision != Decision::Skipped && decision != Decision::Denied {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::store::PERSISTED_DENIED_MAX;
    use crate::platform::portable::ScriptedAuthorization;
    use crate::settings::MemorySettings;
    use tokio::time::{timeout, Duration};

    fn orchestrator() -> (
        PermissionOrchestrator,
        Arc<ScriptedAuthorization>,
        Arc<DecisionStore>,
    ) {
        let platform = Arc::new(ScriptedAuthorization::new());
        let decisions = Arc::new(DecisionStore::new(Arc::new(MemorySettings::new())));
        (
            PermissionOrchestrator::new(platform.clone(), decisions.clone()),
            platform,
            decisions,
        )
    }

    #[tokio::test]
    async fn live_allowed_short_circuits_without_ask() {
        let (orchestrator, platform, decisions) = orchestrator();
        platform.set_status(Capability::Camera, AuthorizationStatus::Allowed);

        let outcome = orchestrator
            .request_capability(Desire::WouldLike, Capability::Camera)
            .expect("request");
        match outcome {
            RequestOutcome::Granted(grants) => {
                assert_eq!(
                    grants,
                    vec![CapabilityGrant::new(Capability::Camera, Decision::Allowed)]
                );
            }
            _ => panic!("expected Granted"),
        }
        assert_eq!(platform.ask_count(), 0);
        // Bypassed the store entirely: no pause movement.
        assert_eq!(
            decisions.snapshot(Tier::Persisted, Capability::Camera).expect("snapshot"),
            (Decision::Unknown, 0)
        );
    }

    #[tokio::test]
    async fn would_like_suppressed_by_persisted_deny() {
        let (orchestrator, platform, decisions) = orchestrator();
        decisions
            .record(Tier::Persisted, Capability::Camera, Decision::Denied)
            .expect("record");

        for expected_pause in 1..=3 {
            let outcome = orchestrator
                .request_capability(Desire::WouldLike, Capability::Camera)
                .expect("request");
            assert!(matches!(outcome, RequestOutcome::Suppressed));
            let (_, pause) = decisions
                .snapshot(Tier::Persisted, Capability::Camera)
                .expect("snapshot");
            assert_eq!(pause, expected_pause);
        }
        assert_eq!(platform.ask_count(), 0);
    }

    #[tokio::test]
    async fn eleventh_suppressed_call_decays_and_prompts() {
        let (orchestrator, platform, decisions) = orchestrator();
        decisions
            .record(Tier::Persisted, Capability::Camera, Decision::Denied)
            .expect("record");

        for _ in 0..PERSISTED_DENIED_MAX {
            let outcome = orchestrator
                .request_capability(Desire::WouldLike, Capability::Camera)
                .expect("request");
            assert!(matches!(outcome, RequestOutcome::Suppressed));
        }
        let outcome = orchestrator
            .request_capability(Desire::WouldLike, Capability::Camera)
            .expect("request");
        assert!(matches!(outcome, RequestOutcome::Pending(_)));
        assert_eq!(platform.ask_count(), 1);
        assert_eq!(
            decisions.snapshot(Tier::Persisted, Capability::Camera).expect("snapshot").0,
            Decision::Unknown
        );
    }

    #[tokio::test]
    async fn want_ignores_persisted_tier() {
        let (orchestrator, platform, decisions) = orchestrator();
        decisions
            .record(Tier::Persisted, Capability::Camera, Decision::Denied)
            .expect("record");

        let outcome = orchestrator
            .request_capability(Desire::Want, Capability::Camera)
            .expect("request");
        assert!(matches!(outcome, RequestOutcome::Pending(_)));
        assert_eq!(platform.ask_count(), 1);
    }

    #[tokio::test]
    async fn want_suppressed_by_ephemeral_skip() {
        let (orchestrator, platform, decisions) = orchestrator();
        decisions
            .record(Tier::Ephemeral, Capability::Camera, Decision::Skipped)
            .expect("record");

        let outcome = orchestrator
            .request_capability(Desire::Want, Capability::Camera)
            .expect("request");
        assert!(matches!(outcome, RequestOutcome::Suppressed));
        assert_eq!(platform.ask_count(), 0);
    }

    #[tokio::test]
    async fn need_is_never_suppressed() {
        let (orchestrator, platform, decisions) = orchestrator();
        decisions
            .record(Tier::Persisted, Capability::Camera, Decision::Denied)
            .expect("record");
        decisions
            .record(Tier::Ephemeral, Capability::Camera, Decision::Denied)
            .expect("record");

        let outcome = orchestrator
            .request_capability(Desire::Need, Capability::Camera)
            .expect("request");
        assert!(matches!(outcome, RequestOutcome::Pending(_)));
        assert_eq!(platform.ask_count(), 1);
    }

    #[tokio::test]
    async fn resolution_writes_back_by_desire_tier() {
        let (orchestrator, platform, decisions) = orchestrator();
        let outcome = orchestrator
            .request_capability(Desire::WouldLike, Capability::Camera)
            .expect("request");
        let ticket = match outcome {
            RequestOutcome::Pending(ticket) => ticket,
            _ => panic!("expected Pending"),
        };

        platform.resolve(Capability::Camera, Decision::Denied);
        platform.dismiss();
        let grants = timeout(Duration::from_secs(1), ticket.grants())
            .await
            .expect("timeout")
            .expect("grants");
        assert_eq!(
            grants,
            vec![CapabilityGrant::new(Capability::Camera, Decision::Denied)]
        );
        assert_eq!(
            decisions.snapshot(Tier::Persisted, Capability::Camera).expect("snapshot").0,
            Decision::Denied
        );
        assert_eq!(
            decisions.snapshot(Tier::Ephemeral, Capability::Camera).expect("snapshot").0,
            Decision::Denied
        );
    }

    #[tokio::test]
    async fn status_of_reads_live_platform_not_cache() {
        let (orchestrator, platform, decisions) = orchestrator();
        decisions
            .record(Tier::Persisted, Capability::Camera, Decision::Denied)
            .expect("record");
        platform.set_status(Capability::Camera, AuthorizationStatus::Allowed);

        let grants = orchestrator
            .status_of(&[Capability::Camera, Capability::Calendar])
            .expect("status");
        assert_eq!(
            grants,
            vec![
                CapabilityGrant::new(Capability::Camera, Decision::Allowed),
                CapabilityGrant::new(Capability::Calendar, Decision::Unknown),
            ]
        );
    }

    #[tokio::test]
    async fn status_of_empty_list_is_a_caller_error() {
        let (orchestrator, _, _) = orchestrator();
        let error = orchestrator.status_of(&[]).expect_err("error");
        assert!(matches!(error, WorkerError::InvalidParameters { .. }));
    }

    #[tokio::test]
    async fn await_capability_registers_passively() {
        let (orchestrator, platform, _) = orchestrator();
        let outcome = orchestrator
            .await_capability(Capability::Camera)
            .expect("await");
        let ticket = match outcome {
            RequestOutcome::Pending(ticket) => ticket,
            _ => panic!("expected Pending"),
        };
        assert_eq!(platform.ask_count(), 0);

        let active = orchestrator
            .request_capability(Desire::Need, Capability::Camera)
            .expect("request");
        platform.resolve(Capability::Camera, Decision::Allowed);
        platform.dismiss();

        let grants = timeout(Duration::from_secs(1), ticket.grants())
            .await
            .expect("timeout")
            .expect("grants");
        assert_eq!(
            grants,
            vec![CapabilityGrant::new(Capability::Camera, Decision::Allowed)]
        );
        match active {
            RequestOutcome::Pending(ticket) => {
                let grants = timeout(Duration::from_secs(1), ticket.grants())
                    .await
                    .expect("timeout")
                    .expect("grants");
                assert_eq!(grants.len(), 1);
            }
            _ => panic!("expected Pending"),
        }
    }
}
