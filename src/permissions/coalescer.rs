//! Single-flight coalescing of concurrent permission asks.
//!
//! At most one platform ask is outstanding per coalescer. Requests arriving
//! while an ask is open merge into the waiter registry instead of opening a
//! second dialog. Every waiter is notified exactly once, in registration
//! order, once its full capability set has resolved.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{mpsc, oneshot};

use crate::error::{WorkerError, WorkerResult};
use crate::platform::types::AskEvent;
use crate::platform::SharedAuthorization;

use super::store::DecisionStore;
use super::types::{AuthorizationStatus, Capability, CapabilityGrant, Decision, Desire};

/// A pending resolution handed to one caller.
///
/// The ticket resolves once every capability of the originating request has
/// a decision. Dropping the ticket abandons the wait without affecting the
/// shared ask.
pub struct PermissionTicket {
    receiver: oneshot::Receiver<Vec<CapabilityGrant>>,
}

impl PermissionTicket {
    /// Wait for the full set of grants.
    pub async fn grants(self) -> WorkerResult<Vec<CapabilityGrant>> {
        self.receiver
            .await
            .map_err(|_| WorkerError::Internal("permission waiter dropped unresolved".to_string()))
    }
}

struct Waiter {
    remaining: Vec<Capability>,
    resolved: Vec<CapabilityGrant>,
    sender: oneshot::Sender<Vec<CapabilityGrant>>,
}

#[derive(Default)]
struct CoalescerState {
    /// FIFO by registration.
    waiters: Vec<Waiter>,
    /// Capabilities of the outstanding ask not yet resolved.
    asking: Vec<Capability>,
    /// True from ask presentation until its dismissal. The single-flight
    /// guard; `asking` alone drains before the dialog goes away.
    ask_open: bool,
    ask_desire: Option<Desire>,
}

/// Waiter registry plus single-flight ask state.
pub struct RequestCoalescer {
    platform: SharedAuthorization,
    decisions: Arc<DecisionStore>,
    state: Mutex<CoalescerState>,
}

impl RequestCoalescer {
    pub fn new(platform: SharedAuthorization, decisions: Arc<DecisionStore>) -> Self {
        Self {
            platform,
            decisions,
            state: Mutex::new(CoalescerState::default()),
        }
    }

    /// Register a waiter for `capabilities` and open a platform ask if none
    /// is outstanding. While an ask is open, further submissions merge as
    /// waiters only.
    pub fn submit(
        self: &Arc<Self>,
        desire: Desire,
        capabilities: Vec<Capability>,
    ) -> WorkerResult<PermissionTicket> {
        let (sender, receiver) = oneshot::channel();
        let ask = {
            let mut state = self.lock()?;
            let ask_everything = desire == Desire::Present && !state.ask_open;
            // Live-allowed capabilities resolve from status at registration;
            // only the rest ride an ask. A `Present` ask covers everything.
            let (resolved, remaining) = if ask_everything {
                (Vec::new(), capabilities.clone())
            } else {
                self.split_live_allowed(&capabilities)
            };
            if remaining.is_empty() && !ask_everything {
                let _ = sender.send(resolved);
                return Ok(PermissionTicket { receiver });
            }
            state.waiters.push(Waiter {
                remaining,
                resolved,
                sender,
            });
            if state.ask_open {
                None
            } else {
                let union = self.ask_union(&state, desire, &capabilities);
                state.asking = union.clone();
                state.ask_open = true;
                state.ask_desire = Some(desire);
                Some(union)
            }
        };

        if let Some(union) = ask {
            tracing::debug!(?union, "presenting permission ask");
            let events = self.platform.present_ask(union);
            let coalescer = self.clone();
            tokio::spawn(async move { coalescer.pump(events).await });
        }
        Ok(PermissionTicket { receiver })
    }

    /// Register a passive waiter that never opens an ask of its own.
    pub fn watch(&self, capability: Capability) -> WorkerResult<PermissionTicket> {
        let (sender, receiver) = oneshot::channel();
        let mut state = self.lock()?;
        state.waiters.push(Waiter {
            remaining: vec![capability],
            resolved: Vec::new(),
            sender,
        });
        Ok(PermissionTicket { receiver })
    }

    /// Partition `capabilities` into live-allowed grants and the subset
    /// that still needs an answer.
    fn split_live_allowed(
        &self,
        capabilities: &[Capability],
    ) -> (Vec<CapabilityGrant>, Vec<Capability>) {
        let mut resolved = Vec::new();
        let mut remaining = Vec::new();
        for capability in capabilities {
            if self.platform.current_status(*capability) == AuthorizationStatus::Allowed {
                resolved.push(CapabilityGrant::new(*capability, Decision::Allowed));
            } else {
                remaining.push(*capability);
            }
        }
        (resolved, remaining)
    }

    /// Union of the requested capabilities (ordered first) and every other
    /// currently-waiting capability, de-duplicated, with live-allowed
    /// capabilities dropped unless the ask is a `Present`.
    fn ask_union(
        &self,
        state: &CoalescerState,
        desire: Desire,
        requested: &[Capability],
    ) -> Vec<Capability> {
        let mut union: Vec<Capability> = Vec::new();
        let push = |capability: Capability, union: &mut Vec<Capability>| {
            if !union.contains(&capability) {
                union.push(capability);
            }
        };
        for capability in requested {
            push(*capability, &mut union);
        }
        for waiter in &state.waiters {
            for capability in &waiter.remaining {
                push(*capability, &mut union);
            }
        }
        if desire == Desire::Present {
            return union;
        }
        union
            .into_iter()
            .filter(|capability| {
                self.platform.current_status(*capability) != AuthorizationStatus::Allowed
            })
            .collect()
    }

    async fn pump(self: Arc<Self>, mut events: mpsc::Receiver<AskEvent>) {
        loop {
            match events.recv().await {
                Some(AskEvent::Resolved(capability, decision)) => {
                    if let Err(error) = self.handle_resolved(capability, decision) {
                        tracing::warn!(%error, "failed to apply ask resolution");
                    }
                }
                Some(AskEvent::Dismissed) => {
                    if let Err(error) = self.handle_dismissed() {
                        tracing::warn!(%error, "failed to apply ask dismissal");
                    }
                    break;
                }
                None => {
                    // Adapter dropped the stream without a dismissal; treat
                    // it as one so coalesced waiters are not stranded.
                    tracing::warn!("ask stream closed without dismissal");
                    if let Err(error) = self.handle_dismissed() {
                        tracing::warn!(%error, "failed to apply ask dismissal");
                    }
                    break;
                }
            }
        }
    }

    fn handle_resolved(&self, capability: Capability, decision: Decision) -> WorkerResult<()> {
        let desire = {
            let mut state = self.lock()?;
            state.asking.retain(|pending| *pending != capability);
            state.ask_desire
        };
        if let Some(desire) = desire {
            self.decisions.record_for_desire(desire, capability, decision)?;
        }
        self.notify(capability, decision)
    }

    /// A dismissal resolves every still-open capability of the ask from its
    /// live status: unknown becomes `Skipped`, but an existing deny is
    /// re-applied rather than softened to a skip.
    fn handle_dismissed(&self) -> WorkerResult<()> {
        let (open, desire) = {
            let mut state = self.lock()?;
            let open = std::mem::take(&mut state.asking);
            let desire = state.ask_desire.take();
            state.ask_open = false;
            (open, desire)
        };
        for capability in open {
            let decision = match self.platform.current_status(capability) {
                AuthorizationStatus::Allowed => Decision::Allowed,
                AuthorizationStatus::Denied => Decision::Denied,
                AuthorizationStatus::Unknown => Decision::Skipped,
            };
            // Only skips and denies are written back; an allow already
            // shows in live status.
            if decision != Decision::Allowed {
                if let Some(desire) = desire {
                    self.decisions.record_for_desire(desire, capability, decision)?;
                }
            }
            self.notify(capability, decision)?;
        }
        Ok(())
    }

    /// Update every waiter whose set contains `capability`; waiters whose
    /// full set has resolved are removed and notified in FIFO order.
    fn notify(&self, capability: Capability, decision: Decision) -> WorkerResult<()> {
        let ready = {
            let mut state = self.lock()?;
            let mut ready = Vec::new();
            let mut index = 0;
            while index < state.waiters.len() {
                let waiter = &mut state.waiters[index];
                if waiter.remaining.contains(&capability) {
                    waiter.remaining.retain(|pending| *pending != capability);
                    waiter.resolved.push(CapabilityGrant::new(capability, decision));
                    if waiter.remaining.is_empty() {
                        ready.push(state.waiters.remove(index));
                        continue;
                    }
                }
                index += 1;
            }
            ready
        };
        for waiter in ready {
            if waiter.sender.send(waiter.resolved).is_err() {
                tracing::debug!("permission waiter dropped before notification");
            }
        }
        Ok(())
    }

    fn lock(&self) -> WorkerResult<MutexGuard<'_, CoalescerState>> {
        self.state
            .lock()
            .map_err(|_| WorkerError::Internal("coalescer lock poisoned".to_string()))
    }

    #[cfg(test)]
    fn waiter_count(&self) -> usize {
        self.lock().map(|state| state.waiters.len()).unwrap_or(0)
    }
}
