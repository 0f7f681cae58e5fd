//! Fetch execution state, keyed by dependency fingerprint.
//!
//! The engine owns the per-key [`FetchState`] table. [`FetchEngine::resolve`]
//! splits "what is the state now" from "what must be dispatched": it returns
//! the current state together with an optional [`FetchPlan`] the caller is
//! responsible for driving through a transport and settling back via
//! [`FetchEngine::settle`]. This keeps the engine callable from any
//! scheduling model and makes completion ordering directly testable.
//!
//! Ordering between a slow in-flight request and a newer one for the same key
//! is arbitrated with monotonic tickets: a settle whose ticket no longer
//! matches the stored state is discarded (last-fingerprint-wins).

use std::collections::HashMap;

use serde_json::{Map as JsonMap, Value};
use tracing::debug;

use crate::descriptor::RequestDescriptor;

/// Settlement status of one named fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Pending,
    Fulfilled,
    Rejected,
}

/// Per-key fetch state, owned exclusively by [`FetchEngine`].
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState {
    pub status: FetchStatus,
    /// Parameter serialization that produced (or will produce) the value.
    pub fingerprint: String,
    /// Resolved value when `status` is `Fulfilled`.
    pub value: Option<Value>,
    /// Failure message when `status` is `Rejected`.
    pub error: Option<String>,
    /// Dispatch ticket guarding against out-of-order completions.
    pub(crate) ticket: u64,
}

impl FetchState {
    fn pending(fingerprint: String, ticket: u64) -> Self {
        Self {
            status: FetchStatus::Pending,
            fingerprint,
            value: None,
            error: None,
            ticket,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == FetchStatus::Pending
    }

    pub fn is_fulfilled(&self) -> bool {
        self.status == FetchStatus::Fulfilled
    }

    pub fn is_rejected(&self) -> bool {
        self.status == FetchStatus::Rejected
    }
}

/// Work the caller must dispatch: one network call plus the ticket that its
/// completion has to present when settling.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchPlan {
    pub key: String,
    pub ticket: u64,
    pub url: String,
    pub params: JsonMap<String, Value>,
    pub fingerprint: String,
}

/// Result of a `resolve` call: the state as of now, and the plan to dispatch
/// when a new network call is needed.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub state: FetchState,
    pub plan: Option<FetchPlan>,
}

/// Executes request descriptors, deduplicating by fingerprint.
#[derive(Debug, Default)]
pub struct FetchEngine {
    states: HashMap<String, FetchState>,
    next_ticket: u64,
}

impl FetchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state for a key, if any fetch was ever issued for it.
    pub fn state(&self, key: &str) -> Option<&FetchState> {
        self.states.get(key)
    }

    /// Resolve a descriptor against the stored state for its key.
    ///
    /// - No stored state, a differing fingerprint, or `force`: the key
    ///   transitions to `Pending` immediately (a stale fulfilled/rejected
    ///   state is superseded before the network call resolves) and a plan is
    ///   returned for dispatch.
    /// - Matching fingerprint and not forced: the stored state is returned
    ///   unchanged and no plan is produced, whether the fetch is still in
    ///   flight or already settled.
    ///
    /// Never fails; fetch failures enter the table through [`Self::settle`].
    pub fn resolve(&mut self, descriptor: &RequestDescriptor) -> Resolution {
        let fingerprint = descriptor.fingerprint();

        if let Some(existing) = self.states.get(&descriptor.key)
            && existing.fingerprint == fingerprint
            && !descriptor.force
        {
            debug!(key = %descriptor.key, %fingerprint, "fetch deduplicated");
            return Resolution {
                state: existing.clone(),
                plan: None,
            };
        }

        self.next_ticket += 1;
        let ticket = self.next_ticket;
        let state = FetchState::pending(fingerprint.clone(), ticket);
        self.states.insert(descriptor.key.clone(), state.clone());
        debug!(key = %descriptor.key, %fingerprint, ticket, force = descriptor.force, "fetch dispatch");

        Resolution {
            state,
            plan: Some(FetchPlan {
                key: descriptor.key.clone(),
                ticket,
                url: descriptor.url.clone(),
                params: descriptor.params.clone(),
                fingerprint,
            }),
        }
    }

    /// Apply a network completion for a previously planned fetch.
    ///
    /// A completion whose ticket no longer matches the stored state belongs
    /// to a superseded fingerprint and is discarded. Returns whether the
    /// completion was applied.
    pub fn settle(&mut self, key: &str, ticket: u64, outcome: Result<Value, String>) -> bool {
        match self.states.get_mut(key) {
            Some(state) if state.ticket == ticket => {
                match outcome {
                    Ok(value) => {
                        state.status = FetchStatus::Fulfilled;
                        state.value = Some(value);
                        state.error = None;
                    }
                    Err(message) => {
                        state.status = FetchStatus::Rejected;
                        state.value = None;
                        state.error = Some(message);
                    }
                }
                true
            }
            _ => {
                debug!(key, ticket, "discarding stale fetch completion");
                false
            }
        }
    }
}
