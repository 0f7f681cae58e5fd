//! Reactive recomputation of a descriptor set over changing inputs.
//!
//! The binder owns a caller-supplied binding function from component inputs
//! to an ordered [`DescriptorMap`]. Every [`DependentFetchBinder::bind`] call
//! re-evaluates that mapping, resolves each descriptor through the
//! [`FetchEngine`], and expands continuations whose dependency has reached
//! `Fulfilled`. `bind` is pure given `(inputs, engine state)` and is safe to
//! call from any scheduling model; engine deduplication makes repeated calls
//! free of network effects.
//!
//! A descriptor's `force` flag applies once per mapping recomputation: for
//! top-level descriptors that is an input change, for continuation children
//! it is a fresh fulfillment of their dependency. Idempotent re-binds never
//! re-dispatch a forced fetch.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

use galley_api::Error;

use crate::{
    descriptor::{DescriptorMap, RequestDescriptor},
    engine::{FetchEngine, FetchPlan, FetchState},
};

/// Continuation chains longer than this are a configuration error.
pub const MAX_CONTINUATION_DEPTH: usize = 8;

/// Result of one `bind` evaluation: the states for every currently-bound key
/// (in declaration order) and the plans the caller must dispatch and settle.
#[derive(Debug, Clone)]
pub struct BindOutcome {
    pub states: IndexMap<String, FetchState>,
    pub plans: Vec<FetchPlan>,
}

/// Drives the fetch engine from a mapping of inputs to named descriptors.
pub struct DependentFetchBinder {
    binding: Box<dyn Fn(&Value) -> DescriptorMap + Send + Sync>,
    engine: FetchEngine,
    last_inputs: Option<Value>,
    /// Bumped on every deep-inequality input change; the trigger for
    /// top-level forced descriptors.
    generation: u64,
    /// Trigger under which each forced key was last dispatched.
    forced_marks: HashMap<String, u64>,
    /// Fully expanded mapping from the previous evaluation, used by
    /// [`Self::force_refresh`].
    current: DescriptorMap,
}

impl DependentFetchBinder {
    pub fn new(binding: impl Fn(&Value) -> DescriptorMap + Send + Sync + 'static) -> Self {
        Self {
            binding: Box::new(binding),
            engine: FetchEngine::new(),
            last_inputs: None,
            generation: 0,
            forced_marks: HashMap::new(),
            current: DescriptorMap::new(),
        }
    }

    /// Re-evaluate the binding for the given inputs.
    ///
    /// Inputs are compared by deep equality, not identity. Keys absent from
    /// the recomputed mapping drop out of the returned states; an in-flight
    /// fetch for a dropped key is left to settle but no longer contributes.
    pub fn bind(&mut self, inputs: &Value) -> Result<BindOutcome, Error> {
        if self.last_inputs.as_ref() != Some(inputs) {
            self.generation += 1;
            debug!(generation = self.generation, "binder inputs changed; recomputing descriptor set");
            self.last_inputs = Some(inputs.clone());
        }

        let mut states = IndexMap::new();
        let mut plans = Vec::new();
        let mut resolved = DescriptorMap::new();

        // Descriptors resolve in declaration order; continuations expand
        // breadth-first, each level gated on its dependency's fulfillment.
        let mut frontier: Vec<(String, RequestDescriptor, u64)> = (self.binding)(inputs)
            .into_iter()
            .map(|(key, descriptor)| (key, descriptor, self.generation))
            .collect();
        let mut depth = 0usize;

        while !frontier.is_empty() {
            if depth >= MAX_CONTINUATION_DEPTH {
                return Err(Error::Configuration(format!(
                    "continuation chain exceeded depth limit of {MAX_CONTINUATION_DEPTH}"
                )));
            }

            let mut next = Vec::new();
            for (key, mut descriptor, trigger) in frontier {
                if resolved.contains_key(&key) {
                    return Err(Error::Configuration(format!(
                        "continuation key '{key}' collides with an existing fetch"
                    )));
                }

                // The map key is the authoritative identity within a binding.
                descriptor.key = key.clone();
                let declared_force = descriptor.force;
                descriptor.force = declared_force && self.forced_marks.get(&key) != Some(&trigger);

                let resolution = self.engine.resolve(&descriptor);
                if descriptor.force {
                    self.forced_marks.insert(key.clone(), trigger);
                }
                if let Some(plan) = resolution.plan {
                    plans.push(plan);
                }

                if resolution.state.is_fulfilled()
                    && let Some(continuation) = descriptor.continuation.clone()
                {
                    let value = resolution.state.value.clone().unwrap_or(Value::Null);
                    let dependency_ticket = resolution.state.ticket;
                    for (child_key, child) in continuation(&value) {
                        next.push((child_key, child, dependency_ticket));
                    }
                }

                descriptor.force = declared_force;
                states.insert(key.clone(), resolution.state);
                resolved.insert(key, descriptor);
            }

            frontier = next;
            depth += 1;
        }

        self.current = resolved;
        Ok(BindOutcome { states, plans })
    }

    /// Re-issue named fetches with `force = true` without an input change,
    /// used after a mutating workflow action succeeds. Keys not present in
    /// the current mapping are skipped.
    pub fn force_refresh(&mut self, keys: &[&str]) -> Vec<FetchPlan> {
        let mut plans = Vec::new();
        for &key in keys {
            match self.current.get(key) {
                Some(descriptor) => {
                    let forced = descriptor.clone().forced();
                    if let Some(plan) = self.engine.resolve(&forced).plan {
                        plans.push(plan);
                    }
                }
                None => warn!(key, "force refresh requested for unbound key"),
            }
        }
        plans
    }

    /// Apply a network completion for a plan produced by this binder.
    pub fn settle(&mut self, key: &str, ticket: u64, outcome: Result<Value, String>) -> bool {
        self.engine.settle(key, ticket, outcome)
    }

    /// Read-only view of the engine's state for a key.
    pub fn state(&self, key: &str) -> Option<&FetchState> {
        self.engine.state(key)
    }
}
