//! Uniform three-state projection over one or several named fetches.
//!
//! Pure function of the bound states; no side effects, safe to call on every
//! render. Combination uses AND semantics: the projection is ready only when
//! every bound fetch is ready, and a rejection takes rendering priority over
//! anything still pending.

use indexmap::IndexMap;
use serde_json::Value;

use crate::engine::FetchState;

/// Merged loading/error/success view consumed by leaf UI.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    /// True if any bound fetch is pending and none are rejected.
    pub pending: bool,
    /// First rejected fetch's message, in declaration order of the keys.
    pub error: Option<String>,
    /// Resolved value for every fulfilled key. Missing keys mean "not ready".
    pub values: IndexMap<String, Value>,
}

impl Projection {
    /// True once every bound fetch has fulfilled.
    pub fn ready(&self) -> bool {
        !self.pending && self.error.is_none()
    }
}

/// Project bound fetch states into a single rendering contract.
pub fn project(states: &IndexMap<String, FetchState>) -> Projection {
    let error = states
        .iter()
        .find(|(_, state)| state.is_rejected())
        .and_then(|(_, state)| state.error.clone());
    let any_pending = states.values().any(FetchState::is_pending);

    let mut values = IndexMap::new();
    for (key, state) in states {
        if state.is_fulfilled()
            && let Some(value) = &state.value
        {
            values.insert(key.clone(), value.clone());
        }
    }

    Projection {
        pending: any_pending && error.is_none(),
        error,
        values,
    }
}
