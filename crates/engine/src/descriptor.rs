//! Request descriptors: pure values describing one remote call.
//!
//! A descriptor names a fetch (`key`), its target (`url` + `params`), and
//! optionally a continuation that maps the resolved value into further
//! descriptors, which is how "fetch B depends on the result of fetch A" is
//! expressed. The fingerprint is a stable serialization of the parameters,
//! used by the engine to decide whether a prior result is still valid.

use std::{fmt, sync::Arc};

use indexmap::IndexMap;
use serde_json::{Map as JsonMap, Value};

/// Ordered mapping of fetch key to descriptor. Iteration order is the
/// declaration order, which the binder preserves when resolving.
pub type DescriptorMap = IndexMap<String, RequestDescriptor>;

/// Continuation producing dependent descriptors from a resolved value.
pub type Continuation = Arc<dyn Fn(&Value) -> DescriptorMap + Send + Sync>;

/// Pure value describing one remote call.
#[derive(Clone)]
pub struct RequestDescriptor {
    /// Stable identity of this fetch within a binding.
    pub key: String,
    /// API-relative request target.
    pub url: String,
    /// Fingerprint inputs, sent as query parameters.
    pub params: JsonMap<String, Value>,
    /// Bypass deduplication against a previously-completed fetch with the
    /// same fingerprint. Applied once per mapping recomputation, not on
    /// every idempotent re-bind.
    pub force: bool,
    /// Optional mapping of the resolved value to further descriptors.
    pub continuation: Option<Continuation>,
}

impl RequestDescriptor {
    pub fn new(key: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            url: url.into(),
            params: JsonMap::new(),
            force: false,
            continuation: None,
        }
    }

    pub fn with_params(mut self, params: JsonMap<String, Value>) -> Self {
        self.params = params;
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }

    /// Attach a continuation invoked with the fulfilled value.
    pub fn and_then(mut self, continuation: impl Fn(&Value) -> DescriptorMap + Send + Sync + 'static) -> Self {
        self.continuation = Some(Arc::new(continuation));
        self
    }

    /// Stable serialization of the request target and parameters.
    ///
    /// `serde_json::Map` keeps keys sorted, so two parameter maps built in
    /// different insertion orders fingerprint identically.
    pub fn fingerprint(&self) -> String {
        let params = serde_json::to_string(&self.params).unwrap_or_default();
        format!("{}?{}", self.url, params)
    }
}

impl fmt::Debug for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDescriptor")
            .field("key", &self.key)
            .field("url", &self.url)
            .field("params", &self.params)
            .field("force", &self.force)
            .field("continuation", &self.continuation.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fingerprint_is_order_independent() {
        let first = RequestDescriptor::new("recipes", "/recipe/")
            .with_param("page", 2)
            .with_param("ordering", "-last_updated");
        let second = RequestDescriptor::new("recipes", "/recipe/")
            .with_param("ordering", "-last_updated")
            .with_param("page", 2);

        assert_eq!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn fingerprint_changes_with_params() {
        let base = RequestDescriptor::new("recipes", "/recipe/").with_param("page", 2);
        let changed = base.clone().with_param("text", "heartbeat");
        assert_ne!(base.fingerprint(), changed.fingerprint());
    }

    #[test]
    fn fingerprint_ignores_force_flag() {
        let plain = RequestDescriptor::new("history", "/recipe/1/history/");
        let forced = plain.clone().forced();
        assert_eq!(plain.fingerprint(), forced.fingerprint());
    }

    #[test]
    fn continuation_is_opaque_in_debug_output() {
        let descriptor = RequestDescriptor::new("revision", "/recipe_revision/abc/")
            .and_then(|_value| DescriptorMap::new());
        let rendered = format!("{descriptor:?}");
        assert!(rendered.contains("continuation: true"));
    }

    #[test]
    fn params_builder_accumulates() {
        let descriptor = RequestDescriptor::new("recipes", "/recipe/")
            .with_params(json!({"page": 1}).as_object().cloned().unwrap())
            .with_param("status", "enabled");
        assert_eq!(descriptor.params.len(), 2);
    }
}
