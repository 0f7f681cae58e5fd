//! Error taxonomy for the console REST boundary.
//!
//! Fetch failures are captured into rejected fetch states by the engine and
//! never thrown across a render boundary; mutating workflow actions report
//! these errors directly to the invoking caller instead.

use reqwest::StatusCode;
use serde_json::{Map as JsonMap, Value};
use thiserror::Error;

/// Errors surfaced by the client and the binding layer built on top of it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Network failure or a response body that was not JSON.
    #[error("network error: {0}")]
    Transport(String),

    /// Non-2xx response with a structured body. `field_errors` carries
    /// field-keyed validation errors when the server returned them, so the
    /// caller can route them back into form validation.
    #[error("{message}")]
    Api {
        message: String,
        field_errors: Option<JsonMap<String, Value>>,
    },

    /// Local pre-submission validation failure; no network call was made.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Binder misconfiguration (continuation key collision or chain-depth
    /// overflow). Programmer error; aborts binder setup loudly.
    #[error("binding configuration error: {0}")]
    Configuration(String),

    /// A workflow action was invoked from a state that does not allow it.
    /// Programmer error in the caller; the UI must not expose the action.
    #[error("cannot {action} from the {state} state")]
    IllegalTransition { action: &'static str, state: String },
}

impl Error {
    /// Decode a non-2xx response body into the taxonomy.
    ///
    /// The server is expected to return `{detail: string}` for plain errors
    /// or a field-keyed map for validation failures. Anything that is not
    /// JSON degrades to [`Error::Transport`] with a generic description.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(map)) => {
                if let Some(detail) = map.get("detail").and_then(Value::as_str) {
                    Error::Api {
                        message: detail.to_string(),
                        field_errors: None,
                    }
                } else {
                    Error::Api {
                        message: format!("request failed with HTTP {}", status.as_u16()),
                        field_errors: Some(map),
                    }
                }
            }
            _ => Error::Transport(format!("HTTP {} with non-JSON response body", status.as_u16())),
        }
    }
}
