//! # Galley Engine
//!
//! Declarative data binding and revision workflow for the recipe console.
//! Pages declare the server data they depend on as request descriptors; the
//! engine dispatches, deduplicates, and caches the fetches, and the workflow
//! guards the mutating actions of the review lifecycle.
//!
//! ## Key Features
//!
//! - **Request Descriptors**: Pure values naming a fetch (key, URL, params)
//! - **Fetch Deduplication**: Ticketed state machine that shares in-flight
//!   and cached fetches by fingerprint
//! - **Dependent Fetches**: Continuations that expand into further fetches
//!   once their dependency is fulfilled
//! - **Review Workflow**: Draft → in review → approved/rejected transitions
//!   with client-side guards
//!
//! ## Architecture
//!
//! - **`descriptor`**: Request descriptors and fingerprinting
//! - **`engine`**: The fetch state machine and its tickets
//! - **`binder`**: Evaluating a binding function against inputs
//! - **`view`**: Projecting bound states into a render-ready summary
//! - **`driver`**: The transport seam and the bind/dispatch/settle loop
//! - **`requests`**: Canned descriptors for the console endpoints
//! - **`workflow`**: Review state classification and guarded actions

pub mod binder;
pub mod descriptor;
pub mod driver;
pub mod engine;
pub mod requests;
pub mod view;
pub mod workflow;

pub use binder::{BindOutcome, DependentFetchBinder, MAX_CONTINUATION_DEPTH};
pub use descriptor::{Continuation, DescriptorMap, RequestDescriptor};
pub use driver::{FetchTransport, HttpTransport, run_until_settled, settle_plans};
pub use engine::{FetchEngine, FetchPlan, FetchState, FetchStatus, Resolution};
pub use view::{Projection, project};
pub use workflow::{RecipeGateway, ReviewState, RevisionWorkflow, review_state, save_discards_review};
