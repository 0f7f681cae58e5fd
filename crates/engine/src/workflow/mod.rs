//! Revision review lifecycle: state classification and guarded actions.

pub mod actions;
pub mod state;

pub use actions::{RecipeGateway, RevisionWorkflow};
pub use state::{ReviewState, review_state, save_discards_review};
