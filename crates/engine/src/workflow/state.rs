//! Client-side classification of a revision's review lifecycle.
//!
//! The state is derived entirely from server-owned data (the revision and its
//! embedded approval request); the client never mutates these entities
//! locally. Guards here tell the UI which actions to expose; the server
//! remains the authoritative guard for stale preconditions.

use std::fmt;

use galley_types::Revision;

/// Lifecycle of a (revision, approval request) pair as seen by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
    /// Latest revision with no approval request.
    Draft,
    /// Approval request exists and is undecided.
    InReview,
    Approved,
    Rejected,
}

impl fmt::Display for ReviewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReviewState::Draft => "draft",
            ReviewState::InReview => "in review",
            ReviewState::Approved => "approved",
            ReviewState::Rejected => "rejected",
        };
        f.write_str(label)
    }
}

/// Classify a revision by its embedded approval request.
pub fn review_state(revision: &Revision) -> ReviewState {
    match &revision.approval_request {
        None => ReviewState::Draft,
        Some(request) => match request.approved {
            None => ReviewState::InReview,
            Some(true) => ReviewState::Approved,
            Some(false) => ReviewState::Rejected,
        },
    }
}

/// Saving a new revision discards a pending approval request on the prior
/// latest revision. Advisory only: the UI should confirm with the user, and
/// the server enforces the real precondition.
pub fn save_discards_review(revision: &Revision) -> bool {
    revision.pending_review()
}
