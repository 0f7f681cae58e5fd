//! Mutating revision-workflow actions and their transition guards.
//!
//! Every action validates its source state before touching the network.
//! Illegal transitions are programming errors in the caller (the UI must not
//! expose the action) and surface as [`Error::IllegalTransition`]; local
//! validation failures block submission before any call is made. All other
//! failures propagate from the gateway as transport or API errors so the
//! caller can show a notification and route field errors back into forms.
//!
//! Actions never mutate fetch-engine state. On success the caller is
//! expected to `force_refresh` the affected bindings so canonical state is
//! re-fetched from the server instead of diverging into optimistic copies.

use async_trait::async_trait;
use tracing::info;

use galley_api::{ConsoleClient, Error};
use galley_types::{ApprovalRequest, Recipe, RecipeValues, Revision};

use super::state::{ReviewState, review_state, save_discards_review};

/// REST operations the workflow depends on, kept as a seam so tests can
/// script responses without a server.
#[async_trait]
pub trait RecipeGateway: Send + Sync {
    async fn create_recipe(&self, values: &RecipeValues) -> Result<Recipe, Error>;
    async fn save_recipe(&self, recipe_id: u64, values: &RecipeValues) -> Result<Recipe, Error>;
    async fn delete_recipe(&self, recipe_id: u64) -> Result<(), Error>;
    async fn enable_recipe(&self, recipe_id: u64) -> Result<Recipe, Error>;
    async fn disable_recipe(&self, recipe_id: u64) -> Result<Recipe, Error>;
    async fn request_approval(&self, revision_id: &str) -> Result<ApprovalRequest, Error>;
    async fn close_approval(&self, request_id: u64) -> Result<(), Error>;
    async fn approve(&self, request_id: u64, comment: &str) -> Result<ApprovalRequest, Error>;
    async fn reject(&self, request_id: u64, comment: &str) -> Result<ApprovalRequest, Error>;
}

#[async_trait]
impl RecipeGateway for ConsoleClient {
    async fn create_recipe(&self, values: &RecipeValues) -> Result<Recipe, Error> {
        ConsoleClient::create_recipe(self, values).await
    }

    async fn save_recipe(&self, recipe_id: u64, values: &RecipeValues) -> Result<Recipe, Error> {
        ConsoleClient::save_recipe(self, recipe_id, values).await
    }

    async fn delete_recipe(&self, recipe_id: u64) -> Result<(), Error> {
        ConsoleClient::delete_recipe(self, recipe_id).await
    }

    async fn enable_recipe(&self, recipe_id: u64) -> Result<Recipe, Error> {
        ConsoleClient::enable_recipe(self, recipe_id).await
    }

    async fn disable_recipe(&self, recipe_id: u64) -> Result<Recipe, Error> {
        ConsoleClient::disable_recipe(self, recipe_id).await
    }

    async fn request_approval(&self, revision_id: &str) -> Result<ApprovalRequest, Error> {
        ConsoleClient::request_approval(self, revision_id).await
    }

    async fn close_approval(&self, request_id: u64) -> Result<(), Error> {
        ConsoleClient::close_approval(self, request_id).await
    }

    async fn approve(&self, request_id: u64, comment: &str) -> Result<ApprovalRequest, Error> {
        ConsoleClient::approve(self, request_id, comment).await
    }

    async fn reject(&self, request_id: u64, comment: &str) -> Result<ApprovalRequest, Error> {
        ConsoleClient::reject(self, request_id, comment).await
    }
}

/// The domain state machine: guards user actions and invokes the gateway.
pub struct RevisionWorkflow<G: RecipeGateway> {
    gateway: G,
}

impl<G: RecipeGateway> RevisionWorkflow<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    /// Save edited values, producing a new latest revision server-side.
    ///
    /// Legal only on the latest revision. If the revision carries a pending
    /// approval request the save will discard it; callers should confirm
    /// with the user first (see [`save_discards_review`]) but the server is
    /// the authoritative guard for stale preconditions.
    pub async fn save(&self, revision: &Revision, values: &RecipeValues) -> Result<Recipe, Error> {
        if !revision.editable() {
            return Err(illegal("save", "read-only revision"));
        }
        if save_discards_review(revision) {
            info!(revision = %revision.short_id(), "saving over a pending approval request");
        }
        self.gateway.save_recipe(revision.recipe_id, values).await
    }

    /// Submit the latest revision for review.
    pub async fn request_approval(&self, revision: &Revision) -> Result<ApprovalRequest, Error> {
        if !revision.editable() {
            return Err(illegal("request approval for", "read-only revision"));
        }
        let state = review_state(revision);
        if state != ReviewState::Draft {
            return Err(illegal("request approval", state));
        }
        info!(revision = %revision.short_id(), "requesting approval");
        self.gateway.request_approval(&revision.id).await
    }

    /// Withdraw a pending review, returning the revision to draft.
    pub async fn cancel_approval(&self, revision: &Revision) -> Result<(), Error> {
        match &revision.approval_request {
            Some(request) if request.is_pending() => {
                info!(request = request.id, "cancelling approval request");
                self.gateway.close_approval(request.id).await
            }
            _ => Err(illegal("cancel approval", review_state(revision))),
        }
    }

    /// Approve a pending request. The comment is required.
    pub async fn approve(&self, request: &ApprovalRequest, comment: &str) -> Result<ApprovalRequest, Error> {
        Self::check_decidable("approve", request, comment)?;
        info!(request = request.id, "approving revision");
        self.gateway.approve(request.id, comment.trim()).await
    }

    /// Reject a pending request. The comment is required.
    pub async fn reject(&self, request: &ApprovalRequest, comment: &str) -> Result<ApprovalRequest, Error> {
        Self::check_decidable("reject", request, comment)?;
        info!(request = request.id, "rejecting revision");
        self.gateway.reject(request.id, comment.trim()).await
    }

    /// Publish the approved revision, enabling the recipe.
    pub async fn publish(&self, recipe: &Recipe) -> Result<Recipe, Error> {
        if !recipe.may_publish() {
            let state = if recipe.enabled { "enabled" } else { "unapproved" };
            return Err(illegal("publish", state));
        }
        info!(recipe = recipe.id, "publishing recipe");
        self.gateway.enable_recipe(recipe.id).await
    }

    /// Take the recipe offline without discarding its approval.
    pub async fn disable(&self, recipe: &Recipe) -> Result<Recipe, Error> {
        if !recipe.may_disable() {
            return Err(illegal("disable", "disabled"));
        }
        info!(recipe = recipe.id, "disabling recipe");
        self.gateway.disable_recipe(recipe.id).await
    }

    /// Remove a recipe and all of its revisions. Legal from any state.
    pub async fn delete(&self, recipe_id: u64) -> Result<(), Error> {
        info!(recipe = recipe_id, "deleting recipe");
        self.gateway.delete_recipe(recipe_id).await
    }

    /// Create a new recipe seeded from an existing one, starting in draft.
    /// Not a transition on the source; the source is untouched.
    pub async fn clone_recipe(&self, source: &Recipe) -> Result<Recipe, Error> {
        info!(source = source.id, "cloning recipe");
        self.gateway.create_recipe(&RecipeValues::from_recipe(source)).await
    }

    fn check_decidable(action: &'static str, request: &ApprovalRequest, comment: &str) -> Result<(), Error> {
        if !request.is_pending() {
            let state = if request.approved == Some(true) { "approved" } else { "rejected" };
            return Err(illegal(action, state));
        }
        if comment.trim().is_empty() {
            return Err(Error::Validation("a review comment is required".into()));
        }
        Ok(())
    }
}

fn illegal(action: &'static str, state: impl ToString) -> Error {
    Error::IllegalTransition {
        action,
        state: state.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Gateway that logs calls and plays back a server-side lifecycle.
    #[derive(Default)]
    struct ScriptedGateway {
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedGateway {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("call log lock").clone()
        }

        fn record(&self, call: impl Into<String>) {
            self.calls.lock().expect("call log lock").push(call.into());
        }
    }

    #[async_trait]
    impl RecipeGateway for ScriptedGateway {
        async fn create_recipe(&self, values: &RecipeValues) -> Result<Recipe, Error> {
            self.record(format!("create:{}", values.name));
            Ok(recipe_fixture(2, "v2-draft", false, None))
        }

        async fn save_recipe(&self, recipe_id: u64, _values: &RecipeValues) -> Result<Recipe, Error> {
            self.record(format!("save:{recipe_id}"));
            Ok(recipe_fixture(recipe_id, "v2", false, None))
        }

        async fn delete_recipe(&self, recipe_id: u64) -> Result<(), Error> {
            self.record(format!("delete:{recipe_id}"));
            Ok(())
        }

        async fn enable_recipe(&self, recipe_id: u64) -> Result<Recipe, Error> {
            self.record(format!("enable:{recipe_id}"));
            Ok(recipe_fixture(recipe_id, "v1", true, Some("v1")))
        }

        async fn disable_recipe(&self, recipe_id: u64) -> Result<Recipe, Error> {
            self.record(format!("disable:{recipe_id}"));
            Ok(recipe_fixture(recipe_id, "v1", false, Some("v1")))
        }

        async fn request_approval(&self, revision_id: &str) -> Result<ApprovalRequest, Error> {
            self.record(format!("request_approval:{revision_id}"));
            Ok(ApprovalRequest {
                id: 50,
                revision_id: revision_id.to_string(),
                approved: None,
                approver_email: None,
                comment: None,
            })
        }

        async fn close_approval(&self, request_id: u64) -> Result<(), Error> {
            self.record(format!("close:{request_id}"));
            Ok(())
        }

        async fn approve(&self, request_id: u64, comment: &str) -> Result<ApprovalRequest, Error> {
            self.record(format!("approve:{request_id}:{comment}"));
            Ok(ApprovalRequest {
                id: request_id,
                revision_id: "v1".into(),
                approved: Some(true),
                approver_email: Some("x@example.com".into()),
                comment: Some(comment.to_string()),
            })
        }

        async fn reject(&self, request_id: u64, comment: &str) -> Result<ApprovalRequest, Error> {
            self.record(format!("reject:{request_id}:{comment}"));
            Ok(ApprovalRequest {
                id: request_id,
                revision_id: "v1".into(),
                approved: Some(false),
                approver_email: Some("x@example.com".into()),
                comment: Some(comment.to_string()),
            })
        }
    }

    fn recipe_fixture(id: u64, latest: &str, enabled: bool, approved: Option<&str>) -> Recipe {
        Recipe {
            id,
            name: "heartbeat-survey".into(),
            action: "show-heartbeat".into(),
            filter_expression: "true".into(),
            arguments: serde_json::json!({}),
            enabled,
            last_updated: None,
            approved_revision_id: approved.map(str::to_string),
            latest_revision_id: latest.into(),
        }
    }

    fn revision_fixture(latest: bool, request: Option<ApprovalRequest>) -> Revision {
        Revision {
            id: "v1".into(),
            recipe_id: 1,
            is_latest: latest,
            is_archived: false,
            created_from_revision_id: None,
            approval_request: request,
        }
    }

    fn pending_request() -> ApprovalRequest {
        ApprovalRequest {
            id: 50,
            revision_id: "v1".into(),
            approved: None,
            approver_email: None,
            comment: None,
        }
    }

    #[tokio::test]
    async fn draft_to_published_and_back_to_disabled() {
        let workflow = RevisionWorkflow::new(ScriptedGateway::default());
        let draft = revision_fixture(true, None);

        let request = workflow.request_approval(&draft).await.expect("request approval");
        assert!(request.is_pending());

        let decided = workflow.approve(&request, "looks good").await.expect("approve");
        assert_eq!(decided.approved, Some(true));
        assert_eq!(decided.approver_email.as_deref(), Some("x@example.com"));

        let unpublished = recipe_fixture(1, "v1", false, Some("v1"));
        let published = workflow.publish(&unpublished).await.expect("publish");
        assert!(published.enabled);
        assert_eq!(published.approved_revision_id.as_deref(), Some("v1"));

        let disabled = workflow.disable(&published).await.expect("disable");
        assert!(!disabled.enabled);
        assert_eq!(disabled.approved_revision_id.as_deref(), Some("v1"), "approval is retained");

        assert_eq!(
            workflow.gateway.calls(),
            vec!["request_approval:v1", "approve:50:looks good", "enable:1", "disable:1"],
        );
    }

    #[tokio::test]
    async fn request_approval_is_draft_only() {
        let workflow = RevisionWorkflow::new(ScriptedGateway::default());

        let in_review = revision_fixture(true, Some(pending_request()));
        let error = workflow.request_approval(&in_review).await.unwrap_err();
        assert!(matches!(error, Error::IllegalTransition { action: "request approval", .. }));

        let read_only = revision_fixture(false, None);
        assert!(workflow.request_approval(&read_only).await.is_err());
        assert!(workflow.gateway.calls().is_empty(), "guards must run before any network call");
    }

    #[tokio::test]
    async fn decided_request_refuses_another_decision() {
        let workflow = RevisionWorkflow::new(ScriptedGateway::default());
        let request = workflow.request_approval(&revision_fixture(true, None)).await.unwrap();
        let decided = workflow.approve(&request, "ship it").await.unwrap();

        let error = workflow.approve(&decided, "again").await.unwrap_err();
        assert!(matches!(error, Error::IllegalTransition { state, .. } if state == "approved"));
        let error = workflow.reject(&decided, "changed my mind").await.unwrap_err();
        assert!(matches!(error, Error::IllegalTransition { .. }));
    }

    #[tokio::test]
    async fn reject_with_empty_comment_is_refused_locally() {
        let workflow = RevisionWorkflow::new(ScriptedGateway::default());

        let error = workflow.reject(&pending_request(), "   ").await.unwrap_err();
        assert!(matches!(error, Error::Validation(_)));
        assert!(workflow.gateway.calls().is_empty(), "no network call before validation");
    }

    #[tokio::test]
    async fn cancel_returns_an_in_review_revision_to_draft() {
        let workflow = RevisionWorkflow::new(ScriptedGateway::default());

        let in_review = revision_fixture(true, Some(pending_request()));
        workflow.cancel_approval(&in_review).await.expect("cancel");
        assert_eq!(workflow.gateway.calls(), vec!["close:50"]);

        let draft = revision_fixture(true, None);
        let error = workflow.cancel_approval(&draft).await.unwrap_err();
        assert!(matches!(error, Error::IllegalTransition { state, .. } if state == "draft"));
    }

    #[tokio::test]
    async fn save_guards_read_only_revisions() {
        let workflow = RevisionWorkflow::new(ScriptedGateway::default());
        let values = RecipeValues::default();

        let error = workflow.save(&revision_fixture(false, None), &values).await.unwrap_err();
        assert!(matches!(error, Error::IllegalTransition { action: "save", .. }));

        // Saving over a pending review is allowed; the confirmation is the
        // caller's responsibility and the server guards stale preconditions.
        let in_review = revision_fixture(true, Some(pending_request()));
        assert!(save_discards_review(&in_review));
        workflow.save(&in_review, &values).await.expect("save proceeds");
        assert_eq!(workflow.gateway.calls(), vec!["save:1"]);
    }

    #[tokio::test]
    async fn publish_requires_a_disabled_recipe_with_approval() {
        let workflow = RevisionWorkflow::new(ScriptedGateway::default());

        let enabled = recipe_fixture(1, "v1", true, Some("v1"));
        assert!(matches!(
            workflow.publish(&enabled).await.unwrap_err(),
            Error::IllegalTransition { state, .. } if state == "enabled"
        ));

        let unapproved = recipe_fixture(1, "v1", false, None);
        assert!(matches!(
            workflow.publish(&unapproved).await.unwrap_err(),
            Error::IllegalTransition { state, .. } if state == "unapproved"
        ));

        let disabled = recipe_fixture(1, "v1", false, None);
        assert!(workflow.disable(&disabled).await.is_err());
    }

    #[tokio::test]
    async fn clone_seeds_a_fresh_draft_from_the_source() {
        let workflow = RevisionWorkflow::new(ScriptedGateway::default());
        let source = recipe_fixture(1, "v1", true, Some("v1"));

        let cloned = workflow.clone_recipe(&source).await.expect("clone");
        assert_ne!(cloned.id, source.id);
        assert!(!cloned.enabled);
        assert!(cloned.approved_revision_id.is_none());
        assert_eq!(workflow.gateway.calls(), vec!["create:heartbeat-survey"]);
    }

    #[tokio::test]
    async fn delete_is_legal_from_any_state() {
        let workflow = RevisionWorkflow::new(ScriptedGateway::default());
        workflow.delete(9).await.expect("delete");
        assert_eq!(workflow.gateway.calls(), vec!["delete:9"]);
    }
}
