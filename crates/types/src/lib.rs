use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value};

/// Default listing sort used when the caller does not specify one.
pub const DEFAULT_ORDERING: &str = "-last_updated";

/// A remotely-configured behavior managed through the console.
///
/// Recipes are edited indirectly: every save produces a new [`Revision`], and
/// a recipe only runs once one of its revisions has been approved and
/// published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: u64,
    pub name: String,
    /// Name of the action this recipe triggers (e.g., "show-heartbeat")
    #[serde(default)]
    pub action: String,
    /// Targeting expression evaluated client-side before the action runs
    #[serde(default)]
    pub filter_expression: String,
    /// Action-specific payload, opaque to the console
    #[serde(default)]
    pub arguments: Value,
    /// Whether the recipe is currently live
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    /// Revision currently published, if any
    #[serde(default)]
    pub approved_revision_id: Option<String>,
    /// Most recent revision; the only one that accepts further edits
    pub latest_revision_id: String,
}

impl Recipe {
    /// A recipe may be published when it is disabled and has an approved
    /// revision to publish.
    pub fn may_publish(&self) -> bool {
        !self.enabled && self.approved_revision_id.is_some()
    }

    /// A recipe may be disabled only while it is live.
    pub fn may_disable(&self) -> bool {
        self.enabled
    }
}

/// An immutable snapshot of a recipe's configuration.
///
/// Revisions are content-addressed by the server; the client never fabricates
/// them. Exactly one revision per recipe has `is_latest` set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    /// Content-addressed hash identifier
    pub id: String,
    pub recipe_id: u64,
    #[serde(default)]
    pub is_latest: bool,
    #[serde(default)]
    pub is_archived: bool,
    /// Set when this revision was produced by cloning another
    #[serde(default)]
    pub created_from_revision_id: Option<String>,
    /// Live approval request attached to this revision, if any. The server
    /// embeds the full record in revision payloads.
    #[serde(default)]
    pub approval_request: Option<ApprovalRequest>,
}

impl Revision {
    /// Only the latest revision accepts edits; everything older is read-only.
    pub fn editable(&self) -> bool {
        self.is_latest
    }

    /// True while an approval request exists and has not been decided.
    pub fn pending_review(&self) -> bool {
        matches!(&self.approval_request, Some(request) if request.is_pending())
    }

    /// Short display form of the content hash (original console shows 7 chars).
    pub fn short_id(&self) -> &str {
        let end = self.id.char_indices().nth(7).map_or(self.id.len(), |(i, _)| i);
        &self.id[..end]
    }
}

/// A review record attached to a revision.
///
/// `approved` is tri-state: `None` while the review is open, then `Some(true)`
/// or `Some(false)` once a reviewer decides. `approver_email` is stamped by
/// the server at decision time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub id: u64,
    pub revision_id: String,
    #[serde(default)]
    pub approved: Option<bool>,
    #[serde(default)]
    pub approver_email: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl ApprovalRequest {
    pub fn is_pending(&self) -> bool {
        self.approved.is_none()
    }
}

/// Paginated listing envelope returned by collection endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
}

impl<T> Default for Paginated<T> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            count: 0,
            next: None,
            previous: None,
        }
    }
}

/// One page of the recipe listing.
pub type RecipePage = Paginated<Recipe>;

/// Query parameters accepted by the recipe listing endpoint.
///
/// Unset fields are omitted from the request entirely rather than sent as
/// empty values, so two queries that differ only in unset fields produce the
/// same parameter map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingQuery {
    pub page: Option<u32>,
    pub ordering: Option<String>,
    pub text: Option<String>,
    pub status: Option<String>,
}

impl ListingQuery {
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn ordering(mut self, ordering: impl Into<String>) -> Self {
        self.ordering = Some(ordering.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Materialize the set fields as a JSON parameter map, skipping unset ones.
    pub fn to_params(&self) -> JsonMap<String, Value> {
        let mut params = JsonMap::new();
        if let Some(page) = self.page {
            params.insert("page".into(), Value::from(page));
        }
        if let Some(ordering) = &self.ordering {
            params.insert("ordering".into(), Value::from(ordering.clone()));
        }
        if let Some(text) = &self.text {
            params.insert("text".into(), Value::from(text.clone()));
        }
        if let Some(status) = &self.status {
            params.insert("status".into(), Value::from(status.clone()));
        }
        params
    }
}

/// Editable recipe fields submitted on create, save, and clone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeValues {
    pub name: String,
    pub action: String,
    #[serde(default)]
    pub filter_expression: String,
    #[serde(default)]
    pub arguments: Value,
}

impl RecipeValues {
    /// Seed values from an existing recipe, used by the clone flow.
    pub fn from_recipe(recipe: &Recipe) -> Self {
        Self {
            name: recipe.name.clone(),
            action: recipe.action.clone(),
            filter_expression: recipe.filter_expression.clone(),
            arguments: recipe.arguments.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn recipe_deserializes_with_defaults() {
        let json = r#"{
            "id": 42,
            "name": "console-log-test",
            "latest_revision_id": "abc123def456"
        }"#;

        let recipe: Recipe = serde_json::from_str(json).expect("deserialize Recipe");
        assert_eq!(recipe.id, 42);
        assert_eq!(recipe.action, "");
        assert!(!recipe.enabled);
        assert!(recipe.approved_revision_id.is_none());
        assert!(recipe.last_updated.is_none());
    }

    #[test]
    fn revision_embeds_approval_request() {
        let json = json!({
            "id": "deadbeefcafe",
            "recipe_id": 7,
            "is_latest": true,
            "approval_request": {
                "id": 3,
                "revision_id": "deadbeefcafe",
                "approved": null,
                "comment": null
            }
        });

        let revision: Revision = serde_json::from_value(json).expect("deserialize Revision");
        assert!(revision.editable());
        assert!(revision.pending_review());
        assert_eq!(revision.short_id(), "deadbee");
    }

    #[test]
    fn decided_request_is_not_pending() {
        let request = ApprovalRequest {
            id: 1,
            revision_id: "aaa".into(),
            approved: Some(false),
            approver_email: Some("x@example.com".into()),
            comment: Some("needs work".into()),
        };
        assert!(!request.is_pending());
    }

    #[test]
    fn publish_requires_approved_revision_and_disabled_state() {
        let mut recipe: Recipe = serde_json::from_value(json!({
            "id": 1,
            "name": "r",
            "latest_revision_id": "v1",
            "approved_revision_id": "v1",
            "enabled": false
        }))
        .unwrap();
        assert!(recipe.may_publish());
        assert!(!recipe.may_disable());

        recipe.enabled = true;
        assert!(!recipe.may_publish());
        assert!(recipe.may_disable());

        recipe.enabled = false;
        recipe.approved_revision_id = None;
        assert!(!recipe.may_publish());
    }

    #[test]
    fn listing_query_skips_unset_fields() {
        let params = ListingQuery::default().page(2).ordering(DEFAULT_ORDERING).to_params();
        assert_eq!(params.len(), 2);
        assert_eq!(params["page"], json!(2));
        assert_eq!(params["ordering"], json!("-last_updated"));
        assert!(!params.contains_key("text"));
        assert!(!params.contains_key("status"));
    }

    #[test]
    fn paginated_tolerates_missing_fields() {
        let page: RecipePage = serde_json::from_str("{}").expect("deserialize empty page");
        assert!(page.results.is_empty());
        assert_eq!(page.count, 0);
    }
}
