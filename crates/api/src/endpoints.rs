//! Typed endpoint methods for the recipe console API.
//!
//! One method per REST operation. Read endpoints return decoded domain
//! entities; mutating endpoints go through POST/PATCH/DELETE with the
//! anti-forgery token applied by [`ConsoleClient::request`]. Revisions are
//! created server-side by `PATCH /recipe/{id}/`; the client never fabricates
//! revision or approval-request records.

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use galley_types::{ApprovalRequest, ListingQuery, Recipe, RecipePage, RecipeValues, Revision};

use crate::{ConsoleClient, Error, query_pairs};

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    serde_json::from_value(value).map_err(|error| Error::Transport(format!("malformed response body: {error}")))
}

impl ConsoleClient {
    /// `GET /recipe/` — paginated recipe listing.
    pub async fn list_recipes(&self, query: &ListingQuery) -> Result<RecipePage, Error> {
        let params = query.to_params();
        debug!(param_count = params.len(), "listing recipes");
        let builder = self.request(Method::GET, "/recipe/").query(&query_pairs(&params));
        decode(self.execute(builder).await?)
    }

    /// `GET /recipe/{id}/`
    pub async fn fetch_recipe(&self, recipe_id: u64) -> Result<Recipe, Error> {
        let value = self.execute(self.request(Method::GET, &format!("/recipe/{recipe_id}/"))).await?;
        decode(value)
    }

    /// `GET /recipe_revision/{id}/`
    pub async fn fetch_revision(&self, revision_id: &str) -> Result<Revision, Error> {
        let value = self
            .execute(self.request(Method::GET, &format!("/recipe_revision/{revision_id}/")))
            .await?;
        decode(value)
    }

    /// `GET /recipe/{id}/history/` — revisions ordered newest first.
    pub async fn fetch_history(&self, recipe_id: u64) -> Result<Vec<Revision>, Error> {
        let value = self
            .execute(self.request(Method::GET, &format!("/recipe/{recipe_id}/history/")))
            .await?;
        decode(value)
    }

    /// `POST /recipe/` — create a recipe with an initial draft revision.
    pub async fn create_recipe(&self, values: &RecipeValues) -> Result<Recipe, Error> {
        let builder = self.request(Method::POST, "/recipe/").json(values);
        decode(self.execute(builder).await?)
    }

    /// `PATCH /recipe/{id}/` — save edits, producing a new latest revision.
    pub async fn save_recipe(&self, recipe_id: u64, values: &RecipeValues) -> Result<Recipe, Error> {
        let builder = self.request(Method::PATCH, &format!("/recipe/{recipe_id}/")).json(values);
        decode(self.execute(builder).await?)
    }

    /// `DELETE /recipe/{id}/` — remove the recipe and all of its revisions.
    pub async fn delete_recipe(&self, recipe_id: u64) -> Result<(), Error> {
        self.execute(self.request(Method::DELETE, &format!("/recipe/{recipe_id}/"))).await?;
        Ok(())
    }

    /// `POST /recipe/{id}/enable/` — publish the approved revision.
    pub async fn enable_recipe(&self, recipe_id: u64) -> Result<Recipe, Error> {
        let value = self
            .execute(self.request(Method::POST, &format!("/recipe/{recipe_id}/enable/")))
            .await?;
        decode(value)
    }

    /// `POST /recipe/{id}/disable/` — take the recipe offline, keeping the approval.
    pub async fn disable_recipe(&self, recipe_id: u64) -> Result<Recipe, Error> {
        let value = self
            .execute(self.request(Method::POST, &format!("/recipe/{recipe_id}/disable/")))
            .await?;
        decode(value)
    }

    /// `POST /recipe_revision/{id}/request_approval/`
    pub async fn request_approval(&self, revision_id: &str) -> Result<ApprovalRequest, Error> {
        let value = self
            .execute(self.request(Method::POST, &format!("/recipe_revision/{revision_id}/request_approval/")))
            .await?;
        decode(value)
    }

    /// `POST /approval_request/{id}/close/` — cancel a pending review.
    pub async fn close_approval(&self, request_id: u64) -> Result<(), Error> {
        self.execute(self.request(Method::POST, &format!("/approval_request/{request_id}/close/")))
            .await?;
        Ok(())
    }

    /// `POST /approval_request/{id}/approve/` with `{comment}`.
    pub async fn approve(&self, request_id: u64, comment: &str) -> Result<ApprovalRequest, Error> {
        let builder = self
            .request(Method::POST, &format!("/approval_request/{request_id}/approve/"))
            .json(&json!({ "comment": comment }));
        decode(self.execute(builder).await?)
    }

    /// `POST /approval_request/{id}/reject/` with `{comment}`.
    pub async fn reject(&self, request_id: u64, comment: &str) -> Result<ApprovalRequest, Error> {
        let builder = self
            .request(Method::POST, &format!("/approval_request/{request_id}/reject/"))
            .json(&json!({ "comment": comment }));
        decode(self.execute(builder).await?)
    }
}
