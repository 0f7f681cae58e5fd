//! Canned request descriptors for the console endpoints.
//!
//! Pages declare their data needs by composing these in a binding function;
//! the binder and engine take care of dispatch, deduplication, and refresh.

use galley_types::ListingQuery;

use crate::descriptor::RequestDescriptor;

/// Paginated recipe listing, fingerprinted by the set query fields.
pub fn recipe_listing(query: &ListingQuery) -> RequestDescriptor {
    RequestDescriptor::new("recipes", "/recipe/").with_params(query.to_params())
}

pub fn recipe(recipe_id: u64) -> RequestDescriptor {
    RequestDescriptor::new("recipe", format!("/recipe/{recipe_id}/"))
}

pub fn revision(revision_id: &str) -> RequestDescriptor {
    RequestDescriptor::new("revision", format!("/recipe_revision/{revision_id}/"))
}

/// Revision history for a recipe, ordered newest first.
pub fn recipe_history(recipe_id: u64) -> RequestDescriptor {
    RequestDescriptor::new("history", format!("/recipe/{recipe_id}/history/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_descriptor_fingerprints_by_query() {
        let page_two = recipe_listing(&ListingQuery::default().page(2).ordering("-last_updated"));
        let searched = recipe_listing(&ListingQuery::default().page(2).ordering("-last_updated").text("beta"));
        assert_ne!(page_two.fingerprint(), searched.fingerprint());

        let same = recipe_listing(&ListingQuery::default().page(2).ordering("-last_updated"));
        assert_eq!(page_two.fingerprint(), same.fingerprint());
    }

    #[test]
    fn entity_descriptors_embed_their_identifiers() {
        assert_eq!(recipe(3).url, "/recipe/3/");
        assert_eq!(revision("abc123").url, "/recipe_revision/abc123/");
        assert_eq!(recipe_history(3).url, "/recipe/3/history/");
    }
}
