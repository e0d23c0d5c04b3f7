//! Movie metadata provider abstraction
//!
//! A pluggable boundary for external movie metadata sources. Providers
//! return raw JSON payloads; all field mapping and tolerance rules live in
//! the catalog service, so a provider only has to know how to reach its API.

use crate::error::AppResult;

pub mod tmdb;

/// Trait for movie metadata providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Search for movies by title
    ///
    /// `page` is forwarded to the provider verbatim; `year` narrows the search
    /// when given. Returns the provider's raw response envelope.
    async fn search_movies(
        &self,
        query: &str,
        year: Option<i32>,
        page: u32,
    ) -> AppResult<serde_json::Value>;

    /// Fetch the full record for one movie by the provider's ID
    async fn movie_details(&self, external_id: &str) -> AppResult<serde_json::Value>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
