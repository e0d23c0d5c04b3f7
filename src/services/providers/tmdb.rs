//! TMDB API provider
//!
//! Thin client over two endpoints:
//! 1. Search: GET /search/movie?query=...
//! 2. Details: GET /movie/{id}
//!
//! Responses are returned as raw JSON; the catalog service owns the mapping.

use reqwest::Client as HttpClient;
use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    services::providers::MetadataProvider,
};

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl TmdbProvider {
    pub fn new(api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
        }
    }

    fn search_params(&self, query: &str, year: Option<i32>, page: u32) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("api_key", self.api_key.clone()),
            ("query", query.to_string()),
            ("page", page.to_string()),
        ];
        if let Some(year) = year {
            params.push(("year", year.to_string()));
        }
        params
    }
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbProvider {
    async fn search_movies(&self, query: &str, year: Option<i32>, page: u32) -> AppResult<Value> {
        let url = format!("{}/search/movie", self.api_url);

        let response = self
            .http_client
            .get(&url)
            .query(&self.search_params(query, year, page))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        let payload: Value = response.json().await?;

        tracing::info!(
            query = %query,
            page = page,
            provider = "tmdb",
            "Movie search completed"
        );

        Ok(payload)
    }

    async fn movie_details(&self, external_id: &str) -> AppResult<Value> {
        let url = format!("{}/movie/{}", self.api_url, external_id);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        let payload: Value = response.json().await?;

        tracing::info!(
            external_id = %external_id,
            provider = "tmdb",
            "Movie details fetched"
        );

        Ok(payload)
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
