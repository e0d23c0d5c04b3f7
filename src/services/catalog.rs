use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::{
    db::MovieStore,
    error::{AppError, AppResult},
    models::{Movie, MovieSearchItem, NewMovie},
    services::providers::MetadataProvider,
};

/// The provider returns poster images as relative paths; full URLs are built
/// against this base.
const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

/// Service for provider search and the local movie catalog
///
/// The catalog is a write-once cache keyed by the provider's external ID:
/// once a movie has been imported it is served locally and the provider is
/// never asked about it again.
pub struct CatalogService {
    movies: Arc<dyn MovieStore>,
    provider: Arc<dyn MetadataProvider>,
}

impl CatalogService {
    pub fn new(movies: Arc<dyn MovieStore>, provider: Arc<dyn MetadataProvider>) -> Self {
        Self { movies, provider }
    }

    /// Search the provider and map up to `size` results
    ///
    /// Truncation happens on the raw result list, before mapping; rows the
    /// mapper rejects are dropped rather than failing the whole search. A
    /// response without a `results` array yields an empty list.
    pub async fn search(
        &self,
        query: &str,
        year: Option<i32>,
        page: u32,
        size: usize,
    ) -> AppResult<Vec<MovieSearchItem>> {
        let payload = self.provider.search_movies(query, year, page).await?;

        let rows = match payload.get("results").and_then(Value::as_array) {
            Some(rows) => rows,
            None => return Ok(Vec::new()),
        };

        let items: Vec<MovieSearchItem> = rows.iter().take(size).filter_map(map_search_row).collect();

        tracing::info!(
            query = %query,
            results = items.len(),
            provider = self.provider.name(),
            "Movie search completed"
        );

        Ok(items)
    }

    /// Return the catalog row for an external ID, importing it on first sight
    ///
    /// A concurrent import of the same movie can win the insert; that shows up
    /// as a conflict, and the answer is to re-read and return the winning row
    /// instead of surfacing the duplicate-key failure.
    pub async fn resolve_or_import(&self, external_id: &str) -> AppResult<Movie> {
        if let Some(existing) = self.movies.find_by_external_id(external_id).await? {
            return Ok(existing);
        }

        let details = self.provider.movie_details(external_id).await?;
        let new_movie = map_movie_details(external_id, &details, Utc::now());

        match self.movies.insert(new_movie).await {
            Ok(movie) => {
                tracing::info!(
                    external_id = %external_id,
                    movie_id = movie.id,
                    provider = self.provider.name(),
                    "Imported movie"
                );
                Ok(movie)
            }
            Err(AppError::Conflict(_)) => self
                .movies
                .find_by_external_id(external_id)
                .await?
                .ok_or_else(|| {
                    AppError::Internal(format!(
                        "Movie {} conflicted on import but cannot be found",
                        external_id
                    ))
                }),
            Err(e) => Err(e),
        }
    }

    pub async fn get_movie(&self, id: i64) -> AppResult<Movie> {
        self.movies
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Movie not found".to_string()))
    }
}

/// Map one raw search result; None means the row is unusable
///
/// A row needs an ID to be worth returning. Everything else degrades: missing
/// title and overview become empty strings, unparseable dates drop the year.
fn map_search_row(row: &Value) -> Option<MovieSearchItem> {
    let external_id = external_id_from(row.get("id")?)?;

    Some(MovieSearchItem {
        external_id,
        title: text_field(row, "title"),
        release_year: parse_release_year(row.get("release_date").and_then(Value::as_str)),
        poster_url: build_poster_url(row.get("poster_path").and_then(Value::as_str)),
        overview: text_field(row, "overview"),
    })
}

fn map_movie_details(external_id: &str, details: &Value, now: DateTime<Utc>) -> NewMovie {
    NewMovie {
        external_id: external_id.to_string(),
        title: text_field(details, "title"),
        release_year: parse_release_year(details.get("release_date").and_then(Value::as_str)),
        runtime_minutes: details
            .get("runtime")
            .and_then(Value::as_i64)
            .map(|minutes| minutes as i32),
        poster_url: build_poster_url(details.get("poster_path").and_then(Value::as_str)),
        overview: Some(text_field(details, "overview")),
        created_at: now,
    }
}

/// The provider sends numeric IDs; stored and compared as text
fn external_id_from(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn text_field(record: &Value, key: &str) -> String {
    record
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Extract the year from a `YYYY-MM-DD` release date
///
/// Anything without four leading digits is treated as no year at all.
fn parse_release_year(release_date: Option<&str>) -> Option<i32> {
    release_date
        .and_then(|date| date.get(..4))
        .and_then(|year| year.parse().ok())
}

fn build_poster_url(poster_path: Option<&str>) -> Option<String> {
    poster_path.map(|path| format!("{}{}", POSTER_BASE_URL, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::MockMovieStore;
    use crate::db::MemoryStore;
    use crate::services::providers::MockMetadataProvider;
    use serde_json::json;

    fn movie_row(id: i64, external_id: &str) -> Movie {
        Movie {
            id,
            external_id: external_id.to_string(),
            title: "The Matrix".to_string(),
            release_year: Some(1999),
            runtime_minutes: Some(136),
            poster_url: None,
            overview: Some(String::new()),
            created_at: Utc::now(),
        }
    }

    fn search_payload(count: usize) -> Value {
        let rows: Vec<Value> = (0..count)
            .map(|i| {
                json!({
                    "id": 100 + i,
                    "title": format!("Movie {}", i),
                    "overview": "An overview",
                    "release_date": "2020-05-13",
                    "poster_path": format!("/poster{}.jpg", i)
                })
            })
            .collect();
        json!({ "results": rows })
    }

    fn catalog_with(provider: MockMetadataProvider, movies: MockMovieStore) -> CatalogService {
        CatalogService::new(Arc::new(movies), Arc::new(provider))
    }

    #[test]
    fn test_parse_release_year() {
        assert_eq!(parse_release_year(Some("2020-05-13")), Some(2020));
        assert_eq!(parse_release_year(Some("1999")), Some(1999));
        assert_eq!(parse_release_year(Some("bad")), None);
        assert_eq!(parse_release_year(Some("20xx-01-01")), None);
        assert_eq!(parse_release_year(Some("")), None);
        assert_eq!(parse_release_year(None), None);
    }

    #[test]
    fn test_build_poster_url() {
        assert_eq!(
            build_poster_url(Some("/abc.jpg")),
            Some("https://image.tmdb.org/t/p/w500/abc.jpg".to_string())
        );
        assert_eq!(build_poster_url(None), None);
    }

    #[test]
    fn test_map_search_row_full() {
        let row = json!({
            "id": 603,
            "title": "The Matrix",
            "overview": "A hacker learns the truth",
            "release_date": "1999-03-31",
            "poster_path": "/matrix.jpg"
        });

        let item = map_search_row(&row).unwrap();
        assert_eq!(item.external_id, "603");
        assert_eq!(item.title, "The Matrix");
        assert_eq!(item.release_year, Some(1999));
        assert_eq!(
            item.poster_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/matrix.jpg")
        );
        assert_eq!(item.overview, "A hacker learns the truth");
    }

    #[test]
    fn test_map_search_row_defaults() {
        let row = json!({ "id": 603 });

        let item = map_search_row(&row).unwrap();
        assert_eq!(item.title, "");
        assert_eq!(item.overview, "");
        assert_eq!(item.release_year, None);
        assert_eq!(item.poster_url, None);
    }

    #[test]
    fn test_map_search_row_without_id_is_rejected() {
        assert!(map_search_row(&json!({ "title": "No ID" })).is_none());
        assert!(map_search_row(&json!({ "id": null, "title": "Null ID" })).is_none());
    }

    #[test]
    fn test_map_movie_details_ignores_non_numeric_runtime() {
        let details = json!({ "title": "The Matrix", "runtime": "long" });
        let movie = map_movie_details("603", &details, Utc::now());
        assert_eq!(movie.runtime_minutes, None);

        let details = json!({ "title": "The Matrix", "runtime": 136 });
        let movie = map_movie_details("603", &details, Utc::now());
        assert_eq!(movie.runtime_minutes, Some(136));
    }

    #[tokio::test]
    async fn test_search_truncates_to_requested_size() {
        let mut provider = MockMetadataProvider::new();
        provider
            .expect_search_movies()
            .times(1)
            .returning(|_, _, _| Ok(search_payload(12)));
        provider.expect_name().return_const("tmdb");

        let catalog = catalog_with(provider, MockMovieStore::new());
        let results = catalog.search("matrix", None, 1, 5).await.unwrap();

        assert_eq!(results.len(), 5);
        assert_eq!(results[0].title, "Movie 0");
        assert_eq!(results[4].title, "Movie 4");
    }

    #[tokio::test]
    async fn test_search_returns_fewer_when_provider_has_fewer() {
        let mut provider = MockMetadataProvider::new();
        provider
            .expect_search_movies()
            .times(1)
            .returning(|_, _, _| Ok(search_payload(3)));
        provider.expect_name().return_const("tmdb");

        let catalog = catalog_with(provider, MockMovieStore::new());
        let results = catalog.search("matrix", None, 1, 10).await.unwrap();

        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_search_without_results_array_is_empty() {
        let mut provider = MockMetadataProvider::new();
        provider
            .expect_search_movies()
            .times(1)
            .returning(|_, _, _| Ok(json!({ "page": 1 })));

        let catalog = catalog_with(provider, MockMovieStore::new());
        let results = catalog.search("matrix", None, 1, 10).await.unwrap();

        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_search_skips_malformed_rows() {
        let mut provider = MockMetadataProvider::new();
        provider.expect_search_movies().times(1).returning(|_, _, _| {
            Ok(json!({
                "results": [
                    { "id": 1, "title": "Kept" },
                    { "title": "No ID, dropped" },
                    { "id": 2, "title": "Also kept", "release_date": "not-a-date" }
                ]
            }))
        });
        provider.expect_name().return_const("tmdb");

        let catalog = catalog_with(provider, MockMovieStore::new());
        let results = catalog.search("matrix", None, 1, 10).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Kept");
        assert_eq!(results[1].title, "Also kept");
        assert_eq!(results[1].release_year, None);
    }

    #[tokio::test]
    async fn test_search_forwards_year_and_page() {
        let mut provider = MockMetadataProvider::new();
        provider
            .expect_search_movies()
            .withf(|query, year, page| query == "matrix" && *year == Some(1999) && *page == 3)
            .times(1)
            .returning(|_, _, _| Ok(search_payload(1)));
        provider.expect_name().return_const("tmdb");

        let catalog = catalog_with(provider, MockMovieStore::new());
        catalog.search("matrix", Some(1999), 3, 10).await.unwrap();
    }

    #[tokio::test]
    async fn test_import_maps_details() {
        let mut provider = MockMetadataProvider::new();
        provider
            .expect_movie_details()
            .withf(|external_id| external_id == "603")
            .times(1)
            .returning(|_| {
                Ok(json!({
                    "id": 603,
                    "title": "The Matrix",
                    "overview": "A hacker learns the truth",
                    "release_date": "1999-03-31",
                    "runtime": 136,
                    "poster_path": "/matrix.jpg"
                }))
            });
        provider.expect_name().return_const("tmdb");

        let catalog =
            CatalogService::new(Arc::new(MemoryStore::new()), Arc::new(provider));
        let movie = catalog.resolve_or_import("603").await.unwrap();

        assert_eq!(movie.external_id, "603");
        assert_eq!(movie.title, "The Matrix");
        assert_eq!(movie.release_year, Some(1999));
        assert_eq!(movie.runtime_minutes, Some(136));
        assert_eq!(
            movie.poster_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/matrix.jpg")
        );
    }

    #[tokio::test]
    async fn test_import_is_idempotent() {
        let mut provider = MockMetadataProvider::new();
        // A second import of the same ID must be served from the catalog
        provider
            .expect_movie_details()
            .times(1)
            .returning(|_| Ok(json!({ "id": 603, "title": "The Matrix" })));
        provider.expect_name().return_const("tmdb");

        let catalog =
            CatalogService::new(Arc::new(MemoryStore::new()), Arc::new(provider));

        let first = catalog.resolve_or_import("603").await.unwrap();
        let second = catalog.resolve_or_import("603").await.unwrap();

        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_import_race_returns_winning_row() {
        let mut movies = MockMovieStore::new();
        let mut lookups = mockall::Sequence::new();
        movies
            .expect_find_by_external_id()
            .times(1)
            .in_sequence(&mut lookups)
            .returning(|_| Ok(None));
        movies
            .expect_insert()
            .times(1)
            .returning(|_| Err(AppError::Conflict("Movie already imported".to_string())));
        movies
            .expect_find_by_external_id()
            .times(1)
            .in_sequence(&mut lookups)
            .returning(|_| Ok(Some(movie_row(41, "603"))));

        let mut provider = MockMetadataProvider::new();
        provider
            .expect_movie_details()
            .times(1)
            .returning(|_| Ok(json!({ "id": 603, "title": "The Matrix" })));

        let catalog = catalog_with(provider, movies);
        let movie = catalog.resolve_or_import("603").await.unwrap();

        assert_eq!(movie.id, 41);
    }

    #[tokio::test]
    async fn test_import_race_without_winner_is_internal_error() {
        let mut movies = MockMovieStore::new();
        movies
            .expect_find_by_external_id()
            .times(2)
            .returning(|_| Ok(None));
        movies
            .expect_insert()
            .times(1)
            .returning(|_| Err(AppError::Conflict("Movie already imported".to_string())));

        let mut provider = MockMetadataProvider::new();
        provider
            .expect_movie_details()
            .times(1)
            .returning(|_| Ok(json!({ "id": 603 })));

        let catalog = catalog_with(provider, movies);
        let err = catalog.resolve_or_import("603").await.unwrap_err();

        assert!(matches!(err, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn test_cached_movie_skips_provider() {
        let mut movies = MockMovieStore::new();
        movies
            .expect_find_by_external_id()
            .times(1)
            .returning(|_| Ok(Some(movie_row(7, "603"))));

        // No expectations on the provider: any call panics the test
        let provider = MockMetadataProvider::new();

        let catalog = catalog_with(provider, movies);
        let movie = catalog.resolve_or_import("603").await.unwrap();

        assert_eq!(movie.id, 7);
    }

    #[tokio::test]
    async fn test_get_movie_not_found() {
        let mut movies = MockMovieStore::new();
        movies.expect_find().times(1).returning(|_| Ok(None));

        let catalog = catalog_with(MockMetadataProvider::new(), movies);
        let err = catalog.get_movie(99).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }
}
