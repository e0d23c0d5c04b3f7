use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;

use crate::{
    db::{UserStore, WatchlistStore},
    error::{AppError, AppResult},
    models::{
        AddWatchlistItemRequest, CreateWatchlistRequest, NewWatchlist, NewWatchlistItem, Watchlist,
        WatchlistItemResponse, WatchlistResponse,
    },
    services::CatalogService,
};

/// Service for watchlists and their ordered items
///
/// Positions within a list are append-only: a new item lands at one past the
/// highest position ever used, and removals leave gaps. Reordering is the
/// only operation that rewrites positions, and it renumbers from 1.
pub struct WatchlistService {
    users: Arc<dyn UserStore>,
    watchlists: Arc<dyn WatchlistStore>,
    catalog: Arc<CatalogService>,
}

impl WatchlistService {
    pub fn new(
        users: Arc<dyn UserStore>,
        watchlists: Arc<dyn WatchlistStore>,
        catalog: Arc<CatalogService>,
    ) -> Self {
        Self {
            users,
            watchlists,
            catalog,
        }
    }

    pub async fn create(
        &self,
        user_id: i64,
        request: CreateWatchlistRequest,
    ) -> AppResult<WatchlistResponse> {
        if !self.users.exists(user_id).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let watchlist = self
            .watchlists
            .insert(NewWatchlist {
                user_id,
                title: request.title,
                description: request.description,
                created_at: Utc::now(),
            })
            .await?;

        tracing::info!(user_id, watchlist_id = watchlist.id, "Created watchlist");

        Ok(WatchlistResponse::new(watchlist, Vec::new()))
    }

    pub async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<WatchlistResponse>> {
        let watchlists = self.watchlists.list_for_user(user_id).await?;

        let mut responses = Vec::with_capacity(watchlists.len());
        for watchlist in watchlists {
            let items = self.watchlists.items_with_movies(watchlist.id).await?;
            responses.push(WatchlistResponse::new(watchlist, items));
        }
        Ok(responses)
    }

    pub async fn get(&self, watchlist_id: i64) -> AppResult<WatchlistResponse> {
        let watchlist = self.require_watchlist(watchlist_id).await?;
        let items = self.watchlists.items_with_movies(watchlist_id).await?;
        Ok(WatchlistResponse::new(watchlist, items))
    }

    /// Delete a watchlist and everything in it
    pub async fn delete(&self, watchlist_id: i64) -> AppResult<()> {
        if !self.watchlists.delete(watchlist_id).await? {
            return Err(AppError::NotFound("Watchlist not found".to_string()));
        }
        tracing::info!(watchlist_id, "Deleted watchlist");
        Ok(())
    }

    /// Append a movie to the end of a watchlist
    ///
    /// The watchlist must exist before any provider work happens. The new
    /// position is one past the highest position present, so positions freed
    /// by removals are never handed out again.
    pub async fn add_item(
        &self,
        watchlist_id: i64,
        request: AddWatchlistItemRequest,
    ) -> AppResult<WatchlistItemResponse> {
        self.require_watchlist(watchlist_id).await?;

        let movie = self.catalog.resolve_or_import(&request.external_id).await?;

        if self.watchlists.contains_movie(watchlist_id, movie.id).await? {
            return Err(AppError::Conflict(
                "Movie already exists in this watchlist".to_string(),
            ));
        }

        let position = self.watchlists.max_position(watchlist_id).await?.unwrap_or(0) + 1;
        let item = self
            .watchlists
            .insert_item(NewWatchlistItem {
                watchlist_id,
                movie_id: movie.id,
                position,
                added_at: Utc::now(),
            })
            .await?;

        tracing::info!(watchlist_id, item_id = item.id, position, "Added watchlist item");

        Ok(WatchlistItemResponse::new(item, movie))
    }

    /// Remove a single item, leaving the other positions untouched
    pub async fn remove_item(&self, watchlist_id: i64, item_id: i64) -> AppResult<()> {
        if !self.watchlists.delete_item(watchlist_id, item_id).await? {
            return Err(AppError::NotFound("Watchlist item not found".to_string()));
        }
        Ok(())
    }

    /// Rewrite positions to 1..n following the order of `ordered_item_ids`
    ///
    /// Validates every id against one snapshot of the list before writing
    /// anything, so an unknown id rejects the whole call with no positions
    /// changed. Items the caller leaves out keep their old position.
    pub async fn reorder(&self, watchlist_id: i64, ordered_item_ids: &[i64]) -> AppResult<()> {
        self.require_watchlist(watchlist_id).await?;

        let items = self.watchlists.items(watchlist_id).await?;
        let known: HashSet<i64> = items.iter().map(|item| item.id).collect();

        for item_id in ordered_item_ids {
            if !known.contains(item_id) {
                return Err(AppError::NotFound(format!(
                    "Watchlist item not found: {}",
                    item_id
                )));
            }
        }

        for (index, item_id) in ordered_item_ids.iter().enumerate() {
            self.watchlists
                .set_item_position(*item_id, index as i32 + 1)
                .await?;
        }

        tracing::info!(
            watchlist_id,
            items = ordered_item_ids.len(),
            "Reordered watchlist"
        );

        Ok(())
    }

    async fn require_watchlist(&self, watchlist_id: i64) -> AppResult<Watchlist> {
        self.watchlists
            .find(watchlist_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Watchlist not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::CreateUserRequest;
    use crate::services::providers::MockMetadataProvider;
    use crate::services::UserService;
    use serde_json::json;

    struct Fixture {
        users: UserService,
        watchlists: WatchlistService,
    }

    fn scripted_provider(expected_calls: usize) -> MockMetadataProvider {
        let mut provider = MockMetadataProvider::new();
        provider
            .expect_movie_details()
            .times(expected_calls)
            .returning(|external_id| {
                Ok(json!({
                    "id": external_id,
                    "title": format!("Movie {}", external_id)
                }))
            });
        provider.expect_name().return_const("tmdb");
        provider
    }

    fn fixture(provider: MockMetadataProvider) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let catalog = Arc::new(CatalogService::new(store.clone(), Arc::new(provider)));
        Fixture {
            users: UserService::new(store.clone()),
            watchlists: WatchlistService::new(store.clone(), store, catalog),
        }
    }

    async fn seeded_watchlist(fixture: &Fixture) -> i64 {
        let user = fixture
            .users
            .create(CreateUserRequest {
                email: "ada@example.com".to_string(),
                username: "ada".to_string(),
                password: "secret".to_string(),
            })
            .await
            .unwrap();
        fixture
            .watchlists
            .create(
                user.id,
                CreateWatchlistRequest {
                    title: "Favorites".to_string(),
                    description: None,
                },
            )
            .await
            .unwrap()
            .id
    }

    fn add(external_id: &str) -> AddWatchlistItemRequest {
        AddWatchlistItemRequest {
            external_id: external_id.to_string(),
        }
    }

    async fn positions(fixture: &Fixture, watchlist_id: i64) -> Vec<(i64, i32)> {
        fixture
            .watchlists
            .get(watchlist_id)
            .await
            .unwrap()
            .items
            .iter()
            .map(|item| (item.id, item.position))
            .collect()
    }

    #[tokio::test]
    async fn test_first_item_gets_position_one() {
        let fixture = fixture(scripted_provider(1));
        let watchlist_id = seeded_watchlist(&fixture).await;

        let item = fixture
            .watchlists
            .add_item(watchlist_id, add("603"))
            .await
            .unwrap();

        assert_eq!(item.position, 1);
    }

    #[tokio::test]
    async fn test_items_append_after_current_max() {
        let fixture = fixture(scripted_provider(3));
        let watchlist_id = seeded_watchlist(&fixture).await;

        for external_id in ["1", "2", "3"] {
            fixture
                .watchlists
                .add_item(watchlist_id, add(external_id))
                .await
                .unwrap();
        }

        let current = positions(&fixture, watchlist_id).await;
        assert_eq!(
            current.iter().map(|(_, p)| *p).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[tokio::test]
    async fn test_removed_positions_are_never_reused() {
        let fixture = fixture(scripted_provider(4));
        let watchlist_id = seeded_watchlist(&fixture).await;

        let mut items = Vec::new();
        for external_id in ["1", "2", "3"] {
            items.push(
                fixture
                    .watchlists
                    .add_item(watchlist_id, add(external_id))
                    .await
                    .unwrap(),
            );
        }

        // Drop the item at position 2, then append a fourth movie
        fixture
            .watchlists
            .remove_item(watchlist_id, items[1].id)
            .await
            .unwrap();
        let fourth = fixture
            .watchlists
            .add_item(watchlist_id, add("4"))
            .await
            .unwrap();

        assert_eq!(fourth.position, 4);
        let current = positions(&fixture, watchlist_id).await;
        assert_eq!(
            current.iter().map(|(_, p)| *p).collect::<Vec<_>>(),
            vec![1, 3, 4]
        );
    }

    #[tokio::test]
    async fn test_duplicate_movie_conflicts() {
        let fixture = fixture(scripted_provider(1));
        let watchlist_id = seeded_watchlist(&fixture).await;

        fixture
            .watchlists
            .add_item(watchlist_id, add("603"))
            .await
            .unwrap();
        let err = fixture
            .watchlists
            .add_item(watchlist_id, add("603"))
            .await
            .unwrap_err();

        match err {
            AppError::Conflict(message) => {
                assert_eq!(message, "Movie already exists in this watchlist")
            }
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_add_to_unknown_watchlist_skips_import() {
        // times(0): the watchlist check must come before any provider call
        let fixture = fixture(scripted_provider(0));

        let err = fixture
            .watchlists
            .add_item(999, add("603"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_reorder_assigns_input_order() {
        let fixture = fixture(scripted_provider(3));
        let watchlist_id = seeded_watchlist(&fixture).await;

        let mut items = Vec::new();
        for external_id in ["1", "2", "3"] {
            items.push(
                fixture
                    .watchlists
                    .add_item(watchlist_id, add(external_id))
                    .await
                    .unwrap(),
            );
        }

        fixture
            .watchlists
            .reorder(watchlist_id, &[items[2].id, items[0].id, items[1].id])
            .await
            .unwrap();

        let current = positions(&fixture, watchlist_id).await;
        assert_eq!(
            current,
            vec![(items[2].id, 1), (items[0].id, 2), (items[1].id, 3)]
        );
    }

    #[tokio::test]
    async fn test_reorder_with_unknown_id_changes_nothing() {
        let fixture = fixture(scripted_provider(2));
        let watchlist_id = seeded_watchlist(&fixture).await;

        let first = fixture
            .watchlists
            .add_item(watchlist_id, add("1"))
            .await
            .unwrap();
        let second = fixture
            .watchlists
            .add_item(watchlist_id, add("2"))
            .await
            .unwrap();

        let err = fixture
            .watchlists
            .reorder(watchlist_id, &[second.id, 12345, first.id])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        // All-or-nothing: the failed call must not have moved anything
        let current = positions(&fixture, watchlist_id).await;
        assert_eq!(current, vec![(first.id, 1), (second.id, 2)]);
    }

    #[tokio::test]
    async fn test_reorder_subset_leaves_remaining_positions() {
        let fixture = fixture(scripted_provider(3));
        let watchlist_id = seeded_watchlist(&fixture).await;

        let mut items = Vec::new();
        for external_id in ["1", "2", "3"] {
            items.push(
                fixture
                    .watchlists
                    .add_item(watchlist_id, add(external_id))
                    .await
                    .unwrap(),
            );
        }

        // Only reorder the last two; the first keeps position 1
        fixture
            .watchlists
            .reorder(watchlist_id, &[items[2].id, items[1].id])
            .await
            .unwrap();

        let current = positions(&fixture, watchlist_id).await;
        assert!(current.contains(&(items[0].id, 1)));
        assert!(current.contains(&(items[2].id, 1)));
        assert!(current.contains(&(items[1].id, 2)));
    }

    #[tokio::test]
    async fn test_remove_item_from_wrong_list_not_found() {
        let fixture = fixture(scripted_provider(1));
        let watchlist_id = seeded_watchlist(&fixture).await;

        let item = fixture
            .watchlists
            .add_item(watchlist_id, add("603"))
            .await
            .unwrap();

        let err = fixture
            .watchlists
            .remove_item(watchlist_id + 1, item.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_watchlist_removes_items() {
        let fixture = fixture(scripted_provider(1));
        let watchlist_id = seeded_watchlist(&fixture).await;

        fixture
            .watchlists
            .add_item(watchlist_id, add("603"))
            .await
            .unwrap();

        fixture.watchlists.delete(watchlist_id).await.unwrap();

        let err = fixture.watchlists.get(watchlist_id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = fixture.watchlists.delete(watchlist_id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_for_unknown_user_not_found() {
        let fixture = fixture(scripted_provider(0));

        let err = fixture
            .watchlists
            .create(
                999,
                CreateWatchlistRequest {
                    title: "Favorites".to_string(),
                    description: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_for_user_embeds_items() {
        let fixture = fixture(scripted_provider(1));
        let watchlist_id = seeded_watchlist(&fixture).await;
        fixture
            .watchlists
            .add_item(watchlist_id, add("603"))
            .await
            .unwrap();

        let user_lists = fixture.watchlists.list_for_user(1).await.unwrap();
        assert_eq!(user_lists.len(), 1);
        assert_eq!(user_lists[0].items.len(), 1);
        assert_eq!(user_lists[0].items[0].movie.title, "Movie 603");
    }
}
