use std::sync::Arc;

use crate::db::{LibraryStore, MovieStore, UserStore, WatchlistStore};
use crate::services::providers::MetadataProvider;
use crate::services::{CatalogService, LibraryService, UserService, WatchlistService};

/// Shared application state
///
/// Holds one instance of each service; handlers clone the `Arc`s, never the
/// services themselves.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserService>,
    pub catalog: Arc<CatalogService>,
    pub library: Arc<LibraryService>,
    pub watchlists: Arc<WatchlistService>,
}

impl AppState {
    /// Wires the service graph on top of the given stores and provider
    pub fn new(
        movies: Arc<dyn MovieStore>,
        users: Arc<dyn UserStore>,
        library: Arc<dyn LibraryStore>,
        watchlists: Arc<dyn WatchlistStore>,
        provider: Arc<dyn MetadataProvider>,
    ) -> Self {
        let catalog = Arc::new(CatalogService::new(movies, provider));
        Self {
            users: Arc::new(UserService::new(users.clone())),
            library: Arc::new(LibraryService::new(users.clone(), library, catalog.clone())),
            watchlists: Arc::new(WatchlistService::new(users, watchlists, catalog.clone())),
            catalog,
        }
    }
}
