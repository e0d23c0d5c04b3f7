pub mod catalog;
pub mod library;
pub mod providers;
pub mod users;
pub mod watchlist;

pub use catalog::CatalogService;
pub use library::LibraryService;
pub use users::UserService;
pub use watchlist::WatchlistService;
