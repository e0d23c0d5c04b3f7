pub mod library;
pub mod movie;
pub mod user;
pub mod watchlist;

pub use library::{
    AddLibraryEntryRequest, LibraryEntry, LibraryEntryResponse, NewLibraryEntry,
    UpdateLikedRequest, UpdateRatingRequest, UpdateStatusRequest, WatchStatus,
};
pub use movie::{Movie, MovieSearchItem, NewMovie};
pub use user::{CreateUserRequest, NewUser, User};
pub use watchlist::{
    AddWatchlistItemRequest, CreateWatchlistRequest, NewWatchlist, NewWatchlistItem,
    ReorderItemsRequest, Watchlist, WatchlistItem, WatchlistItemResponse, WatchlistResponse,
};
