pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::MemoryStore;
pub use postgres::{create_pool, PgStore};
pub use store::{LibraryStore, MovieStore, UserStore, WatchlistStore};
