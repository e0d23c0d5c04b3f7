//! Movie tracking API: a provider-backed catalog, per-user libraries, and
//! ordered watchlists.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
