pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod scrape;
pub mod services;
pub mod store;

use std::sync::Arc;

use config::Config;
use services::{menu::MenuService, ratings::RatingsService};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub menu: Arc<MenuService>,
    pub ratings: Arc<RatingsService>,
    pub config: Arc<Config>,
}
