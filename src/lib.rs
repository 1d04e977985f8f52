//! Classifieds marketplace server
//!
//! REST JSON API for browsing listings, booking paid property visits with a
//! platform/seller fee split, and delivering notifications over in-app,
//! email, SMS and push channels.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
