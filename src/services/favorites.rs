//! Saved listings

use std::sync::Arc;

use uuid::Uuid;

use super::users::UsersService;
use crate::{
    error::{AppError, AppResult},
    models::listing::Listing,
    repository::{FavoriteStore, ListingStore},
};

#[derive(Clone)]
pub struct FavoritesService {
    store: Arc<dyn FavoriteStore>,
    listings: Arc<dyn ListingStore>,
    users: UsersService,
}

impl FavoritesService {
    pub fn new(store: Arc<dyn FavoriteStore>, listings: Arc<dyn ListingStore>, users: UsersService) -> Self {
        Self { store, listings, users }
    }

    /// Adding twice is not an error
    pub async fn add(&self, user_id: Uuid, listing_id: Uuid) -> AppResult<()> {
        self.users.require(user_id).await?;
        self.listings.get(listing_id).await?;
        self.store.add(user_id, listing_id).await?;
        Ok(())
    }

    pub async fn remove(&self, user_id: Uuid, listing_id: Uuid) -> AppResult<()> {
        if self.store.remove(user_id, listing_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Listing {} is not a favorite", listing_id)))
        }
    }

    pub async fn list(&self, user_id: Uuid) -> AppResult<Vec<Listing>> {
        self.store.list(user_id).await
    }
}
