//! Listing browse and promotion

use std::sync::Arc;

use uuid::Uuid;

use super::{notifications::NotificationsService, templates::NotificationEvent};
use crate::{
    config::PaginationConfig,
    error::AppResult,
    models::{
        listing::{Listing, ListingQuery},
        Page,
    },
    repository::ListingStore,
};

#[derive(Clone)]
pub struct ListingsService {
    store: Arc<dyn ListingStore>,
    notifications: NotificationsService,
    pagination: PaginationConfig,
}

impl ListingsService {
    pub fn new(store: Arc<dyn ListingStore>, notifications: NotificationsService, pagination: PaginationConfig) -> Self {
        Self {
            store,
            notifications,
            pagination,
        }
    }

    pub async fn search(&self, query: &ListingQuery) -> AppResult<(Vec<Listing>, i64)> {
        let page = Page::resolve(
            query.page,
            query.per_page,
            self.pagination.default_per_page,
            self.pagination.max_per_page,
        );
        self.store.search(query, page).await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Listing> {
        self.store.get(id).await
    }

    /// Toggle the featured flag. The seller is notified when a listing
    /// becomes featured.
    pub async fn set_featured(&self, id: Uuid, featured: bool) -> AppResult<Listing> {
        let before = self.store.get(id).await?;
        let listing = self.store.set_featured(id, featured).await?;
        if featured && !before.featured {
            tracing::info!("Listing {} promoted", id);
            self.notifications
                .notify(listing.seller_id, NotificationEvent::PromotionActivated(&listing))
                .await;
        }
        Ok(listing)
    }
}
