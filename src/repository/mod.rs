//! Repository layer for database operations
//!
//! Each concern is exposed as a store trait so services can run against
//! PostgreSQL in production and against an in-memory store in tests.

pub mod favorites;
pub mod inquiries;
pub mod listings;
#[cfg(test)]
pub mod memory;
pub mod notifications;
pub mod payment_methods;
pub mod users;
pub mod visits;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        inquiry::Inquiry,
        listing::{Listing, ListingQuery},
        notification::{
            ChannelDelivery, NewNotification, Notification, NotificationPreferences, NotificationQuery,
            NotificationStatus,
        },
        payment_method::{PaymentMethod, UpsertPaymentMethod},
        user::UserProfile,
        visit::{NewVisitRequest, VisitFilter, VisitRequest, VisitStatusTotals, VisitTransition},
        Page,
    },
};

#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Fails with `NotFound` when the listing does not exist
    async fn get(&self, id: Uuid) -> AppResult<Listing>;
    async fn search(&self, query: &ListingQuery, page: Page) -> AppResult<(Vec<Listing>, i64)>;
    async fn set_featured(&self, id: Uuid, featured: bool) -> AppResult<Listing>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, id: Uuid) -> AppResult<Option<UserProfile>>;
}

#[async_trait]
pub trait VisitStore: Send + Sync {
    async fn insert(&self, visit: NewVisitRequest) -> AppResult<VisitRequest>;
    /// Fails with `NotFound` when the request does not exist
    async fn get(&self, id: Uuid) -> AppResult<VisitRequest>;
    async fn find_by_idempotency_key(&self, buyer_id: Uuid, key: &str) -> AppResult<Option<VisitRequest>>;
    async fn list(&self, filter: &VisitFilter, page: Page) -> AppResult<(Vec<VisitRequest>, i64)>;
    /// Apply the transition only if the row is still in `change.from`.
    /// Returns None when no row matched.
    async fn transition(&self, id: Uuid, change: &VisitTransition) -> AppResult<Option<VisitRequest>>;
    async fn totals_by_status(&self) -> AppResult<Vec<VisitStatusTotals>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert(&self, id: Uuid, notification: NewNotification, created_at: DateTime<Utc>) -> AppResult<Notification>;
    async fn record_dispatch(
        &self,
        id: Uuid,
        status: NotificationStatus,
        deliveries: &[ChannelDelivery],
        sent_at: DateTime<Utc>,
    ) -> AppResult<Notification>;
    async fn list(&self, user_id: Uuid, query: &NotificationQuery, page: Page) -> AppResult<(Vec<Notification>, i64)>;
    async fn unread_count(&self, user_id: Uuid) -> AppResult<i64>;
    /// Returns false when the notification does not belong to the user
    async fn mark_read(&self, user_id: Uuid, id: Uuid, at: DateTime<Utc>) -> AppResult<bool>;
    async fn mark_all_read(&self, user_id: Uuid, at: DateTime<Utc>) -> AppResult<u64>;
    /// Returns false when the notification does not belong to the user
    async fn delete(&self, user_id: Uuid, id: Uuid) -> AppResult<bool>;
    async fn preferences(&self, user_id: Uuid) -> AppResult<Option<NotificationPreferences>>;
    async fn save_preferences(&self, preferences: &NotificationPreferences) -> AppResult<NotificationPreferences>;
}

#[async_trait]
pub trait FavoriteStore: Send + Sync {
    /// Returns false when the listing was already a favorite
    async fn add(&self, user_id: Uuid, listing_id: Uuid) -> AppResult<bool>;
    async fn remove(&self, user_id: Uuid, listing_id: Uuid) -> AppResult<bool>;
    async fn list(&self, user_id: Uuid) -> AppResult<Vec<Listing>>;
}

#[async_trait]
pub trait InquiryStore: Send + Sync {
    async fn insert(&self, inquiry: &Inquiry) -> AppResult<Inquiry>;
    async fn list_for_seller(&self, seller_id: Uuid, page: Page) -> AppResult<(Vec<Inquiry>, i64)>;
}

#[async_trait]
pub trait PaymentMethodStore: Send + Sync {
    async fn list(&self, active_only: bool) -> AppResult<Vec<PaymentMethod>>;
    async fn get_by_code(&self, code: &str) -> AppResult<Option<PaymentMethod>>;
    async fn upsert(&self, code: &str, data: &UpsertPaymentMethod) -> AppResult<PaymentMethod>;
}

#[async_trait]
pub trait Readiness: Send + Sync {
    async fn ping(&self) -> AppResult<()>;
}

/// Store handles shared by the services
#[derive(Clone)]
pub struct Stores {
    pub listings: Arc<dyn ListingStore>,
    pub users: Arc<dyn UserStore>,
    pub visits: Arc<dyn VisitStore>,
    pub notifications: Arc<dyn NotificationStore>,
    pub favorites: Arc<dyn FavoriteStore>,
    pub inquiries: Arc<dyn InquiryStore>,
    pub payment_methods: Arc<dyn PaymentMethodStore>,
    pub readiness: Arc<dyn Readiness>,
}

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub listings: listings::ListingsRepository,
    pub users: users::UsersRepository,
    pub visits: visits::VisitsRepository,
    pub notifications: notifications::NotificationsRepository,
    pub favorites: favorites::FavoritesRepository,
    pub inquiries: inquiries::InquiriesRepository,
    pub payment_methods: payment_methods::PaymentMethodsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            listings: listings::ListingsRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            visits: visits::VisitsRepository::new(pool.clone()),
            notifications: notifications::NotificationsRepository::new(pool.clone()),
            favorites: favorites::FavoritesRepository::new(pool.clone()),
            inquiries: inquiries::InquiriesRepository::new(pool.clone()),
            payment_methods: payment_methods::PaymentMethodsRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn stores(&self) -> Stores {
        Stores {
            listings: Arc::new(self.listings.clone()),
            users: Arc::new(self.users.clone()),
            visits: Arc::new(self.visits.clone()),
            notifications: Arc::new(self.notifications.clone()),
            favorites: Arc::new(self.favorites.clone()),
            inquiries: Arc::new(self.inquiries.clone()),
            payment_methods: Arc::new(self.payment_methods.clone()),
            readiness: Arc::new(self.clone()),
        }
    }
}

#[async_trait]
impl Readiness for Repository {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
