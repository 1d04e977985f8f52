//! Buyer inquiries to sellers

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::{notifications::NotificationsService, templates::NotificationEvent, users::UsersService};
use crate::{
    config::PaginationConfig,
    error::{AppError, AppResult},
    models::{
        inquiry::{CreateInquiry, Inquiry},
        Page,
    },
    repository::{InquiryStore, ListingStore},
};

const MAX_MESSAGE_LEN: usize = 4000;

#[derive(Clone)]
pub struct InquiriesService {
    store: Arc<dyn InquiryStore>,
    listings: Arc<dyn ListingStore>,
    users: UsersService,
    notifications: NotificationsService,
    pagination: PaginationConfig,
}

impl InquiriesService {
    pub fn new(
        store: Arc<dyn InquiryStore>,
        listings: Arc<dyn ListingStore>,
        users: UsersService,
        notifications: NotificationsService,
        pagination: PaginationConfig,
    ) -> Self {
        Self {
            store,
            listings,
            users,
            notifications,
            pagination,
        }
    }

    pub async fn create(&self, sender_id: Uuid, listing_id: Uuid, data: &CreateInquiry) -> AppResult<Inquiry> {
        let message = data
            .message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .ok_or_else(|| AppError::Validation("Message is required".to_string()))?;
        if message.chars().count() > MAX_MESSAGE_LEN {
            return Err(AppError::Validation("Message is too long".to_string()));
        }

        self.users.require(sender_id).await?;
        let listing = self.listings.get(listing_id).await?;
        let inquiry = self
            .store
            .insert(&Inquiry {
                id: Uuid::new_v4(),
                listing_id,
                sender_id,
                seller_id: listing.seller_id,
                message: message.to_string(),
                contact_phone: data
                    .contact_phone
                    .as_deref()
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string),
                created_at: Utc::now(),
            })
            .await?;

        self.notifications
            .notify(
                listing.seller_id,
                NotificationEvent::InquiryReceived {
                    inquiry: &inquiry,
                    listing: &listing,
                },
            )
            .await;
        Ok(inquiry)
    }

    pub async fn received(&self, seller_id: Uuid, page: Option<i64>, per_page: Option<i64>) -> AppResult<(Vec<Inquiry>, i64)> {
        let page = Page::resolve(
            page,
            per_page,
            self.pagination.default_per_page,
            self.pagination.max_per_page,
        );
        self.store.list_for_seller(seller_id, page).await
    }
}
