//! Inquiries repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::InquiryStore;
use crate::{
    error::AppResult,
    models::{inquiry::Inquiry, Page},
};

#[derive(Clone)]
pub struct InquiriesRepository {
    pool: Pool<Postgres>,
}

impl InquiriesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InquiryStore for InquiriesRepository {
    async fn insert(&self, inquiry: &Inquiry) -> AppResult<Inquiry> {
        let row = sqlx::query_as::<_, Inquiry>(
            r#"
            INSERT INTO inquiries (id, listing_id, sender_id, seller_id, message, contact_phone, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(inquiry.id)
        .bind(inquiry.listing_id)
        .bind(inquiry.sender_id)
        .bind(inquiry.seller_id)
        .bind(&inquiry.message)
        .bind(&inquiry.contact_phone)
        .bind(inquiry.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_for_seller(&self, seller_id: Uuid, page: Page) -> AppResult<(Vec<Inquiry>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inquiries WHERE seller_id = $1")
            .bind(seller_id)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, Inquiry>(
            "SELECT * FROM inquiries WHERE seller_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(seller_id)
        .bind(page.per_page)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }
}
