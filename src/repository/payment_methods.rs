//! Payment methods repository

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::PaymentMethodStore;
use crate::{
    error::AppResult,
    models::payment_method::{PaymentMethod, UpsertPaymentMethod},
};

#[derive(Clone)]
pub struct PaymentMethodsRepository {
    pool: Pool<Postgres>,
}

impl PaymentMethodsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentMethodStore for PaymentMethodsRepository {
    async fn list(&self, active_only: bool) -> AppResult<Vec<PaymentMethod>> {
        let rows = sqlx::query_as::<_, PaymentMethod>(
            "SELECT * FROM payment_methods WHERE ($1 = FALSE OR is_active) ORDER BY sort_order, display_name",
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_by_code(&self, code: &str) -> AppResult<Option<PaymentMethod>> {
        let row = sqlx::query_as::<_, PaymentMethod>("SELECT * FROM payment_methods WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn upsert(&self, code: &str, data: &UpsertPaymentMethod) -> AppResult<PaymentMethod> {
        let row = sqlx::query_as::<_, PaymentMethod>(
            r#"
            INSERT INTO payment_methods (id, code, display_name, instructions, account_details, is_active, sort_order, updated_at)
            VALUES ($1, $2, $3, $4, $5, COALESCE($6, TRUE), COALESCE($7, 0), $8)
            ON CONFLICT (code) DO UPDATE SET
                display_name = EXCLUDED.display_name,
                instructions = EXCLUDED.instructions,
                account_details = EXCLUDED.account_details,
                is_active = COALESCE($6, payment_methods.is_active),
                sort_order = COALESCE($7, payment_methods.sort_order),
                updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(code)
        .bind(&data.display_name)
        .bind(&data.instructions)
        .bind(&data.account_details)
        .bind(data.is_active)
        .bind(data.sort_order)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}
