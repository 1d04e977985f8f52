//! Visit requests repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::VisitStore;
use crate::{
    error::{AppError, AppResult},
    models::{
        visit::{NewVisitRequest, VisitFilter, VisitRequest, VisitStatus, VisitStatusTotals, VisitTransition},
        Page,
    },
};

#[derive(Clone)]
pub struct VisitsRepository {
    pool: Pool<Postgres>,
}

impl VisitsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Audit columns written when entering a status
fn audit_columns(to: VisitStatus) -> AppResult<(&'static str, &'static str)> {
    match to {
        VisitStatus::PaymentConfirmed => Ok(("confirmed_by", "confirmed_at")),
        VisitStatus::PayoutReleased => Ok(("released_by", "released_at")),
        VisitStatus::Cancelled => Ok(("cancelled_by", "cancelled_at")),
        VisitStatus::Refunded => Ok(("refunded_by", "refunded_at")),
        VisitStatus::AwaitingPayment => Err(AppError::Internal(
            "awaiting_payment is only set at creation".to_string(),
        )),
    }
}

fn filter_clause(filter: &VisitFilter) -> String {
    let mut conditions = Vec::new();
    let mut idx = 1;

    macro_rules! add_cond {
        ($field:expr, $column:literal) => {
            if $field.is_some() {
                conditions.push(format!("{} = ${}", $column, idx));
                idx += 1;
            }
        };
    }

    add_cond!(filter.status, "status");
    add_cond!(filter.listing_id, "listing_id");
    add_cond!(filter.buyer_id, "buyer_id");
    add_cond!(filter.seller_id, "seller_id");
    let _ = idx;

    if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    }
}

macro_rules! bind_filter {
    ($builder:ident, $filter:expr) => {{
        let f = $filter;
        if let Some(v) = f.status { $builder = $builder.bind(v); }
        if let Some(v) = f.listing_id { $builder = $builder.bind(v); }
        if let Some(v) = f.buyer_id { $builder = $builder.bind(v); }
        if let Some(v) = f.seller_id { $builder = $builder.bind(v); }
    }};
}

#[async_trait]
impl VisitStore for VisitsRepository {
    async fn insert(&self, visit: NewVisitRequest) -> AppResult<VisitRequest> {
        let result = sqlx::query_as::<_, VisitRequest>(
            r#"
            INSERT INTO visit_requests (
                id, listing_id, buyer_id, seller_id,
                buyer_name, buyer_email, buyer_phone, visit_date, visit_time, notes,
                payment_method, visit_fee_amount, platform_fee, seller_payout, currency,
                status, payment_reference, idempotency_key, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $19)
            RETURNING *
            "#,
        )
        .bind(visit.id)
        .bind(visit.listing_id)
        .bind(visit.buyer_id)
        .bind(visit.seller_id)
        .bind(&visit.contact.name)
        .bind(&visit.contact.email)
        .bind(&visit.contact.phone)
        .bind(visit.contact.date)
        .bind(visit.contact.time)
        .bind(&visit.contact.notes)
        .bind(&visit.payment_method)
        .bind(visit.visit_fee_amount)
        .bind(visit.platform_fee)
        .bind(visit.seller_payout)
        .bind(&visit.currency)
        .bind(VisitStatus::AwaitingPayment)
        .bind(&visit.payment_reference)
        .bind(&visit.idempotency_key)
        .bind(visit.created_at)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(row),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AppError::Conflict(
                "A visit request with this idempotency key already exists".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, id: Uuid) -> AppResult<VisitRequest> {
        sqlx::query_as::<_, VisitRequest>("SELECT * FROM visit_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Visit request {} not found", id)))
    }

    async fn find_by_idempotency_key(&self, buyer_id: Uuid, key: &str) -> AppResult<Option<VisitRequest>> {
        let row = sqlx::query_as::<_, VisitRequest>(
            "SELECT * FROM visit_requests WHERE buyer_id = $1 AND idempotency_key = $2",
        )
        .bind(buyer_id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list(&self, filter: &VisitFilter, page: Page) -> AppResult<(Vec<VisitRequest>, i64)> {
        let where_clause = filter_clause(filter);

        let count_q = format!("SELECT COUNT(*) FROM visit_requests {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_q);
        bind_filter!(count_builder, filter);
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_q = format!(
            "SELECT * FROM visit_requests {} ORDER BY created_at DESC LIMIT {} OFFSET {}",
            where_clause,
            page.per_page,
            page.offset()
        );
        let mut builder = sqlx::query_as::<_, VisitRequest>(&select_q);
        bind_filter!(builder, filter);
        let rows = builder.fetch_all(&self.pool).await?;

        Ok((rows, total))
    }

    async fn transition(&self, id: Uuid, change: &VisitTransition) -> AppResult<Option<VisitRequest>> {
        let (by_column, at_column) = audit_columns(change.to)?;

        // The status predicate makes concurrent transitions mutually exclusive
        let query = format!(
            r#"
            UPDATE visit_requests SET
                status = $1,
                {by_column} = $2,
                {at_column} = $3,
                updated_at = $3,
                payment_transaction_id = COALESCE($4, payment_transaction_id),
                refund_reason = COALESCE($5, refund_reason)
            WHERE id = $6 AND status = $7
            RETURNING *
            "#
        );

        let row = sqlx::query_as::<_, VisitRequest>(&query)
            .bind(change.to)
            .bind(change.actor)
            .bind(change.at)
            .bind(&change.payment_transaction_id)
            .bind(&change.reason)
            .bind(id)
            .bind(change.from)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn totals_by_status(&self) -> AppResult<Vec<VisitStatusTotals>> {
        let rows = sqlx::query_as::<_, VisitStatusTotals>(
            r#"
            SELECT status,
                   COUNT(*)::bigint AS count,
                   COALESCE(SUM(visit_fee_amount), 0)::bigint AS fee_total,
                   COALESCE(SUM(platform_fee), 0)::bigint AS platform_fee_total,
                   COALESCE(SUM(seller_payout), 0)::bigint AS seller_payout_total
            FROM visit_requests
            GROUP BY status
            ORDER BY status
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
