//! Listings repository for database operations

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::ListingStore;
use crate::{
    error::{AppError, AppResult},
    models::{
        listing::{Listing, ListingQuery},
        Page,
    },
};

#[derive(Clone)]
pub struct ListingsRepository {
    pool: Pool<Postgres>,
}

impl ListingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// WHERE clause for a listing query. Placeholders are numbered in the
/// order `bind_filters!` binds the values.
fn where_clause(query: &ListingQuery) -> String {
    let mut conditions = vec!["status = $1".to_string()];
    let mut idx = 2;

    macro_rules! add_cond {
        ($field:expr, $sql:literal) => {
            if $field.is_some() {
                conditions.push(format!($sql, idx));
                idx += 1;
            }
        };
    }

    add_cond!(query.category, "category = ${}");
    add_cond!(query.min_price, "price >= ${}");
    add_cond!(query.max_price, "price <= ${}");
    add_cond!(query.min_bedrooms, "bedrooms >= ${}");
    add_cond!(query.min_bathrooms, "bathrooms >= ${}");
    add_cond!(query.min_plot_size, "plot_size_sqm >= ${}");
    add_cond!(query.max_plot_size, "plot_size_sqm <= ${}");
    add_cond!(query.road_access, "road_access = ${}");
    add_cond!(query.fuel_type, "LOWER(fuel_type) = LOWER(${})");
    add_cond!(query.transmission, "LOWER(transmission) = LOWER(${})");

    if query.search_term().is_some() {
        conditions.push(format!(
            "(unaccent(LOWER(title)) LIKE ${idx} ESCAPE '\\' \
             OR unaccent(LOWER(COALESCE(description, ''))) LIKE ${idx} ESCAPE '\\')"
        ));
    }

    format!("WHERE {}", conditions.join(" AND "))
}

/// Substring LIKE pattern matching `term` literally
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

macro_rules! bind_filters {
    ($builder:ident, $query:expr) => {{
        let q = $query;
        $builder = $builder.bind(q.effective_status());
        if let Some(v) = q.category { $builder = $builder.bind(v); }
        if let Some(v) = q.min_price { $builder = $builder.bind(v); }
        if let Some(v) = q.max_price { $builder = $builder.bind(v); }
        if let Some(v) = q.min_bedrooms { $builder = $builder.bind(v); }
        if let Some(v) = q.min_bathrooms { $builder = $builder.bind(v); }
        if let Some(v) = q.min_plot_size { $builder = $builder.bind(v); }
        if let Some(v) = q.max_plot_size { $builder = $builder.bind(v); }
        if let Some(v) = q.road_access { $builder = $builder.bind(v); }
        if let Some(ref v) = q.fuel_type { $builder = $builder.bind(v.clone()); }
        if let Some(ref v) = q.transmission { $builder = $builder.bind(v.clone()); }
        if let Some(term) = q.search_term() { $builder = $builder.bind(like_pattern(&term)); }
    }};
}

#[async_trait]
impl ListingStore for ListingsRepository {
    async fn get(&self, id: Uuid) -> AppResult<Listing> {
        sqlx::query_as::<_, Listing>("SELECT * FROM listings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Listing {} not found", id)))
    }

    async fn search(&self, query: &ListingQuery, page: Page) -> AppResult<(Vec<Listing>, i64)> {
        let where_clause = where_clause(query);

        let count_q = format!("SELECT COUNT(*) FROM listings {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_q);
        bind_filters!(count_builder, query);
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_q = format!(
            "SELECT * FROM listings {} ORDER BY featured DESC, created_at DESC LIMIT {} OFFSET {}",
            where_clause,
            page.per_page,
            page.offset()
        );
        let mut builder = sqlx::query_as::<_, Listing>(&select_q);
        bind_filters!(builder, query);
        let rows = builder.fetch_all(&self.pool).await?;

        Ok((rows, total))
    }

    async fn set_featured(&self, id: Uuid, featured: bool) -> AppResult<Listing> {
        sqlx::query_as::<_, Listing>(
            "UPDATE listings SET featured = $1, updated_at = $2 WHERE id = $3 RETURNING *",
        )
        .bind(featured)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Listing {} not found", id)))
    }
}
