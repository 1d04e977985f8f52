//! Payment method configuration endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppResult,
    models::payment_method::{PaymentMethod, UpsertPaymentMethod},
};

use super::AdminUser;

/// Active payment methods shown to buyers
#[utoipa::path(
    get,
    path = "/payment-methods",
    tag = "payment_methods",
    responses(
        (status = 200, description = "Active payment methods", body = Vec<PaymentMethod>)
    )
)]
pub async fn list_payment_methods(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<PaymentMethod>>> {
    let methods = state.services.payment_methods.list_active().await?;
    Ok(Json(methods))
}

/// Every payment method, including inactive ones (admin)
#[utoipa::path(
    get,
    path = "/payment-methods/all",
    tag = "payment_methods",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All payment methods", body = Vec<PaymentMethod>)
    )
)]
pub async fn list_all_payment_methods(
    State(state): State<crate::AppState>,
    AdminUser(_admin): AdminUser,
) -> AppResult<Json<Vec<PaymentMethod>>> {
    let methods = state.services.payment_methods.list_all().await?;
    Ok(Json(methods))
}

/// Create or update a payment method (admin)
#[utoipa::path(
    put,
    path = "/payment-methods/{code}",
    tag = "payment_methods",
    security(("bearer_auth" = [])),
    params(("code" = String, Path, description = "Payment method code")),
    request_body = UpsertPaymentMethod,
    responses(
        (status = 200, description = "Payment method saved", body = PaymentMethod)
    )
)]
pub async fn upsert_payment_method(
    State(state): State<crate::AppState>,
    AdminUser(_admin): AdminUser,
    Path(code): Path<String>,
    Json(data): Json<UpsertPaymentMethod>,
) -> AppResult<Json<PaymentMethod>> {
    let method = state.services.payment_methods.upsert(&code, &data).await?;
    Ok(Json(method))
}
