//! Payment method configuration service

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::payment_method::{PaymentMethod, UpsertPaymentMethod},
    repository::PaymentMethodStore,
};

#[derive(Clone)]
pub struct PaymentMethodsService {
    store: Arc<dyn PaymentMethodStore>,
}

impl PaymentMethodsService {
    pub fn new(store: Arc<dyn PaymentMethodStore>) -> Self {
        Self { store }
    }

    /// Methods shown to buyers
    pub async fn list_active(&self) -> AppResult<Vec<PaymentMethod>> {
        self.store.list(true).await
    }

    pub async fn list_all(&self) -> AppResult<Vec<PaymentMethod>> {
        self.store.list(false).await
    }

    pub async fn upsert(&self, code: &str, data: &UpsertPaymentMethod) -> AppResult<PaymentMethod> {
        let code = code.trim().to_lowercase();
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(AppError::Validation(
                "Payment method code must be alphanumeric (underscores allowed)".to_string(),
            ));
        }
        if data.display_name.trim().is_empty() {
            return Err(AppError::Validation("Display name is required".to_string()));
        }
        let method = self.store.upsert(&code, data).await?;
        tracing::info!("Payment method {} updated (active: {})", method.code, method.is_active);
        Ok(method)
    }

    /// Resolve a buyer supplied hint to an active method code
    pub async fn require_active(&self, code: &str) -> AppResult<String> {
        let code = code.trim().to_lowercase();
        match self.store.get_by_code(&code).await? {
            Some(method) if method.is_active => Ok(method.code),
            _ => Err(AppError::Validation(format!(
                "Unknown or inactive payment method: {}",
                code
            ))),
        }
    }
}
