//! User lookups and role checks

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::user::UserProfile,
    repository::UserStore,
};

#[derive(Clone)]
pub struct UsersService {
    store: Arc<dyn UserStore>,
}

impl UsersService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Option<UserProfile>> {
        self.store.get(id).await
    }

    /// Role comes from the user row, not from the token
    pub async fn is_admin(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.store.get(id).await?.is_some_and(|u| u.is_admin()))
    }

    /// The caller's user row. A token for a user without one is not a valid identity.
    pub async fn require(&self, id: Uuid) -> AppResult<UserProfile> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| AppError::Authentication("Unknown user".to_string()))
    }

    pub async fn require_admin(&self, id: Uuid) -> AppResult<UserProfile> {
        let user = self.require(id).await?;
        if user.is_admin() {
            Ok(user)
        } else {
            Err(AppError::Authorization("Admin access required".to_string()))
        }
    }
}
