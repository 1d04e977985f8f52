//! Notification dispatcher and inbox

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::{
    channels::{ChannelSenders, Recipient},
    templates::NotificationEvent,
};
use crate::{
    config::PaginationConfig,
    error::{AppError, AppResult},
    models::{
        notification::{
            ChannelDelivery, ChannelOutcome, NewNotification, Notification, NotificationPreferences,
            NotificationQuery, NotificationStatus, UpdatePreferences,
        },
        Page,
    },
    repository::{NotificationStore, UserStore},
};

#[derive(Clone)]
pub struct NotificationsService {
    store: Arc<dyn NotificationStore>,
    users: Arc<dyn UserStore>,
    senders: ChannelSenders,
    pagination: PaginationConfig,
}

impl NotificationsService {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        users: Arc<dyn UserStore>,
        senders: ChannelSenders,
        pagination: PaginationConfig,
    ) -> Self {
        Self {
            store,
            users,
            senders,
            pagination,
        }
    }

    /// Store the notification, then attempt every requested channel the
    /// recipient has not disabled. Nothing is stored when a lookup fails.
    pub async fn create(&self, new: NewNotification) -> AppResult<Notification> {
        if new.notification_type.trim().is_empty() {
            return Err(AppError::Validation("Notification type is required".to_string()));
        }
        if new.title.trim().is_empty() || new.message.trim().is_empty() {
            return Err(AppError::Validation("Title and message are required".to_string()));
        }

        let user_id = new.user_id;
        let preferences = self
            .store
            .preferences(user_id)
            .await?
            .unwrap_or_else(|| NotificationPreferences::enabled_for(user_id));
        let recipient = self
            .users
            .get(user_id)
            .await?
            .map(|u| Recipient::from(&u))
            .unwrap_or_default();

        let row = self.store.insert(Uuid::new_v4(), new, Utc::now()).await?;

        let mut deliveries = Vec::with_capacity(row.channels.len());
        for &channel in &row.channels {
            let outcome = if !preferences.allows(channel) {
                ChannelOutcome::skipped("disabled in user preferences")
            } else {
                match self.senders.get(channel) {
                    Some(sender) => sender.send(&recipient, &row).await,
                    None => ChannelOutcome::skipped(format!("no {} sender configured", channel)),
                }
            };
            if let ChannelOutcome::Failed { ref reason } = outcome {
                tracing::warn!("Notification {} {} delivery failed: {}", row.id, channel, reason);
            }
            deliveries.push(ChannelDelivery {
                channel,
                outcome,
                attempted_at: Utc::now(),
            });
        }

        let status = NotificationStatus::from_deliveries(&deliveries);
        let notification = self
            .store
            .record_dispatch(row.id, status, &deliveries, Utc::now())
            .await?;
        tracing::debug!(
            "Notification {} ({}) to user {}: {}",
            notification.id,
            notification.notification_type,
            user_id,
            status
        );
        Ok(notification)
    }

    /// Fire-and-forget variant for event producers. A notification failure
    /// never fails the operation that triggered it.
    pub async fn notify(&self, user_id: Uuid, event: NotificationEvent<'_>) -> Option<Notification> {
        match self.create(event.render(user_id)).await {
            Ok(notification) => Some(notification),
            Err(e) => {
                tracing::error!(
                    "Failed to create {} notification for user {}: {}",
                    event.notification_type(),
                    user_id,
                    e
                );
                None
            }
        }
    }

    pub async fn list(&self, user_id: Uuid, query: &NotificationQuery) -> AppResult<(Vec<Notification>, i64)> {
        let page = Page::resolve(
            query.page,
            query.per_page,
            self.pagination.default_per_page,
            self.pagination.max_per_page,
        );
        self.store.list(user_id, query, page).await
    }

    pub async fn unread_count(&self, user_id: Uuid) -> AppResult<i64> {
        self.store.unread_count(user_id).await
    }

    pub async fn mark_read(&self, user_id: Uuid, id: Uuid) -> AppResult<()> {
        if self.store.mark_read(user_id, id, Utc::now()).await? {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Notification {} not found", id)))
        }
    }

    /// Returns the number of notifications marked
    pub async fn mark_all_read(&self, user_id: Uuid) -> AppResult<u64> {
        self.store.mark_all_read(user_id, Utc::now()).await
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> AppResult<()> {
        if self.store.delete(user_id, id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Notification {} not found", id)))
        }
    }

    pub async fn preferences(&self, user_id: Uuid) -> AppResult<NotificationPreferences> {
        Ok(self
            .store
            .preferences(user_id)
            .await?
            .unwrap_or_else(|| NotificationPreferences::enabled_for(user_id)))
    }

    pub async fn update_preferences(
        &self,
        user_id: Uuid,
        update: &UpdatePreferences,
    ) -> AppResult<NotificationPreferences> {
        let mut preferences = self.preferences(user_id).await?;
        preferences.apply(update);
        self.store.save_preferences(&preferences).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{
            notification::{Channel, Priority},
            user::UserRole,
        },
        repository::{memory::MemoryStore, MockNotificationStore},
        services::channels::{ChannelSender, InAppSender, MockChannelSender},
    };

    fn mock_sender(channel: Channel, calls: usize, outcome: ChannelOutcome) -> Arc<dyn ChannelSender> {
        let mut sender = MockChannelSender::new();
        sender.expect_channel().return_const(channel);
        sender
            .expect_send()
            .times(calls)
            .returning(move |_, _| outcome.clone());
        Arc::new(sender)
    }

    fn service(store: &Arc<MemoryStore>, senders: Vec<Arc<dyn ChannelSender>>) -> NotificationsService {
        NotificationsService::new(
            store.clone(),
            store.clone(),
            ChannelSenders::new(senders),
            PaginationConfig::default(),
        )
    }

    fn new_notification(user_id: Uuid, channels: Vec<Channel>) -> NewNotification {
        NewNotification {
            user_id,
            notification_type: "visit_requested".to_string(),
            title: "New visit request".to_string(),
            message: "A buyer wants to visit your listing".to_string(),
            data: serde_json::json!({}),
            channels,
            priority: Priority::Normal,
        }
    }

    #[tokio::test]
    async fn test_disabled_channel_sender_is_never_invoked() {
        let store = MemoryStore::new();
        let user = store.add_user(UserRole::Seller);
        let svc = service(
            &store,
            vec![
                Arc::new(InAppSender),
                mock_sender(Channel::Sms, 0, ChannelOutcome::Delivered),
                mock_sender(Channel::Email, 1, ChannelOutcome::Delivered),
            ],
        );
        svc.update_preferences(
            user.id,
            &UpdatePreferences {
                sms_enabled: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let n = svc
            .create(new_notification(user.id, vec![Channel::InApp, Channel::Sms, Channel::Email]))
            .await
            .unwrap();

        assert_eq!(n.status, NotificationStatus::Sent);
        assert_eq!(n.deliveries.len(), 3);
        let sms = n.deliveries.iter().find(|d| d.channel == Channel::Sms).unwrap();
        assert!(matches!(sms.outcome, ChannelOutcome::Skipped { .. }));
        assert!(!n.is_read);
        assert!(n.sent_at.is_some());
    }

    #[tokio::test]
    async fn test_partial_and_total_failure() {
        let store = MemoryStore::new();
        let user = store.add_user(UserRole::User);
        let svc = service(
            &store,
            vec![
                Arc::new(InAppSender),
                mock_sender(Channel::Push, 2, ChannelOutcome::failed("gateway returned 503")),
            ],
        );

        let partial = svc
            .create(new_notification(user.id, vec![Channel::InApp, Channel::Push]))
            .await
            .unwrap();
        assert_eq!(partial.status, NotificationStatus::PartiallySent);

        let failed = svc
            .create(new_notification(user.id, vec![Channel::Push]))
            .await
            .unwrap();
        assert_eq!(failed.status, NotificationStatus::Failed);
    }

    #[tokio::test]
    async fn test_empty_channel_list_defaults_to_in_app() {
        let store = MemoryStore::new();
        let user = store.add_user(UserRole::User);
        let svc = service(&store, vec![Arc::new(InAppSender)]);

        let n = svc.create(new_notification(user.id, vec![])).await.unwrap();
        assert_eq!(n.channels, vec![Channel::InApp]);
        assert_eq!(n.status, NotificationStatus::Sent);
    }

    #[tokio::test]
    async fn test_blank_title_is_rejected() {
        let store = MemoryStore::new();
        let svc = service(&store, vec![]);
        let mut new = new_notification(Uuid::new_v4(), vec![]);
        new.title = "  ".to_string();
        assert!(matches!(svc.create(new).await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_failed_preference_lookup_stores_nothing() {
        let users = MemoryStore::new();
        let user = users.add_user(UserRole::User);

        let mut store = MockNotificationStore::new();
        store
            .expect_preferences()
            .returning(|_| Err(AppError::Internal("connection reset".to_string())));
        store.expect_insert().times(0);
        store.expect_record_dispatch().times(0);

        let svc = NotificationsService::new(
            Arc::new(store),
            users.clone(),
            ChannelSenders::new(vec![mock_sender(Channel::Email, 0, ChannelOutcome::Delivered)]),
            PaginationConfig::default(),
        );

        let result = svc.create(new_notification(user.id, vec![Channel::Email])).await;
        assert!(matches!(result, Err(AppError::Internal(_))));

        let event = crate::models::listing::tests::listing(
            crate::models::listing::ListingCategory::Land,
            "Plot at Aburi",
            3_000_000,
        );
        assert!(svc
            .notify(user.id, NotificationEvent::PromotionActivated(&event))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_notify_renders_event() {
        use crate::models::listing::{tests::listing, ListingCategory};

        let store = MemoryStore::new();
        let seller = store.add_user(UserRole::Seller);
        let svc = service(&store, vec![Arc::new(InAppSender)]);
        let mut house = listing(ListingCategory::Houses, "3 bedroom house, East Legon", 90_000_000);
        house.seller_id = seller.id;

        let n = svc
            .notify(seller.id, NotificationEvent::PromotionActivated(&house))
            .await
            .unwrap();
        assert_eq!(n.notification_type, "promotion_activated");
        // email requested but no email sender registered
        assert_eq!(n.status, NotificationStatus::Sent);
        assert_eq!(store.notifications_for(seller.id).len(), 1);
    }

    #[tokio::test]
    async fn test_inbox_is_scoped_to_owner() {
        let store = MemoryStore::new();
        let owner = store.add_user(UserRole::User);
        let other = store.add_user(UserRole::User);
        let svc = service(&store, vec![Arc::new(InAppSender)]);

        let first = svc.create(new_notification(owner.id, vec![])).await.unwrap();
        svc.create(new_notification(owner.id, vec![])).await.unwrap();
        svc.create(new_notification(other.id, vec![])).await.unwrap();

        assert_eq!(svc.unread_count(owner.id).await.unwrap(), 2);
        assert!(matches!(
            svc.mark_read(other.id, first.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(svc.delete(other.id, first.id).await, Err(AppError::NotFound(_))));

        svc.mark_read(owner.id, first.id).await.unwrap();
        let unread = NotificationQuery {
            unread_only: Some(true),
            ..Default::default()
        };
        let (rows, total) = svc.list(owner.id, &unread).await.unwrap();
        assert_eq!(total, 1);
        assert!(rows.iter().all(|n| n.id != first.id));

        assert_eq!(svc.mark_all_read(owner.id).await.unwrap(), 1);
        assert_eq!(svc.unread_count(owner.id).await.unwrap(), 0);
        assert_eq!(svc.unread_count(other.id).await.unwrap(), 1);

        svc.delete(owner.id, first.id).await.unwrap();
        let (_, total) = svc.list(owner.id, &NotificationQuery::default()).await.unwrap();
        assert_eq!(total, 1);
    }
}
