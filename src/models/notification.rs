//! Notification model, channels and per-user preferences

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Delivery medium
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Sms,
    Push,
    InApp,
}

text_enum!(Channel {
    Email => "email",
    Sms => "sms",
    Push => "push",
    InApp => "in_app",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

text_enum!(Priority {
    Low => "low",
    Normal => "normal",
    High => "high",
    Urgent => "urgent",
});

/// Dispatch status. `sent` means every attempted channel delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Pending,
    Sent,
    PartiallySent,
    Failed,
}

text_enum!(NotificationStatus {
    Pending => "pending",
    Sent => "sent",
    PartiallySent => "partially_sent",
    Failed => "failed",
});

impl NotificationStatus {
    /// Aggregate per-channel outcomes. Skipped channels are neither
    /// deliveries nor failures.
    pub fn from_deliveries(deliveries: &[ChannelDelivery]) -> Self {
        let delivered = deliveries
            .iter()
            .any(|d| matches!(d.outcome, ChannelOutcome::Delivered));
        let failed = deliveries
            .iter()
            .any(|d| matches!(d.outcome, ChannelOutcome::Failed { .. }));

        match (delivered, failed) {
            (_, false) => NotificationStatus::Sent,
            (true, true) => NotificationStatus::PartiallySent,
            (false, true) => NotificationStatus::Failed,
        }
    }
}

/// Result of one channel send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ChannelOutcome {
    Delivered,
    Failed { reason: String },
    Skipped { reason: String },
}

impl ChannelOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        ChannelOutcome::Failed { reason: reason.into() }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        ChannelOutcome::Skipped { reason: reason.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChannelDelivery {
    pub channel: Channel,
    pub outcome: ChannelOutcome,
    pub attempted_at: DateTime<Utc>,
}

/// Notification as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
    pub channels: Vec<Channel>,
    pub priority: Priority,
    pub status: NotificationStatus,
    pub deliveries: Vec<ChannelDelivery>,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

/// Internal row structure (JSONB columns)
#[derive(Debug, Clone, FromRow)]
pub struct NotificationRow {
    id: Uuid,
    user_id: Uuid,
    notification_type: String,
    title: String,
    message: String,
    data: serde_json::Value,
    channels: Json<Vec<Channel>>,
    priority: Priority,
    status: NotificationStatus,
    deliveries: Json<Vec<ChannelDelivery>>,
    is_read: bool,
    read_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    sent_at: Option<DateTime<Utc>>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Notification {
            id: row.id,
            user_id: row.user_id,
            notification_type: row.notification_type,
            title: row.title,
            message: row.message,
            data: row.data,
            channels: row.channels.0,
            priority: row.priority,
            status: row.status,
            deliveries: row.deliveries.0,
            is_read: row.is_read,
            read_at: row.read_at,
            created_at: row.created_at,
            sent_at: row.sent_at,
        }
    }
}

/// Notification to create. Also the body of the admin create endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewNotification {
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub data: serde_json::Value,
    /// Defaults to in-app only when empty
    #[serde(default)]
    pub channels: Vec<Channel>,
    #[serde(default)]
    pub priority: Priority,
}

impl NewNotification {
    /// Requested channels without duplicates, in-app when none were requested
    pub fn normalized_channels(&self) -> Vec<Channel> {
        let mut channels = Vec::with_capacity(self.channels.len().max(1));
        for channel in &self.channels {
            if !channels.contains(channel) {
                channels.push(*channel);
            }
        }
        if channels.is_empty() {
            channels.push(Channel::InApp);
        }
        channels
    }

    /// Row as it looks right after insertion
    pub fn into_pending(self, id: Uuid, created_at: DateTime<Utc>) -> Notification {
        let channels = self.normalized_channels();
        Notification {
            id,
            user_id: self.user_id,
            notification_type: self.notification_type,
            title: self.title,
            message: self.message,
            data: self.data,
            channels,
            priority: self.priority,
            status: NotificationStatus::Pending,
            deliveries: Vec::new(),
            is_read: false,
            read_at: None,
            created_at,
            sent_at: None,
        }
    }
}

/// Per-user channel opt-outs. A user without a row receives every channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct NotificationPreferences {
    pub user_id: Uuid,
    pub email_enabled: bool,
    pub sms_enabled: bool,
    pub push_enabled: bool,
    pub in_app_enabled: bool,
    pub updated_at: DateTime<Utc>,
}

impl NotificationPreferences {
    pub fn enabled_for(user_id: Uuid) -> Self {
        Self {
            user_id,
            email_enabled: true,
            sms_enabled: true,
            push_enabled: true,
            in_app_enabled: true,
            updated_at: Utc::now(),
        }
    }

    pub fn allows(&self, channel: Channel) -> bool {
        match channel {
            Channel::Email => self.email_enabled,
            Channel::Sms => self.sms_enabled,
            Channel::Push => self.push_enabled,
            Channel::InApp => self.in_app_enabled,
        }
    }

    pub fn apply(&mut self, update: &UpdatePreferences) {
        if let Some(v) = update.email_enabled {
            self.email_enabled = v;
        }
        if let Some(v) = update.sms_enabled {
            self.sms_enabled = v;
        }
        if let Some(v) = update.push_enabled {
            self.push_enabled = v;
        }
        if let Some(v) = update.in_app_enabled {
            self.in_app_enabled = v;
        }
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdatePreferences {
    pub email_enabled: Option<bool>,
    pub sms_enabled: Option<bool>,
    pub push_enabled: Option<bool>,
    pub in_app_enabled: Option<bool>,
}

/// Inbox query parameters
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct NotificationQuery {
    /// Only unread notifications
    pub unread_only: Option<bool>,
    /// Filter by notification type
    pub notification_type: Option<String>,
    /// Page number (1-based)
    pub page: Option<i64>,
    /// Items per page
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delivery(channel: Channel, outcome: ChannelOutcome) -> ChannelDelivery {
        ChannelDelivery {
            channel,
            outcome,
            attempted_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_aggregation() {
        let all_ok = [
            delivery(Channel::InApp, ChannelOutcome::Delivered),
            delivery(Channel::Email, ChannelOutcome::skipped("disabled")),
        ];
        assert_eq!(NotificationStatus::from_deliveries(&all_ok), NotificationStatus::Sent);

        let partial = [
            delivery(Channel::InApp, ChannelOutcome::Delivered),
            delivery(Channel::Sms, ChannelOutcome::failed("gateway 503")),
        ];
        assert_eq!(NotificationStatus::from_deliveries(&partial), NotificationStatus::PartiallySent);

        let failed = [
            delivery(Channel::Sms, ChannelOutcome::failed("timeout")),
            delivery(Channel::Push, ChannelOutcome::skipped("no gateway")),
        ];
        assert_eq!(NotificationStatus::from_deliveries(&failed), NotificationStatus::Failed);
    }

    #[test]
    fn test_channels_are_deduplicated_with_in_app_default() {
        let mut new = NewNotification {
            user_id: Uuid::new_v4(),
            notification_type: "test".to_string(),
            title: "t".to_string(),
            message: "m".to_string(),
            data: serde_json::Value::Null,
            channels: vec![],
            priority: Priority::Normal,
        };
        assert_eq!(new.normalized_channels(), vec![Channel::InApp]);
        new.channels = vec![Channel::Email, Channel::Sms, Channel::Email];
        assert_eq!(new.normalized_channels(), vec![Channel::Email, Channel::Sms]);
    }

    #[test]
    fn test_outcome_wire_format() {
        let json = serde_json::to_value(ChannelOutcome::failed("rate limited")).unwrap();
        assert_eq!(json, serde_json::json!({"result": "failed", "reason": "rate limited"}));
    }

    #[test]
    fn test_preferences_update() {
        let mut prefs = NotificationPreferences::enabled_for(Uuid::new_v4());
        prefs.apply(&UpdatePreferences {
            sms_enabled: Some(false),
            ..Default::default()
        });
        assert!(!prefs.allows(Channel::Sms));
        assert!(prefs.allows(Channel::Email));
    }
}
