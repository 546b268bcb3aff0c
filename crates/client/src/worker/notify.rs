//! Push messages turned into notifications, and notification clicks.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::atomic::Ordering;
use swcache_core::Error;
use url::Url;

use super::Worker;

/// Action that opens the application.
pub const EXPLORE_ACTION: &str = "explore";
/// Action that only dismisses the notification.
pub const CLOSE_ACTION: &str = "close";

const VIBRATE_PATTERN: [u32; 3] = [100, 50, 100];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NotificationData {
    /// Milliseconds since the Unix epoch.
    pub date_of_arrival: i64,
    pub primary_key: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Notification {
    /// Identifies the notification for later close/click handling.
    pub tag: String,
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
}

/// A user interaction with a displayed notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NotificationClick {
    pub tag: String,
    /// Empty when the body of the notification was clicked.
    pub action: Option<String>,
}

impl Worker {
    /// Build the notification for an inbound push and ask the host to show it.
    pub async fn handle_push(&self, payload: Option<&str>) -> Result<Notification, Error> {
        let settings = &self.config.notification;
        let seq = self.notification_seq.fetch_add(1, Ordering::Relaxed) + 1;

        let body = match payload {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => format!("New notification from {}", settings.title),
        };

        let notification = Notification {
            tag: format!("{}-{seq}", self.config.cache_name),
            title: settings.title.clone(),
            body,
            icon: settings.icon.clone(),
            badge: settings.badge.clone(),
            vibrate: VIBRATE_PATTERN.to_vec(),
            data: NotificationData { date_of_arrival: chrono::Utc::now().timestamp_millis(), primary_key: 1 },
            actions: vec![
                NotificationAction {
                    action: EXPLORE_ACTION.into(),
                    title: format!("Open {}", settings.title),
                    icon: settings.badge.clone(),
                },
                NotificationAction { action: CLOSE_ACTION.into(), title: "Close".into(), icon: settings.badge.clone() },
            ],
        };

        self.host.show_notification(&notification).await?;
        Ok(notification)
    }

    /// Close the clicked notification; the explore action opens the app root.
    ///
    /// Returns the URL that was opened, if any.
    pub async fn handle_notification_click(&self, click: &NotificationClick) -> Result<Option<Url>, Error> {
        self.host.close_notification(&click.tag).await?;

        if click.action.as_deref() != Some(EXPLORE_ACTION) {
            return Ok(None);
        }

        let root = self.config.origin.clone();
        self.host.open_window(&root).await?;
        Ok(Some(root))
    }
}
