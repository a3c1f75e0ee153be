//! Notification service.

use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, Set};
use serde::Serialize;
use votebox_common::{AppError, AppResult};
use votebox_db::{
    entities::notification::{self, NotificationType},
    repositories::NotificationRepository,
};

/// Maximum number of notifications returned by a listing.
pub const LIST_LIMIT: u64 = 50;

/// Public view of a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationView {
    pub id: i32,
    pub message: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_id: Option<i32>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<notification::Model> for NotificationView {
    fn from(n: notification::Model) -> Self {
        Self {
            id: n.id,
            message: n.message,
            notification_type: n.notification_type,
            poll_id: n.poll_id,
            read: n.read,
            created_at: n.created_at.with_timezone(&Utc),
        }
    }
}

/// A vote change worth telling the poll creator about.
#[derive(Debug, Clone, Copy)]
pub struct VoteChange<'a> {
    pub recipient_id: i32,
    pub poll_id: i32,
    pub voter_username: &'a str,
    pub poll_title: &'a str,
    pub from_option: &'a str,
    pub to_option: &'a str,
}

impl VoteChange<'_> {
    /// Human-readable message for the recipient.
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "{} changed their vote on \"{}\" from \"{}\" to \"{}\"",
            self.voter_username, self.poll_title, self.from_option, self.to_option
        )
    }
}

/// Notification service for business logic.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(notification_repo: NotificationRepository) -> Self {
        Self { notification_repo }
    }

    /// Record a vote change notification on the given connection.
    pub async fn create_vote_changed<C: ConnectionTrait>(
        &self,
        conn: &C,
        change: &VoteChange<'_>,
    ) -> AppResult<notification::Model> {
        let model = notification::ActiveModel {
            user_id: Set(change.recipient_id),
            message: Set(change.message()),
            notification_type: Set(NotificationType::VoteChanged),
            poll_id: Set(Some(change.poll_id)),
            read: Set(false),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        self.notification_repo.create(conn, model).await
    }

    /// Get a user's most recent notifications, newest first.
    pub async fn list(&self, user_id: i32) -> AppResult<Vec<NotificationView>> {
        let notifications = self
            .notification_repo
            .find_by_user(user_id, LIST_LIMIT)
            .await?;

        Ok(notifications.into_iter().map(Into::into).collect())
    }

    /// Count a user's unread notifications.
    pub async fn unread_count(&self, user_id: i32) -> AppResult<u64> {
        self.notification_repo.count_unread(user_id).await
    }

    /// Mark one of the user's notifications as read.
    pub async fn mark_as_read(&self, user_id: i32, notification_id: i32) -> AppResult<()> {
        if self
            .notification_repo
            .mark_as_read(notification_id, user_id)
            .await?
        {
            Ok(())
        } else {
            Err(AppError::NotFound("Notification not found".to_string()))
        }
    }

    /// Mark all of the user's notifications as read.
    pub async fn mark_all_as_read(&self, user_id: i32) -> AppResult<u64> {
        self.notification_repo.mark_all_as_read(user_id).await
    }
}
