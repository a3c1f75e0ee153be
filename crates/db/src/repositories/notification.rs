//! Notification repository.

use std::sync::Arc;

use crate::entities::{Notification, notification};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, sea_query::Expr,
};
use votebox_common::{AppError, AppResult};

/// Notification repository for database operations.
#[derive(Clone)]
pub struct NotificationRepository {
    db: Arc<DatabaseConnection>,
}

impl NotificationRepository {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a notification.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: notification::ActiveModel,
    ) -> AppResult<notification::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find notifications for a user, newest first.
    pub async fn find_by_user(
        &self,
        user_id: i32,
        limit: u64,
    ) -> AppResult<Vec<notification::Model>> {
        Notification::find()
            .filter(notification::Column::UserId.eq(user_id))
            .order_by_desc(notification::Column::CreatedAt)
            .order_by_desc(notification::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count unread notifications for a user.
    pub async fn count_unread(&self, user_id: i32) -> AppResult<u64> {
        Notification::find()
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::Read.eq(false))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark one notification as read.
    ///
    /// Returns `false` when no notification with this ID belongs to the user.
    pub async fn mark_as_read(&self, id: i32, user_id: i32) -> AppResult<bool> {
        let result = Notification::update_many()
            .col_expr(notification::Column::Read, Expr::value(true))
            .filter(notification::Column::Id.eq(id))
            .filter(notification::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// Mark all of a user's notifications as read.
    pub async fn mark_all_as_read(&self, user_id: i32) -> AppResult<u64> {
        let result = Notification::update_many()
            .col_expr(notification::Column::Read, Expr::value(true))
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::Read.eq(false))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}
