//! Poll option repository.

use crate::entities::{PollOption, poll_option};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use votebox_common::{AppError, AppResult};

/// Poll option repository for database operations.
///
/// Every method runs on the caller's connection, since options are only
/// ever written as part of a poll-level unit of work.
#[derive(Clone, Default)]
pub struct PollOptionRepository;

impl PollOptionRepository {
    /// Create a new poll option repository.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// List the options of a poll, ordered by ID.
    pub async fn find_by_poll<C: ConnectionTrait>(
        &self,
        conn: &C,
        poll_id: i32,
    ) -> AppResult<Vec<poll_option::Model>> {
        PollOption::find()
            .filter(poll_option::Column::PollId.eq(poll_id))
            .order_by_asc(poll_option::Column::Id)
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create an option on a poll.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        poll_id: i32,
        text: &str,
    ) -> AppResult<poll_option::Model> {
        poll_option::ActiveModel {
            text: Set(text.to_string()),
            poll_id: Set(poll_id),
            ..Default::default()
        }
        .insert(conn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Replace the text of an option.
    pub async fn update_text<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: i32,
        text: &str,
    ) -> AppResult<poll_option::Model> {
        poll_option::ActiveModel {
            id: Set(id),
            text: Set(text.to_string()),
            ..Default::default()
        }
        .update(conn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete the given options.
    pub async fn delete_by_ids<C: ConnectionTrait>(&self, conn: &C, ids: &[i32]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = PollOption::delete_many()
            .filter(poll_option::Column::Id.is_in(ids.iter().copied()))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Delete every option of a poll.
    pub async fn delete_by_poll<C: ConnectionTrait>(&self, conn: &C, poll_id: i32) -> AppResult<u64> {
        let result = PollOption::delete_many()
            .filter(poll_option::Column::PollId.eq(poll_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}
