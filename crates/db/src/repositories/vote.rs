//! Vote repository.

use crate::entities::{User, Vote, poll_option, user, vote};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set,
};
use votebox_common::{AppError, AppResult};

/// Vote repository for database operations.
#[derive(Clone, Default)]
pub struct VoteRepository;

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Find the votes a user holds on any option of a poll.
    ///
    /// Rows are locked until the surrounding transaction ends. Normally
    /// there is at most one.
    pub async fn find_by_user_in_poll<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: i32,
        poll_id: i32,
    ) -> AppResult<Vec<vote::Model>> {
        Vote::find()
            .join(JoinType::InnerJoin, vote::Relation::PollOption.def())
            .filter(vote::Column::UserId.eq(user_id))
            .filter(poll_option::Column::PollId.eq(poll_id))
            .order_by_asc(vote::Column::Id)
            .lock_exclusive()
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Time of the most recent vote on any option of a poll.
    pub async fn latest_in_poll<C: ConnectionTrait>(
        &self,
        conn: &C,
        poll_id: i32,
    ) -> AppResult<Option<chrono::DateTime<chrono::FixedOffset>>> {
        let latest = Vote::find()
            .join(JoinType::InnerJoin, vote::Relation::PollOption.def())
            .filter(poll_option::Column::PollId.eq(poll_id))
            .order_by_desc(vote::Column::CreatedAt)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(latest.map(|v| v.created_at))
    }

    /// Record a vote.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: vote::ActiveModel,
    ) -> AppResult<vote::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Record a vote by `user_id` for `option_id` at `created_at`.
    pub async fn cast<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: i32,
        option_id: i32,
        created_at: chrono::DateTime<chrono::FixedOffset>,
    ) -> AppResult<vote::Model> {
        self.create(
            conn,
            vote::ActiveModel {
                user_id: Set(user_id),
                option_id: Set(option_id),
                created_at: Set(created_at),
                ..Default::default()
            },
        )
        .await
    }

    /// Delete the given votes.
    pub async fn delete_by_ids<C: ConnectionTrait>(&self, conn: &C, ids: &[i32]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = Vote::delete_many()
            .filter(vote::Column::Id.is_in(ids.iter().copied()))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Delete every vote on the given options.
    pub async fn delete_by_option_ids<C: ConnectionTrait>(
        &self,
        conn: &C,
        option_ids: &[i32],
    ) -> AppResult<u64> {
        if option_ids.is_empty() {
            return Ok(0);
        }

        let result = Vote::delete_many()
            .filter(vote::Column::OptionId.is_in(option_ids.iter().copied()))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// List who voted for an option, oldest vote first.
    pub async fn find_voters<C: ConnectionTrait>(
        &self,
        conn: &C,
        option_id: i32,
    ) -> AppResult<Vec<(vote::Model, user::Model)>> {
        let rows = Vote::find()
            .filter(vote::Column::OptionId.eq(option_id))
            .order_by_asc(vote::Column::CreatedAt)
            .order_by_asc(vote::Column::Id)
            .find_also_related(User)
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .filter_map(|(vote, user)| user.map(|user| (vote, user)))
            .collect())
    }
}
