//! Poll repository.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{Poll, PollOption, User, Vote, poll, poll_option, user, vote};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use votebox_common::{AppError, AppResult};

/// A poll together with everything needed to project it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollGraph {
    pub poll: poll::Model,
    pub creator: user::Model,
    /// Options ordered by ID.
    pub options: Vec<poll_option::Model>,
    /// Votes on any option of this poll.
    pub votes: Vec<vote::Model>,
}

/// Poll repository for database operations.
#[derive(Clone)]
pub struct PollRepository {
    db: Arc<DatabaseConnection>,
}

impl PollRepository {
    /// Create a new poll repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a poll by ID.
    pub async fn find_by_id<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: i32,
    ) -> AppResult<Option<poll::Model>> {
        Poll::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a poll by ID, returning error if not found.
    pub async fn get_by_id<C: ConnectionTrait>(&self, conn: &C, id: i32) -> AppResult<poll::Model> {
        self.find_by_id(conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Poll not found".to_string()))
    }

    /// Lock a poll row for the rest of the transaction.
    pub async fn lock<C: ConnectionTrait>(&self, conn: &C, id: i32) -> AppResult<poll::Model> {
        Poll::find_by_id(id)
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound("Poll not found".to_string()))
    }

    /// Create a new poll.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: poll::ActiveModel,
    ) -> AppResult<poll::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a poll.
    pub async fn update<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: poll::ActiveModel,
    ) -> AppResult<poll::Model> {
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a poll.
    pub async fn delete<C: ConnectionTrait>(&self, conn: &C, id: i32) -> AppResult<()> {
        Poll::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Load a poll with its creator, options and votes.
    ///
    /// Issues three queries regardless of the number of options.
    pub async fn load_graph(&self, id: i32) -> AppResult<Option<PollGraph>> {
        let Some((poll, creator)) = Poll::find_by_id(id)
            .find_also_related(User)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        else {
            return Ok(None);
        };

        let mut graphs = self.assemble(vec![(poll, creator)]).await?;
        Ok(graphs.pop())
    }

    /// Load all polls, newest first, each with creator, options and votes.
    pub async fn load_all_graphs(&self) -> AppResult<Vec<PollGraph>> {
        let rows = Poll::find()
            .find_also_related(User)
            .order_by_desc(poll::Column::CreatedAt)
            .order_by_desc(poll::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.assemble(rows).await
    }

    /// Batch-load options and votes for the given polls.
    async fn assemble(
        &self,
        rows: Vec<(poll::Model, Option<user::Model>)>,
    ) -> AppResult<Vec<PollGraph>> {
        if rows.is_empty() {
            return Ok(vec![]);
        }

        let poll_ids: Vec<i32> = rows.iter().map(|(p, _)| p.id).collect();
        let options = PollOption::find()
            .filter(poll_option::Column::PollId.is_in(poll_ids))
            .order_by_asc(poll_option::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let votes = if options.is_empty() {
            vec![]
        } else {
            let option_ids: Vec<i32> = options.iter().map(|o| o.id).collect();
            Vote::find()
                .filter(vote::Column::OptionId.is_in(option_ids))
                .order_by_asc(vote::Column::Id)
                .all(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?
        };

        let option_poll: HashMap<i32, i32> = options.iter().map(|o| (o.id, o.poll_id)).collect();
        let mut options_by_poll: HashMap<i32, Vec<poll_option::Model>> = HashMap::new();
        for option in options {
            options_by_poll.entry(option.poll_id).or_default().push(option);
        }
        let mut votes_by_poll: HashMap<i32, Vec<vote::Model>> = HashMap::new();
        for vote in votes {
            if let Some(poll_id) = option_poll.get(&vote.option_id) {
                votes_by_poll.entry(*poll_id).or_default().push(vote);
            }
        }

        rows.into_iter()
            .map(|(poll, creator)| {
                let creator = creator.ok_or_else(|| {
                    AppError::Internal(format!("Poll {} has no creator", poll.id))
                })?;
                Ok(PollGraph {
                    options: options_by_poll.remove(&poll.id).unwrap_or_default(),
                    votes: votes_by_poll.remove(&poll.id).unwrap_or_default(),
                    poll,
                    creator,
                })
            })
            .collect()
    }
}
