//! Vote service.
//!
//! A user holds at most one vote per poll. Casting a vote on a poll where the
//! user already voted replaces the earlier vote, and the poll creator hears
//! about the change.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use votebox_common::{AppError, AppResult};
use votebox_db::repositories::{
    NotificationRepository, PollOptionRepository, PollRepository, UserRepository, VoteRepository,
};

use super::edit_tracker::vote_time;
use super::notification::{NotificationService, VoteChange};
use super::projection::{PollView, UserView, project};

/// Vote service for business logic.
#[derive(Clone)]
pub struct VoteService {
    db: Arc<DatabaseConnection>,
    user_repo: UserRepository,
    poll_repo: PollRepository,
    option_repo: PollOptionRepository,
    vote_repo: VoteRepository,
    notifications: NotificationService,
}

impl VoteService {
    /// Create a new vote service.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            user_repo: UserRepository::new(Arc::clone(&db)),
            poll_repo: PollRepository::new(Arc::clone(&db)),
            option_repo: PollOptionRepository::new(),
            vote_repo: VoteRepository::new(),
            notifications: NotificationService::new(NotificationRepository::new(Arc::clone(&db))),
            db,
        }
    }

    /// Cast or change the actor's vote on a poll.
    pub async fn cast(&self, actor_id: i32, poll_id: i32, option_id: i32) -> AppResult<PollView> {
        let txn = votebox_db::begin(&self.db).await?;

        let poll = self.poll_repo.get_by_id(&txn, poll_id).await?;
        let actor = self.user_repo.lock(&txn, actor_id).await?;
        let previous = self
            .vote_repo
            .find_by_user_in_poll(&txn, actor_id, poll_id)
            .await?;

        let options = self.option_repo.find_by_poll(&txn, poll_id).await?;
        let chosen = options
            .iter()
            .find(|o| o.id == option_id)
            .ok_or_else(|| AppError::BadRequest("Invalid option for this poll".to_string()))?;

        let previous_option = previous
            .first()
            .and_then(|v| options.iter().find(|o| o.id == v.option_id));

        let stale: Vec<i32> = previous.iter().map(|v| v.id).collect();
        self.vote_repo.delete_by_ids(&txn, &stale).await?;
        self.vote_repo
            .cast(&txn, actor_id, option_id, vote_time(poll.updated_at, Utc::now()))
            .await?;

        // No notice for the owner's own votes or for re-casting the same option.
        let notify_from =
            previous_option.filter(|from| poll.creator_id != actor_id && from.id != chosen.id);
        if let Some(from) = notify_from {
            let change = VoteChange {
                recipient_id: poll.creator_id,
                poll_id,
                voter_username: &actor.username,
                poll_title: &poll.title,
                from_option: &from.text,
                to_option: &chosen.text,
            };
            self.notify_in_savepoint(&txn, &change).await;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::debug!(
            poll_id,
            option_id,
            actor_id,
            replaced = !previous.is_empty(),
            "Vote cast"
        );
        self.view(poll_id, actor_id).await
    }

    /// Withdraw the actor's vote on a poll, if any.
    pub async fn clear(&self, actor_id: i32, poll_id: i32) -> AppResult<PollView> {
        let txn = votebox_db::begin(&self.db).await?;

        self.poll_repo.get_by_id(&txn, poll_id).await?;
        self.user_repo.lock(&txn, actor_id).await?;
        let previous = self
            .vote_repo
            .find_by_user_in_poll(&txn, actor_id, poll_id)
            .await?;

        let ids: Vec<i32> = previous.iter().map(|v| v.id).collect();
        self.vote_repo.delete_by_ids(&txn, &ids).await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::debug!(poll_id, actor_id, cleared = ids.len(), "Vote cleared");
        self.view(poll_id, actor_id).await
    }

    /// List the users who voted for an option, earliest vote first.
    ///
    /// An unknown option has no voters.
    pub async fn voters(&self, option_id: i32) -> AppResult<Vec<UserView>> {
        let voters = self
            .vote_repo
            .find_voters(self.db.as_ref(), option_id)
            .await?;
        Ok(voters.into_iter().map(|(_, user)| user.into()).collect())
    }

    /// Write a notification in a savepoint.
    ///
    /// Failure is logged and rolls back only the savepoint; the vote stands.
    async fn notify_in_savepoint(&self, txn: &DatabaseTransaction, change: &VoteChange<'_>) {
        let savepoint = match txn.begin().await {
            Ok(savepoint) => savepoint,
            Err(e) => {
                tracing::warn!(error = %e, poll_id = change.poll_id, "Failed to open savepoint for notification");
                return;
            }
        };

        match self
            .notifications
            .create_vote_changed(&savepoint, change)
            .await
        {
            Ok(notification) => {
                if let Err(e) = savepoint.commit().await {
                    tracing::warn!(error = %e, poll_id = change.poll_id, "Failed to release notification savepoint");
                } else {
                    tracing::debug!(
                        notification_id = notification.id,
                        recipient_id = change.recipient_id,
                        "Vote change notification created"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, poll_id = change.poll_id, "Failed to create vote change notification");
                if let Err(e) = savepoint.rollback().await {
                    tracing::warn!(error = %e, "Failed to roll back notification savepoint");
                }
            }
        }
    }

    async fn view(&self, poll_id: i32, viewer_id: i32) -> AppResult<PollView> {
        self.poll_repo
            .load_graph(poll_id)
            .await?
            .map(|g| project(g, viewer_id))
            .ok_or_else(|| AppError::NotFound("Poll not found".to_string()))
    }
}
