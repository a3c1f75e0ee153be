//! Poll service.
//!
//! Creates, edits and deletes polls together with their option sets. Every
//! mutation is one transaction; the projection is read after commit.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{DatabaseConnection, IntoActiveModel, Set};
use serde::{Deserialize, Serialize};
use validator::Validate;
use votebox_common::{AppError, AppResult};
use votebox_db::{
    entities::poll,
    repositories::{PollOptionRepository, PollRepository, VoteRepository},
};

use super::edit_tracker::next_updated_at;
use super::projection::{PollView, project};

/// Input for creating a poll.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePollInput {
    #[validate(length(min = 1, max = 256))]
    pub title: String,

    #[validate(length(max = 4096))]
    pub description: Option<String>,

    #[validate(length(min = 2, message = "A poll needs at least two options"))]
    pub options: Vec<String>,
}

/// An option in an edit request. Options without an ID are created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionInput {
    pub id: Option<i32>,
    pub text: String,
}

/// Input for editing a poll.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePollInput {
    #[validate(length(min = 1, max = 256))]
    pub title: String,

    #[validate(length(max = 4096))]
    pub description: Option<String>,

    #[validate(length(min = 2, message = "A poll needs at least two options"))]
    pub options: Vec<OptionInput>,
}

/// Poll service for business logic.
#[derive(Clone)]
pub struct PollService {
    db: Arc<DatabaseConnection>,
    poll_repo: PollRepository,
    option_repo: PollOptionRepository,
    vote_repo: VoteRepository,
}

impl PollService {
    /// Create a new poll service.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            poll_repo: PollRepository::new(Arc::clone(&db)),
            option_repo: PollOptionRepository::new(),
            vote_repo: VoteRepository::new(),
            db,
        }
    }

    /// Create a poll with its options.
    pub async fn create(&self, creator_id: i32, input: CreatePollInput) -> AppResult<PollView> {
        input.validate()?;
        let title = normalize_title(&input.title)?;
        let texts = input
            .options
            .iter()
            .map(|text| normalize_option(text))
            .collect::<AppResult<Vec<_>>>()?;

        let now: DateTime<FixedOffset> = Utc::now().into();
        let txn = votebox_db::begin(&self.db).await?;

        let poll = self
            .poll_repo
            .create(
                &txn,
                poll::ActiveModel {
                    title: Set(title),
                    description: Set(normalize_description(input.description)),
                    creator_id: Set(creator_id),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                },
            )
            .await?;

        for text in &texts {
            self.option_repo.create(&txn, poll.id, text).await?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(poll_id = poll.id, creator_id, options = texts.len(), "Poll created");
        self.view(poll.id, creator_id).await
    }

    /// Edit a poll's title, description and option set.
    ///
    /// Options missing from the input are removed together with their votes.
    pub async fn update(
        &self,
        actor_id: i32,
        poll_id: i32,
        input: UpdatePollInput,
    ) -> AppResult<PollView> {
        let txn = votebox_db::begin(&self.db).await?;

        // Ownership is decided before the body is looked at.
        let poll = self.poll_repo.lock(&txn, poll_id).await?;
        if poll.creator_id != actor_id {
            return Err(AppError::Forbidden(
                "You can only edit your own polls".to_string(),
            ));
        }

        input.validate()?;
        let title = normalize_title(&input.title)?;
        let options = input
            .options
            .iter()
            .map(|o| Ok((o.id, normalize_option(&o.text)?)))
            .collect::<AppResult<Vec<_>>>()?;

        let existing: HashSet<i32> = self
            .option_repo
            .find_by_poll(&txn, poll_id)
            .await?
            .into_iter()
            .map(|o| o.id)
            .collect();

        let mut kept = HashSet::new();
        for id in options.iter().filter_map(|(id, _)| *id) {
            if !existing.contains(&id) {
                return Err(AppError::BadRequest(format!(
                    "Option {id} does not belong to this poll"
                )));
            }
            if !kept.insert(id) {
                return Err(AppError::BadRequest(format!("Option {id} is listed twice")));
            }
        }

        // Every vote cast so far must read as older than this edit.
        let floor = self
            .vote_repo
            .latest_in_poll(&txn, poll_id)
            .await?
            .map_or(poll.updated_at, |voted_at| voted_at.max(poll.updated_at));
        let updated_at = next_updated_at(floor, Utc::now());
        let mut active = poll.into_active_model();
        active.title = Set(title);
        active.description = Set(normalize_description(input.description));
        active.updated_at = Set(updated_at);
        self.poll_repo.update(&txn, active).await?;

        for (id, text) in &options {
            match id {
                Some(id) => {
                    self.option_repo.update_text(&txn, *id, text).await?;
                }
                None => {
                    self.option_repo.create(&txn, poll_id, text).await?;
                }
            }
        }

        let mut removed: Vec<i32> = existing.difference(&kept).copied().collect();
        removed.sort_unstable();
        let dropped_votes = self.vote_repo.delete_by_option_ids(&txn, &removed).await?;
        self.option_repo.delete_by_ids(&txn, &removed).await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(
            poll_id,
            removed_options = removed.len(),
            dropped_votes,
            "Poll updated"
        );
        self.view(poll_id, actor_id).await
    }

    /// Delete a poll, its options and every vote on them.
    pub async fn delete(&self, actor_id: i32, poll_id: i32) -> AppResult<()> {
        let txn = votebox_db::begin(&self.db).await?;

        let poll = self.poll_repo.lock(&txn, poll_id).await?;
        if poll.creator_id != actor_id {
            return Err(AppError::Forbidden(
                "You can only delete your own polls".to_string(),
            ));
        }

        let option_ids: Vec<i32> = self
            .option_repo
            .find_by_poll(&txn, poll_id)
            .await?
            .into_iter()
            .map(|o| o.id)
            .collect();

        self.vote_repo.delete_by_option_ids(&txn, &option_ids).await?;
        self.option_repo.delete_by_poll(&txn, poll_id).await?;
        self.poll_repo.delete(&txn, poll_id).await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(poll_id, actor_id, "Poll deleted");
        Ok(())
    }

    /// Get one poll as seen by `viewer_id`.
    pub async fn get(&self, poll_id: i32, viewer_id: i32) -> AppResult<PollView> {
        self.view(poll_id, viewer_id).await
    }

    /// List every poll, newest first, as seen by `viewer_id`.
    pub async fn list(&self, viewer_id: i32) -> AppResult<Vec<PollView>> {
        let graphs = self.poll_repo.load_all_graphs().await?;
        Ok(graphs.into_iter().map(|g| project(g, viewer_id)).collect())
    }

    async fn view(&self, poll_id: i32, viewer_id: i32) -> AppResult<PollView> {
        self.poll_repo
            .load_graph(poll_id)
            .await?
            .map(|g| project(g, viewer_id))
            .ok_or_else(|| AppError::NotFound("Poll not found".to_string()))
    }
}

fn normalize_title(title: &str) -> AppResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    Ok(title.to_string())
}

fn normalize_option(text: &str) -> AppResult<String> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::Validation(
            "Option text cannot be empty".to_string(),
        ));
    }
    Ok(text.to_string())
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn service(db: MockDatabase) -> PollService {
        PollService::new(Arc::new(db.into_connection()))
    }

    #[tokio::test]
    async fn test_create_requires_two_options() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));

        let result = svc
            .create(
                1,
                CreatePollInput {
                    title: "Lunch?".to_string(),
                    description: None,
                    options: vec!["Pizza".to_string()],
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_blank_title() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));

        let result = svc
            .create(
                1,
                CreatePollInput {
                    title: "   ".to_string(),
                    description: None,
                    options: vec!["Pizza".to_string(), "Sushi".to_string()],
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    fn create_test_poll(id: i32, creator_id: i32) -> poll::Model {
        let now: DateTime<FixedOffset> = Utc::now().into();
        poll::Model {
            id,
            title: "Lunch?".to_string(),
            description: None,
            creator_id,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_update_rejects_blank_option() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_poll(1, 1)]]),
        );

        let result = svc
            .update(
                1,
                1,
                UpdatePollInput {
                    title: "Lunch?".to_string(),
                    description: None,
                    options: vec![
                        OptionInput {
                            id: Some(1),
                            text: "Pizza".to_string(),
                        },
                        OptionInput {
                            id: None,
                            text: " ".to_string(),
                        },
                    ],
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_by_non_owner_is_forbidden_before_validation() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_poll(1, 1)]]),
        );

        let result = svc
            .update(
                2,
                1,
                UpdatePollInput {
                    title: String::new(),
                    description: None,
                    options: vec![OptionInput {
                        id: None,
                        text: "X".to_string(),
                    }],
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_normalize_description() {
        assert_eq!(normalize_description(None), None);
        assert_eq!(normalize_description(Some("  ".to_string())), None);
        assert_eq!(
            normalize_description(Some(" Where? ".to_string())),
            Some("Where?".to_string())
        );
    }
}
