//! Test utilities for database operations.
//!
//! Provides a migrated in-memory `SQLite` database and fixture helpers.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, DbErr, Set};
use sea_orm_migration::MigratorTrait;

use crate::entities::{poll, poll_option, user, vote};
use crate::migrations::Migrator;

/// A migrated, isolated test database.
pub struct TestDatabase {
    /// Database connection.
    pub conn: Arc<DatabaseConnection>,
}

impl TestDatabase {
    /// Create a fresh in-memory database with all migrations applied.
    ///
    /// The pool holds exactly one connection, so every handle sees the same
    /// in-memory database.
    pub async fn new() -> Result<Self, DbErr> {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;
        Migrator::up(&conn, None).await?;

        Ok(Self {
            conn: Arc::new(conn),
        })
    }

    /// Get the shared connection.
    #[must_use]
    pub fn connection(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.conn)
    }

    /// Insert a user with a placeholder password hash.
    pub async fn create_user(&self, username: &str) -> Result<user::Model, DbErr> {
        user::ActiveModel {
            username: Set(username.to_string()),
            email: Set(format!("{username}@example.com")),
            password_hash: Set("not-a-real-hash".to_string()),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(self.conn.as_ref())
        .await
    }

    /// Insert a poll with the given options.
    pub async fn create_poll(
        &self,
        creator_id: i32,
        title: &str,
        options: &[&str],
    ) -> Result<(poll::Model, Vec<poll_option::Model>), DbErr> {
        let now = Utc::now();
        let poll = poll::ActiveModel {
            title: Set(title.to_string()),
            description: Set(None),
            creator_id: Set(creator_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        }
        .insert(self.conn.as_ref())
        .await?;

        let mut created = Vec::with_capacity(options.len());
        for text in options {
            let option = poll_option::ActiveModel {
                text: Set((*text).to_string()),
                poll_id: Set(poll.id),
                ..Default::default()
            }
            .insert(self.conn.as_ref())
            .await?;
            created.push(option);
        }

        Ok((poll, created))
    }

    /// Insert a vote directly, bypassing the one-vote-per-poll bookkeeping.
    pub async fn create_vote(&self, user_id: i32, option_id: i32) -> Result<vote::Model, DbErr> {
        vote::ActiveModel {
            user_id: Set(user_id),
            option_id: Set(option_id),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(self.conn.as_ref())
        .await
    }
}
