//! Read projection of polls.
//!
//! Turns a loaded [`PollGraph`] into the view returned to a given caller:
//! per-option tallies, the caller's choice and whether the poll changed since
//! the caller voted.

use chrono::{DateTime, Utc};
use serde::Serialize;
use votebox_db::{entities::user, repositories::PollGraph};

use super::edit_tracker::edited_after_vote;

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    pub id: i32,
    pub username: String,
    pub email: String,
}

impl From<user::Model> for UserView {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

/// An option with its tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionView {
    pub id: i32,
    pub text: String,
    pub vote_count: u64,
}

/// A poll as seen by one caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollView {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub creator: UserView,
    pub options: Vec<OptionView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_voted_option_id: Option<i32>,
    pub poll_edited_after_vote: bool,
}

/// Project a poll graph for `viewer_id`.
#[must_use]
pub fn project(graph: PollGraph, viewer_id: i32) -> PollView {
    let PollGraph {
        poll,
        creator,
        mut options,
        votes,
    } = graph;

    options.sort_by_key(|o| o.id);

    let options = options
        .into_iter()
        .map(|option| OptionView {
            vote_count: votes.iter().filter(|v| v.option_id == option.id).count() as u64,
            id: option.id,
            text: option.text,
        })
        .collect();

    let viewer_vote = votes.iter().find(|v| v.user_id == viewer_id);
    let poll_edited_after_vote =
        viewer_vote.is_some_and(|v| edited_after_vote(poll.updated_at, v.created_at));

    PollView {
        id: poll.id,
        title: poll.title,
        description: poll.description.unwrap_or_default(),
        creator: creator.into(),
        options,
        created_at: poll.created_at.with_timezone(&Utc),
        updated_at: poll.updated_at.with_timezone(&Utc),
        user_voted_option_id: viewer_vote.map(|v| v.option_id),
        poll_edited_after_vote,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset, TimeZone};
    use votebox_db::entities::{poll, poll_option, vote};

    fn at(secs: i64) -> DateTime<FixedOffset> {
        Utc.timestamp_opt(secs, 0)
            .single()
            .unwrap_or_default()
            .into()
    }

    fn graph(updated_at: DateTime<FixedOffset>, votes: Vec<vote::Model>) -> PollGraph {
        PollGraph {
            poll: poll::Model {
                id: 1,
                title: "Lunch?".to_string(),
                description: None,
                creator_id: 10,
                created_at: at(0),
                updated_at,
            },
            creator: user::Model {
                id: 10,
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                password_hash: "hash".to_string(),
                created_at: at(0),
            },
            options: vec![
                poll_option::Model {
                    id: 101,
                    text: "Sushi".to_string(),
                    poll_id: 1,
                },
                poll_option::Model {
                    id: 100,
                    text: "Pizza".to_string(),
                    poll_id: 1,
                },
            ],
            votes,
        }
    }

    fn vote(id: i32, user_id: i32, option_id: i32, created_at: DateTime<FixedOffset>) -> vote::Model {
        vote::Model {
            id,
            user_id,
            option_id,
            created_at,
        }
    }

    #[test]
    fn test_tallies_in_option_order() {
        let view = project(
            graph(
                at(0),
                vec![vote(1, 20, 100, at(5)), vote(2, 21, 100, at(6)), vote(3, 22, 101, at(7))],
            ),
            99,
        );

        let tallies: Vec<_> = view.options.iter().map(|o| (o.id, o.vote_count)).collect();
        assert_eq!(tallies, [(100, 2), (101, 1)]);
        assert_eq!(view.user_voted_option_id, None);
        assert!(!view.poll_edited_after_vote);
        assert_eq!(view.description, "");
        assert_eq!(view.creator.username, "alice");
    }

    #[test]
    fn test_viewer_choice_and_fresh_vote() {
        let view = project(graph(at(0), vec![vote(1, 20, 101, at(5))]), 20);

        assert_eq!(view.user_voted_option_id, Some(101));
        assert!(!view.poll_edited_after_vote);
    }

    #[test]
    fn test_edit_after_vote_flag() {
        let voted = at(5);
        let view = project(graph(voted + Duration::seconds(1), vec![vote(1, 20, 101, voted)]), 20);
        assert!(view.poll_edited_after_vote);

        let view = project(graph(voted, vec![vote(1, 20, 101, voted)]), 20);
        assert!(!view.poll_edited_after_vote);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(project(graph(at(0), vec![]), 20)).unwrap_or_default();

        assert!(json.get("user_voted_option_id").is_none());
        assert_eq!(json["poll_edited_after_vote"], false);
        assert_eq!(json["options"][0]["vote_count"], 0);
        assert!(json["creator"].get("password_hash").is_none());
        assert_eq!(json["created_at"], "1970-01-01T00:00:00Z");
    }
}
