//! Database repositories.
//!
//! Methods that take a `conn` argument participate in the caller's
//! transaction. The others run on the pool directly.

mod notification;
mod poll;
mod poll_option;
mod user;
mod vote;

pub use notification::NotificationRepository;
pub use poll::{PollGraph, PollRepository};
pub use poll_option::PollOptionRepository;
pub use user::UserRepository;
pub use vote::VoteRepository;
