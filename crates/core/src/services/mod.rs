//! Business logic services.

#![allow(missing_docs)]

pub mod edit_tracker;
pub mod notification;
pub mod poll;
pub mod projection;
pub mod token;
pub mod user;
pub mod vote;

pub use notification::{NotificationService, NotificationView};
pub use poll::{CreatePollInput, OptionInput, PollService, UpdatePollInput};
pub use projection::{OptionView, PollView, UserView};
pub use token::TokenService;
pub use user::{LoginInput, Session, SignupInput, UserService};
pub use vote::VoteService;
