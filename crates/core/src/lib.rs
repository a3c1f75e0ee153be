//! Core business logic for votebox.

pub mod services;

pub use services::*;
