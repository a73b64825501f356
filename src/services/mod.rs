//! Business logic services.

pub mod accounts;
pub mod background;
pub mod users;

pub use background::{BackgroundJob, BackgroundWriter};
