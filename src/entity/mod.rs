//! SeaORM entity definitions.

pub mod account;
pub mod key;
pub mod token;
pub mod user;
