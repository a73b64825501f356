//! Tenant auth server library.
//!
//! Accounts (tenants), account keys, users and revocable session tokens,
//! exposed over an actix-web API and backed by sea-orm.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
