//! Job Board Backend Library
//!
//! REST backend for the job board dashboard: authenticated access to users,
//! universities and job postings, with role-scoped visibility.
//! Exposes every module so the binary and integration tests share one router.

pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod middleware;
pub mod models;
pub mod store;
