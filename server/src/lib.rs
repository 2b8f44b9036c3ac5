//! Portal Backend Library
//!
//! Core modules for the client-portal backend: deployment health
//! monitoring, GitHub-backed project data, and the access-scoped API.

pub mod app;
pub mod authn;
pub mod cache;
pub mod errors;
pub mod github;
pub mod logs;
pub mod models;
pub mod monitor;
pub mod server;
pub mod store;
pub mod utils;
