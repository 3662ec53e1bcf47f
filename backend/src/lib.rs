//! FileVault Backend Library
//!
//! Account registration, token login, and per-user file storage over HTTP.
//! Modules are public for use by the binary and the integration tests.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;
