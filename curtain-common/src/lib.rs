//! # Curtain Common Library
//!
//! Shared code for the curtain order pipeline:
//! - Database initialization, schema and record models
//! - Error taxonomy
//! - Configuration loading and root folder resolution
//! - Role Gate policy and credential store
//! - Bounded retry for busy database access

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod retry;

pub use error::{Error, Result};
