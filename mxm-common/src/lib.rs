//! # MXM Common Library
//!
//! Shared code for the Mixxx library merge tools including:
//! - Database connection helpers and library table schemas
//! - Dynamic row model used to copy rows between libraries
//! - Configuration loading
//! - Path normalisation
//! - Common error type

pub mod config;
pub mod db;
pub mod error;
pub mod path;

pub use error::{Error, Result};
pub use path::normalize_path;
