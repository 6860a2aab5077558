//! # Liftday Common Library
//!
//! Shared code for the liftday officiating service:
//! - Domain enums (gender, discipline, attempt status, verdict, roles)
//! - Database models and schema initialization
//! - Event types (CompetitionEvent enum)
//! - Error types
//! - Configuration loading

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod types;

pub use error::{Error, Result};
