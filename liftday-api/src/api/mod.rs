//! HTTP API handlers for liftday-api

pub mod attempts;
pub mod draw;
pub mod error;
pub mod health;
pub mod results;
pub mod sse;
pub mod voting;

pub use error::ApiError;
