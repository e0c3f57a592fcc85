//! Application layer: services and use cases
//!
//! This layer orchestrates the graph engine for reporting and rewriting workflows.

pub mod error;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
