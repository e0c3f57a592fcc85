//! Application services
//!
//! Reports and rewrites built on the graph engine. Services that need settings
//! are structs; stateless reports are plain functions over an
//! [`AlertingConfig`](crate::domain::AlertingConfig).

pub mod augment;
pub mod inventory;
pub mod lint;
pub mod selection;

pub use augment::{AugmentMode, AugmentReport, AugmentService};
pub use lint::Orphan;
pub use selection::{ChangedDefinitions, DefinitionFilter};
