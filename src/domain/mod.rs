//! Domain layer: the alerting configuration graph engine
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod alerting;
pub mod category;
pub mod document;
pub mod error;
pub mod factory;
pub mod index;
pub mod prune;
pub mod traversal;

pub use alerting::{AlertingConfig, Layout, Reference};
pub use category::{Category, UnknownCategory};
pub use document::{Document, Element, NodeData, NodeId, TreeNode};
pub use error::{DomainError, DomainResult};
pub use factory::Component;
pub use index::{CategoryIndex, Diagnostic};
pub use prune::{Liveness, PruneReport};
pub use traversal::WalkScope;
