//! Graph engine and tooling for alerting configuration documents.
//!
//! A document holds definitions, entry points, operations and actions that
//! reference each other by identifier. The [`domain`] layer indexes, walks,
//! extends and prunes that graph; [`infrastructure`] reads and writes the
//! markup; [`application`] builds the reports and rewrites the CLI exposes.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
