//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::config::Settings;
use crate::infrastructure::store::DocumentStore;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

/// Container holding settings, I/O seams and the document store.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Document load/save, using the configured layout
    pub store: DocumentStore,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        let store = DocumentStore::new(Arc::clone(&fs), settings.document_layout());
        Self {
            settings: Arc::new(settings),
            fs,
            store,
        }
    }
}
