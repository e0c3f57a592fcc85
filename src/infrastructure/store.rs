//! Load and save alerting configuration files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::{AlertingConfig, Layout};
use crate::infrastructure::traits::FileSystem;
use crate::infrastructure::{xml, InfraError, InfraResult};

/// File-backed access to alerting configuration documents.
pub struct DocumentStore {
    fs: Arc<dyn FileSystem>,
    layout: Layout,
}

impl DocumentStore {
    pub fn new(fs: Arc<dyn FileSystem>, layout: Layout) -> Self {
        Self { fs, layout }
    }

    /// Read and parse `path`, checking the root marker and indexing it.
    pub fn load(&self, path: &Path) -> InfraResult<AlertingConfig> {
        debug!("load: {}", path.display());
        if !self.fs.exists(path) {
            return Err(InfraError::io(
                format!("read {}", path.display()),
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such document"),
            ));
        }
        let content = self
            .fs
            .read_to_string(path)
            .map_err(|e| InfraError::io(format!("read {}", path.display()), e))?;
        let parse_err = |source| InfraError::Parse {
            path: path.to_path_buf(),
            source,
        };
        let doc = xml::parse(&content).map_err(parse_err)?;
        let config = AlertingConfig::new(doc).map_err(parse_err)?;
        Ok(config.with_layout(self.layout.clone()))
    }

    /// Serialize `config` to `path`, creating parent directories.
    pub fn save(&self, config: &AlertingConfig, path: &Path) -> InfraResult<PathBuf> {
        let content = xml::serialize(config.document())?;
        self.fs
            .ensure_parent(path)
            .map_err(|e| InfraError::io(format!("create parent of {}", path.display()), e))?;
        self.fs
            .write(path, &content)
            .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
        info!("wrote {}", path.display());
        Ok(path.to_path_buf())
    }
}
