use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::registry::ProcessRegistry;
use crate::service::ServiceConfig;
use crate::{wlog_debug, Error, Result};

pub const PROJECT_FILE: &str = "wharf.toml";

/// Declared services of a project, loaded from wharf.toml.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProjectConfig {
    #[serde(default, rename = "service")]
    pub services: Vec<ServiceConfig>,
}

impl ProjectConfig {
    pub fn wharf_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".wharf"))
    }

    pub fn state_dir() -> Result<PathBuf> {
        Ok(Self::wharf_dir()?.join("state"))
    }

    /// Locate wharf.toml in `start` or any parent directory.
    pub fn find(start: &Path) -> Result<PathBuf> {
        let mut dir = start;
        loop {
            let candidate = dir.join(PROJECT_FILE);
            if candidate.exists() {
                return Ok(candidate);
            }
            match dir.parent() {
                Some(parent) => dir = parent,
                None => return Err(Error::ProjectNotFound(start.to_path_buf())),
            }
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        wlog_debug!("ProjectConfig::load path={}", path.display());
        let config: Self = toml::from_str(&fs::read_to_string(path)?)?;
        config.validate()?;
        wlog_debug!("ProjectConfig loaded: {} services", config.services.len());
        Ok(config)
    }

    /// Load the project and hydrate each service's process state from
    /// the registry.
    pub fn load_with_registry(path: &Path, registry: &ProcessRegistry) -> Result<Self> {
        let mut config = Self::load(path)?;
        for service in &mut config.services {
            service.process = registry.status_of(&service.name)?;
        }
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for service in &self.services {
            if service.name.is_empty() {
                return Err(Error::Validation("service name cannot be empty".to_string()));
            }
            if !seen.insert(service.name.as_str()) {
                return Err(Error::Validation(format!(
                    "duplicate service name '{}'",
                    service.name
                )));
            }
        }
        Ok(())
    }

    pub fn service(&self, name: &str) -> Option<&ServiceConfig> {
        self.services.iter().find(|s| s.name == name)
    }
}
