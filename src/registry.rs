//! Process registry state.
//!
//! The supervision layer records the pid of each launched service as a
//! JSON file under the registry state directory. The build core only
//! reads these records; a missing record means "not running".

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ProjectConfig;
use crate::{wlog_debug, Result};

/// Recorded running-process state for one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProcessState {
    /// Process id; 0 means the service is not running.
    #[serde(default)]
    pub pid: u32,
    /// When the process was launched.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

impl ProcessState {
    /// A record for a process launched now.
    pub fn running(pid: u32) -> Self {
        Self {
            pid,
            started_at: Some(Utc::now()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.pid != 0
    }
}

/// Read/write access to per-service process records.
pub struct ProcessRegistry {
    state_dir: PathBuf,
}

impl ProcessRegistry {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
        }
    }

    /// Open the registry at the default location (~/.wharf/state).
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(ProjectConfig::state_dir()?))
    }

    fn state_path(&self, service: &str) -> PathBuf {
        self.state_dir.join(format!("{}.json", service))
    }

    /// Current recorded state for a service.
    ///
    /// A missing record yields the default state (pid 0); a corrupt
    /// record is an error.
    pub fn status_of(&self, service: &str) -> Result<ProcessState> {
        let path = self.state_path(service);
        if !path.exists() {
            return Ok(ProcessState::default());
        }
        let state: ProcessState = serde_json::from_str(&fs::read_to_string(&path)?)?;
        wlog_debug!(
            "registry: service {} recorded pid {}",
            service,
            state.pid
        );
        Ok(state)
    }

    /// Record the state for a service, creating the state dir if needed.
    pub fn record(&self, service: &str, state: &ProcessState) -> Result<()> {
        if !self.state_dir.exists() {
            fs::create_dir_all(&self.state_dir)?;
        }
        fs::write(self.state_path(service), serde_json::to_string_pretty(state)?)?;
        wlog_debug!("registry: recorded pid {} for {}", state.pid, service);
        Ok(())
    }

    /// Remove the record for a service. Missing records are not an error.
    pub fn clear(&self, service: &str) -> Result<()> {
        let path = self.state_path(service);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}
