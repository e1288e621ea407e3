//! Service descriptors and per-operation configuration.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::commandline;
use crate::registry::ProcessState;
use crate::Result;

/// Command strings declared for a service.
///
/// An empty `build` string means the service has no build step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ServiceCommands {
    #[serde(default)]
    pub build: String,
    #[serde(default)]
    pub launch: String,
}

/// A buildable/runnable unit declared to the tool.
///
/// Created and validated by the configuration layer; the build core
/// treats it as read-only. `process` mirrors the registry's record for
/// this service at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub commands: ServiceCommands,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(skip)]
    pub process: ProcessState,
}

impl ServiceConfig {
    pub fn has_build_step(&self) -> bool {
        !self.commands.build.is_empty()
    }

    /// Resolve the service's runtime command and environment.
    ///
    /// Tokenizes the declared launch command, merges the environment
    /// (declared env, then global overrides, then per-service overrides;
    /// later wins) and carries the recorded pid. A malformed launch
    /// string is the failure mode here.
    pub fn resolve_command(&self, overrides: &ContextOverride) -> Result<ServiceCommand> {
        let launch = if self.commands.launch.is_empty() {
            Vec::new()
        } else {
            commandline::split_words(&self.commands.launch)?
        };

        let mut env = self.env.clone();
        overrides.apply_to(&self.name, &mut env);

        Ok(ServiceCommand {
            pid: self.process.pid,
            launch,
            env,
        })
    }
}

/// Per-invocation configuration shared across one build run.
#[derive(Debug, Clone, Default)]
pub struct OperationConfig {
    pub working_dir: PathBuf,
    pub exclusions: Vec<String>,
}

impl OperationConfig {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            exclusions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_exclusions(mut self, exclusions: Vec<String>) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Whether a service is excluded from this operation.
    pub fn is_excluded(&self, service: &ServiceConfig) -> bool {
        self.exclusions.iter().any(|name| *name == service.name)
    }
}

/// Environment overrides consulted during context resolution.
///
/// Global entries apply to every service; per-service entries win over
/// global ones. Owned by the caller, read-only to the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct ContextOverride {
    env: HashMap<String, String>,
    services: HashMap<String, HashMap<String, String>>,
}

impl ContextOverride {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_env(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.env.insert(name.into(), value.into());
    }

    pub fn set_service_env(
        &mut self,
        service: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.services
            .entry(service.into())
            .or_default()
            .insert(name.into(), value.into());
    }

    fn apply_to(&self, service: &str, env: &mut HashMap<String, String>) {
        for (k, v) in &self.env {
            env.insert(k.clone(), v.clone());
        }
        if let Some(overrides) = self.services.get(service) {
            for (k, v) in overrides {
                env.insert(k.clone(), v.clone());
            }
        }
    }

    /// Parse a `KEY=VALUE` pair as accepted by the CLI.
    pub fn parse_pair(pair: &str) -> Result<(String, String)> {
        match pair.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
            _ => Err(crate::Error::Validation(format!(
                "invalid environment override '{}', expected KEY=VALUE",
                pair
            ))),
        }
    }
}

/// Result of context resolution for one service.
#[derive(Debug, Clone)]
pub struct ServiceCommand {
    /// Recorded process id; 0 means not running.
    pub pid: u32,
    launch: Vec<String>,
    env: HashMap<String, String>,
}

impl ServiceCommand {
    /// Look up an environment value, falling back to the OS environment.
    pub fn getenv(&self, name: &str) -> Option<String> {
        self.env
            .get(name)
            .cloned()
            .or_else(|| std::env::var(name).ok())
    }

    /// Program of the tokenized launch command, if any.
    pub fn launch_program(&self) -> Option<&str> {
        self.launch.first().map(String::as_str)
    }
}
