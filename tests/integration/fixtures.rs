//! Test fixtures for integration tests.
//!
//! Provides a temporary project directory with a wharf.toml, per-service
//! directories with build scripts, and a registry rooted inside the
//! temporary directory.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use wharf::config::{ProjectConfig, PROJECT_FILE};
use wharf::registry::{ProcessRegistry, ProcessState};

/// A service declaration to be written into the project file.
pub struct ServiceSpec {
    pub name: String,
    pub build: String,
    pub launch: String,
}

impl ServiceSpec {
    pub fn new(name: &str, build: &str) -> Self {
        Self {
            name: name.to_string(),
            build: build.to_string(),
            launch: String::new(),
        }
    }

    pub fn with_launch(mut self, launch: &str) -> Self {
        self.launch = launch.to_string();
        self
    }
}

/// A temporary project on disk.
pub struct TestProject {
    pub temp_dir: TempDir,
    pub path: PathBuf,
}

impl TestProject {
    /// Create a project with the given services declared in wharf.toml,
    /// each with its own directory under the project root.
    pub fn new(services: &[ServiceSpec]) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().to_path_buf();

        let mut config = String::new();
        for spec in services {
            fs::create_dir_all(path.join(&spec.name)).expect("Failed to create service dir");
            config.push_str(&format!(
                "[[service]]\nname = \"{}\"\npath = \"{}\"\n\n[service.commands]\nbuild = '''{}'''\nlaunch = '''{}'''\n\n",
                spec.name, spec.name, spec.build, spec.launch
            ));
        }
        fs::write(path.join(PROJECT_FILE), config).expect("Failed to write project file");

        Self { temp_dir, path }
    }

    pub fn project_file(&self) -> PathBuf {
        self.path.join(PROJECT_FILE)
    }

    /// Registry rooted inside the project's temp directory.
    pub fn registry(&self) -> ProcessRegistry {
        ProcessRegistry::new(self.path.join(".registry"))
    }

    /// Mark a service as running with the given pid.
    pub fn mark_running(&self, service: &str, pid: u32) {
        self.registry()
            .record(service, &ProcessState::running(pid))
            .expect("Failed to record process state");
    }

    /// Load the project with process states hydrated from the registry.
    pub fn load(&self) -> ProjectConfig {
        ProjectConfig::load_with_registry(&self.project_file(), &self.registry())
            .expect("Failed to load project")
    }

    /// Write an executable script into a service directory.
    pub fn write_script(&self, service: &str, name: &str, body: &str) -> PathBuf {
        let path = self.path.join(service).join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("Failed to write script");
        make_executable(&path);
        path
    }

    pub fn service_file(&self, service: &str, name: &str) -> PathBuf {
        self.path.join(service).join(name)
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path).expect("Failed to stat script").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).expect("Failed to chmod script");
}
