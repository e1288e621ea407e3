//! Build orchestration for declared services.
//!
//! For each service the orchestrator decides whether a build step is
//! needed (skip when excluded, skip when the service is already running
//! unless forced), constructs and runs the build command, and records
//! the outcome on the status tree.

use std::process::Output;

use crate::commandline;
use crate::service::{ContextOverride, OperationConfig, ServiceConfig};
use crate::tracker::{Task, TaskState};
use crate::{wlog_debug, wlog_trace, Error, Result};

/// Orchestrates build steps for one operation.
///
/// Borrows the operation configuration and overrides for the duration
/// of one invocation; holds no other state.
pub struct Builder<'a> {
    cfg: &'a OperationConfig,
    overrides: &'a ContextOverride,
}

impl<'a> Builder<'a> {
    pub fn new(cfg: &'a OperationConfig, overrides: &'a ContextOverride) -> Self {
        Self { cfg, overrides }
    }

    /// Build the given services in order, one child task per service.
    ///
    /// Stops at the first failure; services after it are not attempted
    /// and receive no child task. Skipped services (excluded, or already
    /// running without force) are not failures.
    pub fn build(&self, task: &Task, services: &[ServiceConfig]) -> Result<()> {
        for service in services {
            self.do_build(task, service)?;
        }
        Ok(())
    }

    fn do_build(&self, task: &Task, service: &ServiceConfig) -> Result<()> {
        if self.cfg.is_excluded(service) {
            wlog_debug!("build: service {} excluded, skipping", service.name);
            return Ok(());
        }
        self.build_sync(task, service, false)
    }

    /// Build a single service synchronously.
    ///
    /// If `force` is false, the build is skipped when the service is
    /// already running. Creates exactly one child task named after the
    /// service.
    pub fn build_sync(&self, task: &Task, service: &ServiceConfig, force: bool) -> Result<()> {
        let child = task.child(&service.name);
        self.build_with_tracker(Some(&child), service, force)
    }

    /// Core build routine, recording progress under the given task.
    ///
    /// A service without a build command is not an error; an absent task
    /// handle is a contract violation.
    pub fn build_with_tracker(
        &self,
        task: Option<&Task>,
        service: &ServiceConfig,
        force: bool,
    ) -> Result<()> {
        if !service.has_build_step() {
            return Ok(());
        }
        let Some(task) = task else {
            return Err(Error::TaskRequired);
        };

        let job = task.child("Build");
        job.set_state(TaskState::InProgress);
        wlog_debug!(
            "build: {} starting (task {}, force={})",
            service.name,
            job.id().short(),
            force
        );

        let command = match service.resolve_command(self.overrides) {
            Ok(command) => command,
            Err(e) => {
                job.set_state_with(TaskState::Failed, &[&e.to_string()]);
                return Err(Error::ContextResolution {
                    service: service.name.clone(),
                    source: Box::new(e),
                });
            }
        };

        if !force && command.pid != 0 {
            wlog_debug!(
                "build: {} already running (pid {}), skipping",
                service.name,
                command.pid
            );
            job.set_state_with(TaskState::Warning, &["Already running"]);
            return Ok(());
        }

        let mut cmd = match commandline::construct_command(
            &self.cfg.working_dir,
            &service.path,
            &service.commands.build,
            &|name| command.getenv(name),
        ) {
            Ok(cmd) => cmd,
            Err(e) => {
                job.set_state_with(TaskState::Failed, &[&e.to_string()]);
                return Err(e);
            }
        };

        let output = match cmd.output() {
            Ok(output) => output,
            Err(e) => {
                let err = Error::from(e);
                job.set_state_with(TaskState::Failed, &[&err.to_string()]);
                return Err(Error::BuildCommand(Box::new(err)));
            }
        };

        if !output.status.success() {
            let combined = combined_output(&output);
            let err = Error::CommandFailed(output.status);
            wlog_trace!("build: {} output:\n{}", service.name, combined);
            job.set_state_with(TaskState::Failed, &[&err.to_string(), &combined]);
            return Err(Error::BuildCommand(Box::new(err)));
        }

        wlog_debug!("build: {} succeeded", service.name);
        job.set_state(TaskState::Success);
        Ok(())
    }
}

/// Captured stdout followed by captured stderr, as one string.
fn combined_output(output: &Output) -> String {
    let mut bytes = output.stdout.clone();
    bytes.extend_from_slice(&output.stderr);
    String::from_utf8_lossy(&bytes).into_owned()
}
