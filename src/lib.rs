pub mod builder;
pub mod commandline;
pub mod config;
pub mod error;
pub mod log;
pub mod output;
pub mod registry;
pub mod service;
pub mod tracker;

pub use builder::Builder;
pub use config::ProjectConfig;
pub use error::{Error, Result};
pub use registry::{ProcessRegistry, ProcessState};
pub use service::{ContextOverride, OperationConfig, ServiceCommands, ServiceConfig};
pub use tracker::{Task, TaskState};
