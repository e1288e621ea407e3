use std::error::Error as _;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use wharf::config::ProjectConfig;
use wharf::output;
use wharf::registry::ProcessRegistry;
use wharf::service::{ContextOverride, OperationConfig, ServiceConfig};
use wharf::tracker::Task;
use wharf::{wlog, Builder, Error, Result};

/// Wharf - local multi-service development tool
#[derive(Parser, Debug)]
#[command(name = "wharf")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    WHARF_DEBUG=1   Enable debug logging (alternative to --debug)")]
struct Cli {
    /// Enable debug logging (writes to ~/.wharf/wharf.log)
    #[arg(short = 'd', long)]
    debug: bool,

    /// Path to the project file (default: wharf.toml found upward from the current directory)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum Command {
    /// Build services in order (all declared services when none are named)
    Build {
        /// Services to build, in order
        services: Vec<String>,

        /// Rebuild even when the service is currently running
        #[arg(long, short = 'f')]
        force: bool,

        /// Exclude a service from this operation (repeatable)
        #[arg(long, short = 'x', value_name = "NAME")]
        exclude: Vec<String>,

        /// Environment override (repeatable)
        #[arg(long, short = 'e', value_name = "KEY=VALUE")]
        env: Vec<String>,
    },

    /// List declared services and their recorded status
    List,
}

fn main() {
    let cli = Cli::parse();
    wharf::log::init_with_debug(cli.debug);

    let result = match cli.command {
        Command::Build {
            services,
            force,
            exclude,
            env,
        } => run_build(cli.config, services, force, exclude, env),
        Command::List => run_list(cli.config),
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        let mut cause = e.source();
        while let Some(err) = cause {
            eprintln!("  caused by: {}", err);
            cause = err.source();
        }
        std::process::exit(1);
    }
}

fn project_file(config: Option<PathBuf>) -> Result<PathBuf> {
    match config {
        Some(path) => Ok(path),
        None => ProjectConfig::find(&std::env::current_dir()?),
    }
}

fn load_project(config: Option<PathBuf>) -> Result<(PathBuf, ProjectConfig)> {
    let path = project_file(config)?;
    let registry = ProcessRegistry::open_default()?;
    let project = ProjectConfig::load_with_registry(&path, &registry)?;
    Ok((path, project))
}

fn run_build(
    config: Option<PathBuf>,
    names: Vec<String>,
    force: bool,
    exclude: Vec<String>,
    env: Vec<String>,
) -> Result<()> {
    let (path, project) = load_project(config)?;
    let working_dir = path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut overrides = ContextOverride::new();
    for pair in &env {
        let (key, value) = ContextOverride::parse_pair(pair)?;
        overrides.set_env(key, value);
    }

    let selected: Vec<ServiceConfig> = if names.is_empty() {
        project.services.clone()
    } else {
        names
            .iter()
            .map(|name| {
                project
                    .service(name)
                    .cloned()
                    .ok_or_else(|| Error::ServiceNotFound(name.clone()))
            })
            .collect::<Result<_>>()?
    };

    let cfg = OperationConfig::new(working_dir).with_exclusions(exclude);
    let builder = Builder::new(&cfg, &overrides);
    let root = Task::root("build");

    wlog!("build: {} services, force={}", selected.len(), force);
    let result = if force {
        selected
            .iter()
            .filter(|s| !cfg.is_excluded(s))
            .try_for_each(|s| builder.build_sync(&root, s, true))
    } else {
        builder.build(&root, &selected)
    };

    output::print_tree(&root);
    result
}

fn run_list(config: Option<PathBuf>) -> Result<()> {
    let (_, project) = load_project(config)?;
    let overrides = ContextOverride::new();

    for service in &project.services {
        let command = service.resolve_command(&overrides)?;
        let build = if service.has_build_step() {
            service.commands.build.as_str()
        } else {
            "-"
        };
        let running = if command.pid != 0 {
            format!("running (pid {})", command.pid)
        } else {
            "stopped".to_string()
        };
        println!(
            "{:<20} {:<24} build: {:<28} launch: {:<16} {}",
            service.name,
            service.path.display(),
            build,
            command.launch_program().unwrap_or("-"),
            running
        );
    }
    Ok(())
}
