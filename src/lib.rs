// src/lib.rs

pub mod cache;
pub mod cli;
pub mod config;
pub mod errors;
pub mod graph;
pub mod logging;
pub mod pipeline;
pub mod project;
pub mod transform;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::config::model::ConfigFile;
use crate::errors::TaskError;
use crate::project::Project;
use crate::watch::{compile_bindings, spawn_fs_watcher, RegistryRunner, WatchController, WatchEvent};

/// Task run when the CLI does not name one.
pub const DEFAULT_TASK: &str = "default";

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading + validation
/// - project assembly (pipelines, registry, bindings)
/// - one-off task execution
/// - (optional) the watch session with Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let config_dir = config_root_dir(&config_path);
    let project = Project::from_config(&cfg, &config_dir)?;

    let task = args.task.as_deref().unwrap_or(DEFAULT_TASK);
    info!(task = %task, "executing task");
    let initial = project.execute(task).await;

    if !args.watch {
        return match initial {
            Ok(()) => Ok(()),
            Err(err) => {
                report_task_error(&err);
                Err(anyhow!("task '{task}' failed"))
            }
        };
    }

    // In a watch session a failing initial build is logged, not fatal; the
    // session keeps watching so the next edit can fix it.
    if let Err(err) = initial {
        report_task_error(&err);
    }

    watch_session(&project).await
}

async fn watch_session(project: &Project) -> Result<()> {
    let profiles = compile_bindings(project.bindings())?;
    if profiles.is_empty() {
        bail!("watch mode requested but the build description declares no [[watch]] bindings");
    }

    let (events_tx, events_rx) = mpsc::channel::<WatchEvent>(64);

    let _watcher = spawn_fs_watcher(project.root(), events_tx.clone())?;

    // Ctrl-C -> graceful shutdown.
    {
        let tx = events_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(WatchEvent::Shutdown).await;
        });
    }

    let runner = Arc::new(RegistryRunner::new(Arc::clone(project.registry())));
    let controller = WatchController::new(profiles, runner, events_rx, events_tx);
    controller.run().await
}

/// Print every collected failure with enough context (task, file, cause) to
/// locate it.
fn report_task_error(err: &TaskError) {
    for leaf in err.leaves() {
        match leaf {
            TaskError::Pipeline { task, source } => error!(task = %task, "{source}"),
            other => error!("{other}"),
        }
    }
}

/// Directory containing the config file, or `.`; all project-relative paths
/// resolve against it.
fn config_root_dir(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Simple dry-run output: print pipelines, tasks and watch bindings.
fn print_dry_run(cfg: &ConfigFile) {
    println!("pipeforge dry-run");
    println!();

    println!("pipelines ({}):", cfg.pipeline.len());
    for (name, pipeline) in cfg.pipeline.iter() {
        println!("  - {name}");
        println!("      src: {:?}", pipeline.src);
        if !pipeline.exclude.is_empty() {
            println!("      exclude: {:?}", pipeline.exclude);
        }
        let kinds: Vec<&str> = pipeline.steps.iter().map(|s| s.kind()).collect();
        println!("      steps: {kinds:?}");
        println!("      dest: {:?}", pipeline.dest);
    }

    println!();
    println!("tasks ({}):", cfg.task.len());
    for (name, task) in cfg.task.iter() {
        if let Some(pipeline) = &task.pipeline {
            println!("  - {name}: pipeline {pipeline}");
        } else if let Some(series) = &task.series {
            println!("  - {name}: series {series:?}");
        } else if let Some(parallel) = &task.parallel {
            println!("  - {name}: parallel {parallel:?}");
        }
    }

    if !cfg.watch.is_empty() {
        println!();
        println!("watch bindings ({}):", cfg.watch.len());
        for watch in &cfg.watch {
            println!("  - {:?} -> {}", watch.glob, watch.task);
        }
    }
}
