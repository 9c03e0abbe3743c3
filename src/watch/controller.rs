// src/watch/controller.rs

//! The watch controller: maps filesystem events onto task re-execution.
//!
//! Per binding, at most one run is ever in flight. Events arriving while a
//! run is active set a single pending flag; when the run finishes, exactly
//! one follow-up run starts (trailing-edge coalescing), no matter how many
//! events were received meanwhile. Runs for *different* bindings proceed
//! concurrently.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::errors::TaskError;
use crate::graph::{self, TaskRegistry};
use crate::watch::patterns::BindingProfile;

/// Events flowing into the controller loop.
#[derive(Debug)]
pub enum WatchEvent {
    /// A filesystem change at a path relative to the project root
    /// (forward-slashed).
    PathChanged(String),
    /// A triggered run for the binding at `index` finished.
    RunFinished {
        index: usize,
        outcome: Result<(), TaskError>,
    },
    /// External shutdown signal (Ctrl-C).
    Shutdown,
}

/// Executes a named task on behalf of the controller. Seam for tests: the
/// real implementation drives the task registry, fakes record invocations.
pub trait TaskRunner: Send + Sync {
    fn run_task(
        &self,
        name: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), TaskError>> + Send>>;
}

/// Runner backed by the task registry.
pub struct RegistryRunner {
    registry: Arc<TaskRegistry>,
}

impl RegistryRunner {
    pub fn new(registry: Arc<TaskRegistry>) -> Self {
        Self { registry }
    }
}

impl TaskRunner for RegistryRunner {
    fn run_task(
        &self,
        name: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), TaskError>> + Send>> {
        let registry = Arc::clone(&self.registry);
        let name = name.to_string();
        Box::pin(async move { graph::execute(registry, &name).await })
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct BindingState {
    running: bool,
    pending: bool,
}

pub struct WatchController {
    profiles: Vec<BindingProfile>,
    states: Vec<BindingState>,
    runner: Arc<dyn TaskRunner>,
    events_rx: mpsc::Receiver<WatchEvent>,
    events_tx: mpsc::Sender<WatchEvent>,
}

impl WatchController {
    /// `events_tx` must be a sender for the same channel as `events_rx`;
    /// the controller uses it to report run completions back to itself.
    pub fn new(
        profiles: Vec<BindingProfile>,
        runner: Arc<dyn TaskRunner>,
        events_rx: mpsc::Receiver<WatchEvent>,
        events_tx: mpsc::Sender<WatchEvent>,
    ) -> Self {
        let states = vec![BindingState::default(); profiles.len()];
        Self {
            profiles,
            states,
            runner,
            events_rx,
            events_tx,
        }
    }

    /// Main loop. Returns once a shutdown event has been received and every
    /// in-flight run has finished; pending-but-unstarted re-runs are
    /// discarded on shutdown, in-flight runs are never aborted mid-write.
    pub async fn run(mut self) -> Result<()> {
        info!(bindings = self.profiles.len(), "watch controller started");
        let mut shutting_down = false;

        while let Some(event) = self.events_rx.recv().await {
            match event {
                WatchEvent::PathChanged(rel) => {
                    if shutting_down {
                        continue;
                    }
                    self.handle_path_changed(&rel);
                }
                WatchEvent::RunFinished { index, outcome } => {
                    self.handle_run_finished(index, outcome, shutting_down);
                }
                WatchEvent::Shutdown => {
                    info!("shutdown requested; letting in-flight runs finish");
                    shutting_down = true;
                    for state in &mut self.states {
                        state.pending = false;
                    }
                }
            }

            if shutting_down && self.states.iter().all(|state| !state.running) {
                break;
            }
        }

        info!("watch controller exiting");
        Ok(())
    }

    fn handle_path_changed(&mut self, rel: &str) {
        for index in 0..self.profiles.len() {
            if !self.profiles[index].matches(rel) {
                continue;
            }
            let task = self.profiles[index].task().to_string();
            if self.states[index].running {
                self.states[index].pending = true;
                debug!(task = %task, path = rel, "run in flight; coalescing into one follow-up");
            } else {
                debug!(task = %task, path = rel, "watch match; starting run");
                self.start_run(index);
            }
        }
    }

    fn handle_run_finished(
        &mut self,
        index: usize,
        outcome: Result<(), TaskError>,
        shutting_down: bool,
    ) {
        let task = self.profiles[index].task().to_string();
        match outcome {
            Ok(()) => info!(task = %task, "triggered run finished"),
            // A bad input must never bring the watch session down; log and
            // keep watching.
            Err(err) => {
                for leaf in err.leaves() {
                    error!(task = %task, "triggered run failed: {leaf}");
                }
            }
        }

        self.states[index].running = false;
        if self.states[index].pending && !shutting_down {
            self.states[index].pending = false;
            debug!(task = %task, "starting coalesced follow-up run");
            self.start_run(index);
        }
    }

    fn start_run(&mut self, index: usize) {
        self.states[index].running = true;
        let task = self.profiles[index].task().to_string();
        let tx = self.events_tx.clone();
        let fut = self.runner.run_task(&task);

        tokio::spawn(async move {
            let outcome = fut.await;
            if tx
                .send(WatchEvent::RunFinished { index, outcome })
                .await
                .is_err()
            {
                warn!(task = %task, "controller channel closed before completion report");
            }
        });
    }
}
