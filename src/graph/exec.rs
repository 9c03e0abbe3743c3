// src/graph/exec.rs

//! Task execution semantics over a [`TaskRegistry`].
//!
//! - pipeline unit: run it, wrapping any transform failure with the task name
//! - `series`: strict left-to-right; the first failure stops the chain and
//!   later members never start
//! - `parallel`: all members start together; the composite joins on all of
//!   them and reports *every* member failure, not just the first

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::debug;

use crate::errors::{GraphError, TaskError};
use crate::graph::registry::{TaskRegistry, TaskUnit};

/// Execute a named task to completion.
///
/// Resolution (existence and acyclicity of everything reachable) happens
/// up front, before any pipeline runs.
pub async fn execute(registry: Arc<TaskRegistry>, name: &str) -> Result<(), TaskError> {
    registry.resolve(name)?;
    execute_unit(registry, name.to_string()).await
}

fn execute_unit(
    registry: Arc<TaskRegistry>,
    name: String,
) -> Pin<Box<dyn Future<Output = Result<(), TaskError>> + Send>> {
    Box::pin(async move {
        let unit = match registry.get(&name) {
            Some(unit) => unit,
            None => return Err(GraphError::UnknownTask(name).into()),
        };

        match unit {
            TaskUnit::Pipeline(pipeline) => {
                debug!(task = %name, "running pipeline task");
                let pipeline = Arc::clone(pipeline);
                pipeline
                    .run()
                    .await
                    .map(|_| ())
                    .map_err(|source| TaskError::Pipeline { task: name, source })
            }
            TaskUnit::Series(members) => {
                for member in members.clone() {
                    debug!(task = %name, member = %member, "series member starting");
                    execute_unit(Arc::clone(&registry), member).await?;
                }
                Ok(())
            }
            TaskUnit::Parallel(members) => {
                let mut set = JoinSet::new();
                for member in members.clone() {
                    debug!(task = %name, member = %member, "parallel member starting");
                    let registry = Arc::clone(&registry);
                    set.spawn(async move { execute_unit(registry, member).await });
                }

                let mut errors = Vec::new();
                while let Some(joined) = set.join_next().await {
                    match joined {
                        Ok(Ok(())) => {}
                        Ok(Err(err)) => errors.push(err),
                        Err(join_err) => errors.push(TaskError::Aborted {
                            task: name.clone(),
                            message: join_err.to_string(),
                        }),
                    }
                }

                if errors.is_empty() {
                    Ok(())
                } else {
                    Err(TaskError::Parallel { task: name, errors })
                }
            }
        }
    })
}
