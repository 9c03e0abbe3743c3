// src/config/validate.rs

use anyhow::{anyhow, Context, Result};
use globset::Glob;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use regex::Regex;

use crate::config::model::{ConfigFile, StepConfig, TaskConfig};

/// Semantic validation of a parsed build description.
///
/// Checks:
/// - there is at least one pipeline or task
/// - pipeline `src`/`dest` are non-empty and all globs compile
/// - step options are in range (quality, precision, non-empty suffix, valid
///   replace regex)
/// - every `[task.*]` binds exactly one of `pipeline` / `series` / `parallel`
/// - every referenced name exists (pipelines and tasks share one namespace)
/// - the composition graph is acyclic
/// - watch bindings reference existing tasks and valid globs
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    ensure_has_work(cfg)?;
    validate_pipelines(cfg)?;
    validate_tasks(cfg)?;
    validate_dag(cfg)?;
    validate_watches(cfg)?;
    Ok(())
}

fn ensure_has_work(cfg: &ConfigFile) -> Result<()> {
    if cfg.pipeline.is_empty() && cfg.task.is_empty() {
        return Err(anyhow!(
            "build description must contain at least one [pipeline.<name>] or [task.<name>] section"
        ));
    }
    Ok(())
}

fn validate_pipelines(cfg: &ConfigFile) -> Result<()> {
    for (name, pipeline) in cfg.pipeline.iter() {
        if pipeline.src.is_empty() {
            return Err(anyhow!("pipeline '{}' has an empty `src` list", name));
        }
        if pipeline.dest.is_empty() {
            return Err(anyhow!("pipeline '{}' has an empty `dest` list", name));
        }

        for pattern in pipeline.src.iter().chain(pipeline.exclude.iter()) {
            Glob::new(pattern)
                .with_context(|| format!("pipeline '{}': invalid glob '{}'", name, pattern))?;
        }

        for step in &pipeline.steps {
            validate_step(name, step)?;
        }
    }
    Ok(())
}

fn validate_step(pipeline: &str, step: &StepConfig) -> Result<()> {
    match step {
        StepConfig::ReencodeImage { quality, .. } if *quality > 100 => Err(anyhow!(
            "pipeline '{}': reencode-image quality must be 0-100 (got {})",
            pipeline,
            quality
        )),
        StepConfig::MinifySvg { precision } if *precision > 10 => Err(anyhow!(
            "pipeline '{}': minify-svg precision must be <= 10 (got {})",
            pipeline,
            precision
        )),
        StepConfig::Rename { suffix } if suffix.is_empty() => Err(anyhow!(
            "pipeline '{}': rename suffix must not be empty",
            pipeline
        )),
        StepConfig::Concat { output } if output.is_empty() => Err(anyhow!(
            "pipeline '{}': concat output must not be empty",
            pipeline
        )),
        StepConfig::Replace { pattern, .. } => {
            Regex::new(pattern).with_context(|| {
                format!("pipeline '{}': invalid replace pattern '{}'", pipeline, pattern)
            })?;
            Ok(())
        }
        _ => Ok(()),
    }
}

fn task_members(task: &TaskConfig) -> &[String] {
    if let Some(series) = &task.series {
        series.as_slice()
    } else if let Some(parallel) = &task.parallel {
        parallel.as_slice()
    } else {
        &[]
    }
}

fn name_exists(cfg: &ConfigFile, name: &str) -> bool {
    cfg.pipeline.contains_key(name) || cfg.task.contains_key(name)
}

fn validate_tasks(cfg: &ConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        let bound = [
            task.pipeline.is_some(),
            task.series.is_some(),
            task.parallel.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count();
        if bound != 1 {
            return Err(anyhow!(
                "task '{}' must set exactly one of `pipeline`, `series`, `parallel`",
                name
            ));
        }

        // Pipelines are runnable under their own names, so a [task.<name>]
        // shadowing a pipeline would be a duplicate registration.
        if cfg.pipeline.contains_key(name) {
            return Err(anyhow!(
                "task '{}' collides with a pipeline of the same name",
                name
            ));
        }

        if let Some(pipeline) = &task.pipeline {
            if !cfg.pipeline.contains_key(pipeline) {
                return Err(anyhow!(
                    "task '{}' references unknown pipeline '{}'",
                    name,
                    pipeline
                ));
            }
        }

        for member in task_members(task) {
            if !name_exists(cfg, member) {
                return Err(anyhow!(
                    "task '{}' references unknown member '{}'",
                    name,
                    member
                ));
            }
            if member == name {
                return Err(anyhow!("task '{}' cannot contain itself", name));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &ConfigFile) -> Result<()> {
    // Edge direction: member -> composite. A toposort failure is a cycle.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.pipeline.keys() {
        graph.add_node(name.as_str());
    }
    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for member in task_members(task) {
            graph.add_edge(member.as_str(), name.as_str(), ());
        }
        if let Some(pipeline) = &task.pipeline {
            graph.add_edge(pipeline.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(anyhow!(
            "cycle detected in task graph involving '{}'",
            cycle.node_id()
        )),
    }
}

fn validate_watches(cfg: &ConfigFile) -> Result<()> {
    for watch in &cfg.watch {
        if watch.glob.is_empty() {
            return Err(anyhow!(
                "watch binding for task '{}' has an empty glob list",
                watch.task
            ));
        }
        for pattern in &watch.glob {
            Glob::new(pattern).with_context(|| {
                format!("watch binding for task '{}': invalid glob '{}'", watch.task, pattern)
            })?;
        }
        if !name_exists(cfg, &watch.task) {
            return Err(anyhow!(
                "watch binding references unknown task '{}'",
                watch.task
            ));
        }
    }
    Ok(())
}
