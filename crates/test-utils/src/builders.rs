#![allow(dead_code)]

use pipeforge::config::{ConfigFile, PipelineConfig, StepConfig, TaskConfig, WatchConfig};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: ConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: ConfigFile::default(),
        }
    }

    pub fn with_pipeline(mut self, name: &str, pipeline: PipelineConfig) -> Self {
        self.config.pipeline.insert(name.to_string(), pipeline);
        self
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_watch(mut self, globs: &[&str], task: &str) -> Self {
        self.config.watch.push(WatchConfig {
            glob: globs.iter().map(|s| s.to_string()).collect(),
            task: task.to_string(),
        });
        self
    }

    pub fn build(self) -> ConfigFile {
        self.config
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `PipelineConfig`.
pub struct PipelineConfigBuilder {
    pipeline: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn new() -> Self {
        Self {
            pipeline: PipelineConfig {
                src: vec![],
                exclude: vec![],
                steps: vec![],
                dest: vec![],
            },
        }
    }

    pub fn src(mut self, pattern: &str) -> Self {
        self.pipeline.src.push(pattern.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.pipeline.exclude.push(pattern.to_string());
        self
    }

    pub fn step(mut self, step: StepConfig) -> Self {
        self.pipeline.steps.push(step);
        self
    }

    pub fn dest(mut self, path: &str) -> Self {
        self.pipeline.dest.push(path.to_string());
        self
    }

    pub fn build(self) -> PipelineConfig {
        self.pipeline
    }
}

impl Default for PipelineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Task bound to a single pipeline.
pub fn pipeline_task(pipeline: &str) -> TaskConfig {
    TaskConfig {
        pipeline: Some(pipeline.to_string()),
        series: None,
        parallel: None,
    }
}

/// Task executing members strictly left to right.
pub fn series_task(members: &[&str]) -> TaskConfig {
    TaskConfig {
        pipeline: None,
        series: Some(members.iter().map(|s| s.to_string()).collect()),
        parallel: None,
    }
}

/// Task executing members concurrently with a join at the end.
pub fn parallel_task(members: &[&str]) -> TaskConfig {
    TaskConfig {
        pipeline: None,
        series: None,
        parallel: Some(members.iter().map(|s| s.to_string()).collect()),
    }
}
