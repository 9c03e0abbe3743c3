// src/graph/registry.rs

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::errors::GraphError;
use crate::pipeline::Pipeline;

/// Task names used throughout the graph layer.
pub type TaskName = String;

/// What a task name is bound to: a pipeline, or a composition of other
/// task names.
pub enum TaskUnit {
    Pipeline(Arc<Pipeline>),
    /// Strict left-to-right dependency order.
    Series(Vec<TaskName>),
    /// Concurrent fan-out with a join barrier at the end.
    Parallel(Vec<TaskName>),
}

impl fmt::Debug for TaskUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskUnit::Pipeline(p) => f.debug_tuple("Pipeline").field(&p.name()).finish(),
            TaskUnit::Series(members) => f.debug_tuple("Series").field(members).finish(),
            TaskUnit::Parallel(members) => f.debug_tuple("Parallel").field(members).finish(),
        }
    }
}

impl TaskUnit {
    fn members(&self) -> &[TaskName] {
        match self {
            TaskUnit::Pipeline(_) => &[],
            TaskUnit::Series(members) | TaskUnit::Parallel(members) => members,
        }
    }
}

/// Explicit task registry: an owned value built by the project assembler and
/// handed to the executor. No process-wide singleton, so every test can
/// build a fresh graph.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<TaskName, TaskUnit>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a name to a unit. Names share one namespace; rebinding an
    /// existing name is a broken build description.
    pub fn register(
        &mut self,
        name: impl Into<TaskName>,
        unit: TaskUnit,
    ) -> Result<(), GraphError> {
        let name = name.into();
        if self.tasks.contains_key(&name) {
            return Err(GraphError::DuplicateTask(name));
        }
        self.tasks.insert(name, unit);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TaskUnit> {
        self.tasks.get(name)
    }

    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(|s| s.as_str())
    }

    /// Resolve a name to an executable unit, verifying that every name
    /// reachable from it exists and that no name is revisited while still
    /// on the resolution stack. Runs before execution, so a cyclic or
    /// dangling graph fails fast instead of hanging mid-build.
    pub fn resolve(&self, name: &str) -> Result<&TaskUnit, GraphError> {
        let mut stack = Vec::new();
        self.check(name, &mut stack)?;
        self.tasks
            .get(name)
            .ok_or_else(|| GraphError::UnknownTask(name.to_string()))
    }

    fn check(&self, name: &str, stack: &mut Vec<TaskName>) -> Result<(), GraphError> {
        if stack.iter().any(|on_stack| on_stack == name) {
            let mut chain = stack.clone();
            chain.push(name.to_string());
            return Err(GraphError::CyclicDependency { chain });
        }

        let unit = self
            .tasks
            .get(name)
            .ok_or_else(|| GraphError::UnknownTask(name.to_string()))?;

        stack.push(name.to_string());
        for member in unit.members() {
            self.check(member, stack)?;
        }
        stack.pop();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(members: &[&str]) -> TaskUnit {
        TaskUnit::Series(members.iter().map(|s| s.to_string()).collect())
    }

    fn parallel(members: &[&str]) -> TaskUnit {
        TaskUnit::Parallel(members.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = TaskRegistry::new();
        registry.register("build", series(&[])).unwrap();
        let err = registry.register("build", series(&[])).unwrap_err();
        assert_eq!(err, GraphError::DuplicateTask("build".into()));
    }

    #[test]
    fn unknown_member_is_reported() {
        let mut registry = TaskRegistry::new();
        registry.register("build", series(&["missing"])).unwrap();
        let err = registry.resolve("build").unwrap_err();
        assert_eq!(err, GraphError::UnknownTask("missing".into()));
    }

    #[test]
    fn acyclic_diamond_resolves() {
        let mut registry = TaskRegistry::new();
        registry.register("leaf", series(&[])).unwrap();
        registry.register("left", series(&["leaf"])).unwrap();
        registry.register("right", parallel(&["leaf"])).unwrap();
        registry
            .register("top", parallel(&["left", "right"]))
            .unwrap();

        assert!(registry.resolve("top").is_ok());
    }

    #[test]
    fn direct_cycle_is_detected() {
        let mut registry = TaskRegistry::new();
        registry.register("a", series(&["a"])).unwrap();
        let err = registry.resolve("a").unwrap_err();
        assert!(matches!(err, GraphError::CyclicDependency { .. }));
    }

    #[test]
    fn transitive_cycle_reports_chain() {
        let mut registry = TaskRegistry::new();
        registry.register("a", series(&["b"])).unwrap();
        registry.register("b", parallel(&["c"])).unwrap();
        registry.register("c", series(&["a"])).unwrap();

        match registry.resolve("a").unwrap_err() {
            GraphError::CyclicDependency { chain } => {
                assert_eq!(chain, vec!["a", "b", "c", "a"]);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }
}
