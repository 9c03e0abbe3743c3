use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pipeforge::errors::{GraphError, TaskError};
use pipeforge::watch::TaskRunner;

/// A fake task runner that:
/// - records which tasks were "run" (in completion order)
/// - optionally sleeps before completing, so controller serialization and
///   coalescing are observable
/// - optionally fails named tasks, so error handling can be exercised.
pub struct FakeRunner {
    executed: Arc<Mutex<Vec<String>>>,
    delay: Duration,
    failing: Vec<String>,
}

impl FakeRunner {
    pub fn new(executed: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            executed,
            delay: Duration::ZERO,
            failing: Vec::new(),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_task(mut self, name: &str) -> Self {
        self.failing.push(name.to_string());
        self
    }
}

impl TaskRunner for FakeRunner {
    fn run_task(
        &self,
        name: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), TaskError>> + Send>> {
        let executed = Arc::clone(&self.executed);
        let name = name.to_string();
        let delay = self.delay;
        let fail = self.failing.contains(&name);

        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            executed.lock().unwrap().push(name.clone());
            if fail {
                Err(TaskError::Graph(GraphError::UnknownTask(name)))
            } else {
                Ok(())
            }
        })
    }
}
