use camino::Utf8Path;

use crate::models::{Severity, Task};

/// Observer for tasks discovered by a parser chain.
///
/// A sink is borrowed for the duration of each pipeline call and handed down
/// the chain, so subscribing at the head observes every descendant's tasks.
/// The directory events default to no-ops; plain task consumers only need
/// [`on_task`](Self::on_task).
pub trait TaskSink {
    fn on_task(&mut self, task: Task);

    /// A parser saw the build enter `dir` (GNU make prints these).
    fn on_search_dir_entered(&mut self, _dir: &Utf8Path) {}

    /// A parser saw the build leave `dir`.
    fn on_search_dir_left(&mut self, _dir: &Utf8Path) {}
}

impl<F: FnMut(Task)> TaskSink for F {
    fn on_task(&mut self, task: Task) {
        self(task)
    }
}

/// Sink that stores every task in arrival order.
#[derive(Debug, Default)]
pub struct TaskCollector {
    pub tasks: Vec<Task>,
}

impl TaskCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tally(&self) -> TaskTally {
        let mut tally = TaskTally::default();
        for task in &self.tasks {
            tally.record(task);
        }
        tally
    }
}

impl TaskSink for TaskCollector {
    fn on_task(&mut self, task: Task) {
        self.tasks.push(task);
    }
}

/// Counts of discovered tasks by severity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskTally {
    pub errors: usize,
    pub warnings: usize,
    pub unknowns: usize,
}

impl TaskTally {
    pub fn record(&mut self, task: &Task) {
        match task.severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Unknown => self.unknowns += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.errors + self.warnings + self.unknowns
    }

    pub fn has_findings(&self) -> bool {
        self.total() > 0
    }

    /// Get a summary string of what was found
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        if self.errors > 0 {
            parts.push(format!("{} errors", self.errors));
        }
        if self.warnings > 0 {
            parts.push(format!("{} warnings", self.warnings));
        }
        if self.unknowns > 0 {
            parts.push(format!("{} notes", self.unknowns));
        }

        if parts.is_empty() {
            "No diagnostics found".to_string()
        } else {
            parts.join(", ")
        }
    }
}

impl TaskSink for TaskTally {
    fn on_task(&mut self, task: Task) {
        self.record(&task);
    }
}
