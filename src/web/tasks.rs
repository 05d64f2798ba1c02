//! In-memory registry of background analyses.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::matching::CountRow;

/// What a finished analysis hands back to clients
#[derive(Debug, Clone, Serialize)]
pub struct TaskOutput {
    /// Fully matched count rows
    pub results: Vec<CountRow>,

    /// Report files by name, as CSV text
    pub attachments: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub enum TaskState {
    Running,
    Ready(Box<TaskOutput>),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub id: u64,
    pub run_id: String,
    pub season: Option<String>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub state: TaskState,
}

/// How long a finished task stays available to pollers
pub const DEFAULT_RETENTION_MINUTES: i64 = 60;

/// Upper bound on finished tasks kept at once
pub const MAX_FINISHED_TASKS: usize = 256;

/// Task ids are assigned sequentially from 1. Finished tasks are dropped once
/// they are older than the retention period or exceed the finished-task cap;
/// running tasks are never dropped.
#[derive(Debug)]
pub struct TaskRegistry {
    next_id: AtomicU64,
    tasks: Mutex<HashMap<u64, TaskRecord>>,
    retention: Duration,
    max_finished: usize,
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(Duration::minutes(DEFAULT_RETENTION_MINUTES), MAX_FINISHED_TASKS)
    }

    #[must_use]
    pub fn with_limits(retention: Duration, max_finished: usize) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            tasks: Mutex::new(HashMap::new()),
            retention,
            max_finished,
        }
    }

    // A panic while holding the lock leaves the map itself intact
    fn lock(&self) -> MutexGuard<'_, HashMap<u64, TaskRecord>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a running task and return its id
    pub fn create(&self, run_id: &str, season: Option<String>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut tasks = self.lock();
        self.prune(&mut tasks, Utc::now());
        tasks.insert(
            id,
            TaskRecord {
                id,
                run_id: run_id.to_string(),
                season,
                created_at: Utc::now(),
                finished_at: None,
                state: TaskState::Running,
            },
        );
        id
    }

    pub fn complete(&self, id: u64, output: TaskOutput) {
        self.finish(id, TaskState::Ready(Box::new(output)));
    }

    pub fn fail(&self, id: u64, error: impl Into<String>) {
        self.finish(id, TaskState::Failed(error.into()));
    }

    fn finish(&self, id: u64, state: TaskState) {
        if let Some(task) = self.lock().get_mut(&id) {
            task.state = state;
            task.finished_at = Some(Utc::now());
        }
    }

    /// Drop expired finished tasks, then the oldest ones beyond the cap
    fn prune(&self, tasks: &mut HashMap<u64, TaskRecord>, now: DateTime<Utc>) {
        tasks.retain(|_, t| match t.finished_at {
            Some(finished) => now.signed_duration_since(finished) < self.retention,
            None => true,
        });

        let mut finished: Vec<(DateTime<Utc>, u64)> = tasks
            .values()
            .filter_map(|t| t.finished_at.map(|f| (f, t.id)))
            .collect();
        if finished.len() > self.max_finished {
            finished.sort_unstable();
            let excess = finished.len() - self.max_finished;
            for (_, id) in &finished[..excess] {
                tasks.remove(id);
            }
        }
    }

    /// Number of tasks held, running or finished
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    #[must_use]
    pub fn get(&self, id: u64) -> Option<TaskRecord> {
        self.lock().get(&id).cloned()
    }

    /// Number of tasks still running
    #[must_use]
    pub fn running(&self) -> usize {
        self.lock()
            .values()
            .filter(|t| matches!(t.state, TaskState::Running))
            .count()
    }
}
