use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::TaskError;
use crate::store::KvStore;
use crate::task::{Task, TaskId};
use crate::writer::StoreWriter;

/// Store key holding the whole task list.
pub const TASKS_KEY: &str = "tasksState";

/// Reads and writes the task list as one JSON array under [`TASKS_KEY`].
pub struct TaskRepository {
    store: Arc<dyn KvStore>,
}

impl TaskRepository {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Loads the persisted list. Anything unreadable counts as an empty list.
    #[tracing::instrument(skip(self))]
    pub fn load(&self) -> Vec<Task> {
        let raw = match self.store.get(TASKS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("no stored tasks yet");
                return vec![];
            }
            Err(err) => {
                let error = format!("{err:#}");
                warn!(%error, "failed reading stored tasks; starting empty");
                return vec![];
            }
        };

        match decode(&raw) {
            Ok(tasks) => {
                info!(count = tasks.len(), "loaded tasks");
                tasks
            }
            Err(err) => {
                let error = format!("{err:#}");
                warn!(%error, "stored tasks are malformed; starting empty");
                vec![]
            }
        }
    }

    /// Overwrites the stored list synchronously.
    #[tracing::instrument(skip(self, tasks), fields(count = tasks.len()))]
    pub fn save(&self, tasks: &[Task]) -> anyhow::Result<()> {
        let raw = encode(tasks)?;
        self.store
            .set(TASKS_KEY, &raw)
            .context("failed to save tasks")
    }

    /// Hands the full list to the writer queue without waiting for the write.
    #[tracing::instrument(skip(self, writer, tasks), fields(count = tasks.len()))]
    pub fn save_queued(&self, writer: &StoreWriter, tasks: &[Task]) {
        match encode(tasks) {
            Ok(raw) => writer.submit(TASKS_KEY, raw),
            Err(err) => {
                let error = format!("{err:#}");
                warn!(%error, "failed to serialize tasks; nothing saved");
            }
        }
    }
}

fn decode(raw: &[u8]) -> anyhow::Result<Vec<Task>> {
    let text = std::str::from_utf8(raw).context("stored tasks are not utf-8")?;
    if text.trim().is_empty() || text.trim() == "null" {
        return Ok(vec![]);
    }
    serde_json::from_str(text).context("failed parsing stored tasks")
}

fn encode(tasks: &[Task]) -> anyhow::Result<Vec<u8>> {
    serde_json::to_vec(tasks).context("failed serializing tasks")
}

/// Smallest whole id above every id in the list, so it can't clash with a
/// legacy fractional id either. `None` once the ids have run past `u64::MAX`.
pub fn next_id(tasks: &[Task]) -> Option<TaskId> {
    tasks
        .iter()
        .try_fold(1u64, |next, task| Some(next.max(task.id.successor()?)))
        .map(TaskId::from)
}

/// Appends a new pending task. Blank descriptions are rejected.
pub fn add(
    mut tasks: Vec<Task>,
    description: &str,
    estimate_at: DateTime<Utc>,
) -> Result<Vec<Task>, TaskError> {
    let description = description.trim();
    if description.is_empty() {
        return Err(TaskError::MissingDescription);
    }

    let id = next_id(&tasks).ok_or(TaskError::IdsExhausted)?;
    let task = Task::new_pending(id, description.to_string(), estimate_at);
    debug!(id = %task.id, "task added");
    tasks.push(task);
    Ok(tasks)
}

/// Marks the task done at `now`, or pending again if it was done.
pub fn toggle_done(mut tasks: Vec<Task>, id: TaskId, now: DateTime<Utc>) -> Vec<Task> {
    match tasks.iter_mut().find(|task| task.id == id) {
        Some(task) => {
            task.done_at = match task.done_at {
                Some(_) => None,
                None => Some(now),
            };
            debug!(id = %id, done = task.is_done(), "task toggled");
        }
        None => debug!(id = %id, "toggle ignored; no such task"),
    }
    tasks
}

pub fn remove(mut tasks: Vec<Task>, id: TaskId) -> Vec<Task> {
    let before = tasks.len();
    tasks.retain(|task| task.id != id);
    debug!(id = %id, removed = before - tasks.len(), "task removed");
    tasks
}
