use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::error::{Alert, TaskError};
use crate::filter::visible;
use crate::repository::{self, TaskRepository};
use crate::store::KvStore;
use crate::task::{Task, TaskId};
use crate::writer::StoreWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenState {
    Uninitialized,
    Loading,
    Ready,
}

/// What the add-task form hands back when the user saves it.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub description: String,
    pub date: DateTime<Utc>,
}

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send>;

/// Owns the task list of one screen: loads it once, applies user commands,
/// keeps the visible subset current and persists the whole list after every
/// change.
pub struct ScreenController {
    repo: TaskRepository,
    writer: StoreWriter,
    clock: Clock,
    state: ScreenState,
    tasks: Vec<Task>,
    visible_tasks: Vec<Task>,
    show_done_tasks: bool,
    show_add_task: bool,
    alert: Option<Alert>,
}

impl ScreenController {
    pub fn new(store: Arc<dyn KvStore>) -> anyhow::Result<Self> {
        let writer = StoreWriter::spawn(Arc::clone(&store))?;
        Ok(Self {
            repo: TaskRepository::new(store),
            writer,
            clock: Box::new(Utc::now),
            state: ScreenState::Uninitialized,
            tasks: vec![],
            visible_tasks: vec![],
            show_done_tasks: true,
            show_add_task: false,
            alert: None,
        })
    }

    /// Replaces the wall clock used to stamp completed tasks.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + 'static,
    {
        self.clock = Box::new(clock);
        self
    }

    #[instrument(skip(self))]
    pub fn mount(&mut self) -> Result<(), TaskError> {
        if self.state != ScreenState::Uninitialized {
            return Err(TaskError::AlreadyMounted);
        }

        self.state = ScreenState::Loading;
        self.tasks = self.repo.load();
        self.show_done_tasks = true;
        self.visible_tasks = visible(&self.tasks, self.show_done_tasks);
        self.state = ScreenState::Ready;

        info!(count = self.tasks.len(), "task list ready");
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn toggle_task(&mut self, id: TaskId) -> Result<(), TaskError> {
        self.ensure_ready()?;
        let now = (self.clock)();
        let tasks = repository::toggle_done(std::mem::take(&mut self.tasks), id, now);
        self.commit(tasks);
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn toggle_filter(&mut self) -> Result<(), TaskError> {
        self.ensure_ready()?;
        self.show_done_tasks = !self.show_done_tasks;
        debug!(show_done = self.show_done_tasks, "filter toggled");
        self.refresh_and_save();
        Ok(())
    }

    pub fn open_add_task(&mut self) {
        self.show_add_task = true;
    }

    pub fn cancel_add_task(&mut self) {
        self.show_add_task = false;
    }

    /// Adds the task from the form. A blank description raises the
    /// "Invalid data" alert and leaves everything as it was.
    #[instrument(skip(self, new_task))]
    pub fn add_task(&mut self, new_task: NewTask) -> Result<TaskId, TaskError> {
        self.ensure_ready()?;

        let tasks = match repository::add(
            self.tasks.clone(),
            &new_task.description,
            new_task.date,
        ) {
            Ok(tasks) => tasks,
            Err(err) => {
                warn!(error = %err, "rejected new task");
                if err.is_validation() {
                    self.alert = Some(Alert::from_error(&err));
                }
                return Err(err);
            }
        };

        let Some(id) = tasks.last().map(|task| task.id.clone()) else {
            return Err(TaskError::IdsExhausted);
        };
        self.show_add_task = false;
        self.commit(tasks);
        Ok(id)
    }

    #[instrument(skip(self))]
    pub fn delete_task(&mut self, id: TaskId) -> Result<(), TaskError> {
        self.ensure_ready()?;
        let tasks = repository::remove(std::mem::take(&mut self.tasks), id);
        self.commit(tasks);
        Ok(())
    }

    /// Waits for every write issued so far to reach the store.
    pub fn flush(&self) {
        self.writer.flush();
    }

    pub fn state(&self) -> ScreenState {
        self.state
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn visible_tasks(&self) -> &[Task] {
        &self.visible_tasks
    }

    pub fn show_done_tasks(&self) -> bool {
        self.show_done_tasks
    }

    pub fn is_add_task_open(&self) -> bool {
        self.show_add_task
    }

    /// The pending alert, if any. Taking it dismisses it.
    pub fn take_alert(&mut self) -> Option<Alert> {
        self.alert.take()
    }

    fn ensure_ready(&self) -> Result<(), TaskError> {
        match self.state {
            ScreenState::Ready => Ok(()),
            _ => Err(TaskError::NotReady),
        }
    }

    fn commit(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        self.refresh_and_save();
    }

    fn refresh_and_save(&mut self) {
        self.visible_tasks = visible(&self.tasks, self.show_done_tasks);
        self.repo.save_queued(&self.writer, &self.tasks);
    }
}
