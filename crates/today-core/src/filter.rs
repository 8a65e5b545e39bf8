use tracing::trace;

use crate::task::Task;

/// Tasks shown to the user. Done tasks are hidden unless `show_done` is set;
/// relative order is kept either way.
#[tracing::instrument(skip(tasks))]
pub fn visible(
  tasks: &[Task],
  show_done: bool
) -> Vec<Task> {
  let out: Vec<Task> = if show_done {
    tasks.to_vec()
  } else {
    tasks
      .iter()
      .filter(|task| task.is_pending())
      .cloned()
      .collect()
  };

  trace!(
    total = tasks.len(),
    shown = out.len(),
    "computed visible tasks"
  );
  out
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct FilterSummary {
  pub total:   usize,
  pub pending: usize,
  pub done:    usize
}

impl FilterSummary {
  pub fn of(tasks: &[Task]) -> Self {
    let done = tasks
      .iter()
      .filter(|task| task.is_done())
      .count();
    Self {
      total: tasks.len(),
      pending: tasks.len() - done,
      done
    }
  }
}
