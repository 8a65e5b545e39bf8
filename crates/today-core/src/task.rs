use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Task identifier, kept as the exact JSON number found in storage.
///
/// Lists written by older clients carry random fractional ids such as
/// `0.4217`; those load and save unchanged next to the integer ids this crate
/// hands out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct TaskId(Number);

impl TaskId {
    /// Smallest whole id strictly greater than this one, `None` past `u64::MAX`.
    pub fn successor(&self) -> Option<u64> {
        if let Some(n) = self.0.as_u64() {
            return n.checked_add(1);
        }
        if self.0.is_i64() {
            return Some(1);
        }
        let f = self.0.as_f64()?;
        if f < 0.0 {
            return Some(1);
        }
        let next = f.floor() + 1.0;
        if next >= u64::MAX as f64 {
            return None;
        }
        Some(next as u64)
    }
}

impl From<u64> for TaskId {
    fn from(n: u64) -> Self {
        TaskId(Number::from(n))
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid task id: {0:?}")]
pub struct ParseTaskIdError(String);

impl std::str::FromStr for TaskId {
    type Err = ParseTaskIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(n) = s.parse::<u64>() {
            return Ok(TaskId::from(n));
        }
        if let Ok(n) = s.parse::<i64>() {
            return Ok(TaskId(Number::from(n)));
        }
        s.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(TaskId)
            .ok_or_else(|| ParseTaskIdError(s.to_string()))
    }
}

/// A single entry of the list, stored as one object of the persisted JSON array.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,

    pub description: String,

    pub estimate_at: DateTime<Utc>,

    #[serde(default)]
    pub done_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new_pending(id: TaskId, description: String, estimate_at: DateTime<Utc>) -> Self {
        Self {
            id,
            description,
            estimate_at,
            done_at: None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.done_at.is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.done_at.is_none()
    }

    /// A task still pending after its estimate is late.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_pending() && self.estimate_at < now
    }
}
