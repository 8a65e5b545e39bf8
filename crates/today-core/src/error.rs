/// Title of the alert shown when a task cannot be added.
pub const INVALID_DATA_TITLE: &str = "Invalid data";

/// Errors returned by the screen controller and the task repository.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// The add form was submitted with an empty or blank description.
    #[error("Description was not provided")]
    MissingDescription,

    /// A command arrived before the task list finished loading.
    #[error("task list is not loaded yet")]
    NotReady,

    /// `mount` was called on a controller that already left `Uninitialized`.
    #[error("task list was already mounted")]
    AlreadyMounted,

    /// Every whole id up to `u64::MAX` is taken.
    #[error("no task id left to assign")]
    IdsExhausted,
}

impl TaskError {
    /// Whether the error is the user's to fix; these are reported through an alert.
    pub fn is_validation(&self) -> bool {
        matches!(self, TaskError::MissingDescription)
    }
}

/// A blocking message for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn from_error(err: &TaskError) -> Self {
        Self {
            title: INVALID_DATA_TITLE.to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Alert, TaskError};

    #[test]
    fn missing_description_alert_text() {
        let alert = Alert::from_error(&TaskError::MissingDescription);
        assert_eq!(alert.title, "Invalid data");
        assert_eq!(alert.message, "Description was not provided");
        assert!(TaskError::MissingDescription.is_validation());
        assert!(!TaskError::NotReady.is_validation());
        assert!(!TaskError::IdsExhausted.is_validation());
    }
}
