/// Habit lifecycle operations
///
/// Each operation turns a caller's request into a typed candidate, runs the
/// habit rules against it and only then touches storage. A rejected request
/// never writes anything.

pub mod create;
pub mod update;
pub mod delete;
pub mod query;

// Re-export operation functions for easy access
pub use create::*;
pub use update::*;
pub use delete::*;
pub use query::*;

use thiserror::Error;
use crate::domain::{validate, DomainError, Habit, HabitDraft, HabitId, Rejection, UserId};
use crate::storage::{HabitStorage, StorageError};

/// Errors returned by lifecycle operations
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(#[from] DomainError),

    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error("Habit not found: {habit_id}")]
    NotFound { habit_id: String },

    #[error("Storage error: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for LifecycleError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::HabitNotFound { habit_id } => LifecycleError::NotFound { habit_id },
            other => LifecycleError::Storage(other),
        }
    }
}

/// Load a habit only if it belongs to the given owner
///
/// Someone else's habit looks exactly like a missing one.
pub(crate) fn load_owned<S: HabitStorage>(
    storage: &S,
    owner: UserId,
    habit_id: &HabitId,
) -> Result<Habit, LifecycleError> {
    storage
        .find_habit(habit_id)?
        .filter(|habit| habit.owner == owner)
        .ok_or_else(|| LifecycleError::NotFound {
            habit_id: habit_id.to_string(),
        })
}

/// Run the habit rules against a candidate
///
/// The related habit is looked up once, scoped to the candidate's owner, and
/// handed to the rules through a resolver closure.
pub(crate) fn check_draft<S: HabitStorage>(
    storage: &S,
    draft: &HabitDraft,
) -> Result<(), LifecycleError> {
    let related = match &draft.related {
        Some(id) => storage
            .find_habit(id)?
            .filter(|habit| habit.owner == draft.owner),
        None => None,
    };

    let resolver = |id: &HabitId| related.as_ref().filter(|habit| habit.id == *id).cloned();

    if let Err(rejection) = validate(draft, &resolver) {
        tracing::warn!("Rejected habit for user {}: {}", draft.owner, rejection);
        return Err(rejection.into());
    }
    Ok(())
}
