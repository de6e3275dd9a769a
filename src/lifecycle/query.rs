/// Read-side habit queries
///
/// Plain filtered listings; nothing here runs the habit rules.

use serde::Serialize;
use crate::domain::{Habit, HabitId, UserId};
use crate::lifecycle::{load_owned, LifecycleError};
use crate::storage::{HabitStorage, PageRequest};

/// One page of results plus the total number of matches
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub count: u64,
    pub results: Vec<T>,
}

/// List the caller's own habits
pub fn list_habits<S: HabitStorage>(
    storage: &S,
    owner: UserId,
    page: PageRequest,
) -> Result<Paginated<Habit>, LifecycleError> {
    let count = storage.count_habits_for_owner(owner)?;
    let results = storage.list_habits_for_owner(owner, page)?;

    tracing::debug!("Listed {} of {} habits for user {}", results.len(), count, owner);
    Ok(Paginated { count, results })
}

/// Get one of the caller's habits
pub fn retrieve_habit<S: HabitStorage>(
    storage: &S,
    owner: UserId,
    habit_id: &HabitId,
) -> Result<Habit, LifecycleError> {
    load_owned(storage, owner, habit_id)
}

/// List public habits of every user
pub fn list_public_habits<S: HabitStorage>(
    storage: &S,
    page: PageRequest,
) -> Result<Paginated<Habit>, LifecycleError> {
    let count = storage.count_public_habits()?;
    let results = storage.list_public_habits(page)?;

    tracing::debug!("Listed {} of {} public habits", results.len(), count);
    Ok(Paginated { count, results })
}
