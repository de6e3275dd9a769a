/// Deleting habits

use crate::domain::{check_referenced_nice, HabitId, UserId};
use crate::lifecycle::{load_owned, LifecycleError};
use crate::storage::HabitStorage;

/// Delete a habit owned by the caller
///
/// A nice habit that other habits still use as their related habit is kept;
/// those habits have to drop the reference first.
pub fn delete_habit<S: HabitStorage>(
    storage: &S,
    owner: UserId,
    habit_id: &HabitId,
) -> Result<(), LifecycleError> {
    let habit = load_owned(storage, owner, habit_id)?;

    let referencing = storage.count_referencing(habit_id)?;
    if let Err(rejection) = check_referenced_nice(referencing, None) {
        tracing::warn!("Rejected delete of habit {}: {}", habit_id, rejection);
        return Err(rejection.into());
    }

    storage.delete_habit(habit_id)?;

    tracing::info!("Deleted habit '{}' ({}) for user {}", habit.action, habit.id, owner);
    Ok(())
}
