/// Updating existing habits
///
/// Incoming fields are merged over the stored habit and the rules run against
/// the merged result, so an update can never leave a habit in a state a
/// create would have refused.

use serde::{Deserialize, Deserializer};
use crate::domain::{
    check_referenced_nice, normalize_prize, parse_related, parse_time, required_text, DomainError,
    Habit, HabitDraft, HabitId, UserId,
};
use crate::lifecycle::{check_draft, load_owned, LifecycleError};
use crate::storage::HabitStorage;

/// Tell an explicit `null` apart from a missing field
fn explicit<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Parameters for updating an existing habit
///
/// Missing fields keep their stored value. `prize` and `related` can be
/// cleared by sending `null`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateHabitParams {
    pub place: Option<String>,
    pub time: Option<String>,
    pub action: Option<String>,
    pub duration: Option<i64>,
    pub periodicity: Option<i64>,
    pub is_nice: Option<bool>,
    #[serde(default, deserialize_with = "explicit")]
    pub prize: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub related: Option<Option<String>>,
    pub is_public: Option<bool>,
    pub sunday: Option<bool>,
    pub monday: Option<bool>,
    pub tuesday: Option<bool>,
    pub wednesday: Option<bool>,
    pub thursday: Option<bool>,
    pub friday: Option<bool>,
    pub saturday: Option<bool>,
}

impl UpdateHabitParams {
    /// Overlay the supplied fields on a full candidate
    pub fn merge_into(self, draft: &mut HabitDraft) -> Result<(), DomainError> {
        if let Some(place) = self.place {
            draft.place = required_text("place", &place)?;
        }
        if let Some(time) = self.time {
            draft.time = parse_time(&time)?;
        }
        if let Some(action) = self.action {
            draft.action = required_text("action", &action)?;
        }
        if let Some(duration) = self.duration {
            draft.duration = duration;
        }
        if let Some(periodicity) = self.periodicity {
            draft.periodicity = periodicity;
        }
        if let Some(is_nice) = self.is_nice {
            draft.is_nice = is_nice;
        }
        if let Some(prize) = self.prize {
            draft.prize = normalize_prize(prize);
        }
        if let Some(related) = self.related {
            draft.related = parse_related(related.as_deref())?;
        }
        if let Some(is_public) = self.is_public {
            draft.is_public = is_public;
        }

        let days = &mut draft.weekdays;
        let updates = [
            (self.sunday, &mut days.sunday),
            (self.monday, &mut days.monday),
            (self.tuesday, &mut days.tuesday),
            (self.wednesday, &mut days.wednesday),
            (self.thursday, &mut days.thursday),
            (self.friday, &mut days.friday),
            (self.saturday, &mut days.saturday),
        ];
        for (update, day) in updates {
            if let Some(value) = update {
                *day = value;
            }
        }

        Ok(())
    }
}

/// Update an existing habit using the provided storage
pub fn update_habit<S: HabitStorage>(
    storage: &S,
    owner: UserId,
    habit_id: &HabitId,
    params: UpdateHabitParams,
) -> Result<Habit, LifecycleError> {
    let mut habit = load_owned(storage, owner, habit_id)?;

    let mut draft = habit.to_draft();
    params.merge_into(&mut draft)?;

    check_draft(storage, &draft)?;

    // Habits rewarding themselves with this one rely on it staying nice
    if habit.is_nice && !draft.is_nice {
        let referencing = storage.count_referencing(habit_id)?;
        if let Err(rejection) = check_referenced_nice(referencing, Some(&draft)) {
            tracing::warn!("Rejected update of habit {}: {}", habit_id, rejection);
            return Err(rejection.into());
        }
    }

    habit.apply(draft);
    storage.update_habit(&habit)?;

    tracing::info!("Updated habit '{}' ({}) for user {}", habit.action, habit.id, owner);
    Ok(habit)
}
