/// Creating new habits
///
/// This module parses a create request into a candidate, validates it and
/// stores the accepted habit.

use serde::Deserialize;
use crate::domain::{
    normalize_prize, parse_related, parse_time, required_text, Habit, HabitDraft, UserId,
    Weekdays,
};
use crate::lifecycle::{check_draft, LifecycleError};
use crate::storage::HabitStorage;

fn default_true() -> bool {
    true
}

/// Parameters for creating a new habit
///
/// An `owner` field in the payload is ignored; the owner is always the
/// authenticated caller.
#[derive(Debug, Deserialize)]
pub struct CreateHabitParams {
    pub place: String,
    pub time: String, // "HH:MM:SS", parsed into NaiveTime
    pub action: String,
    pub duration: i64,
    pub periodicity: i64,
    #[serde(default)]
    pub is_nice: bool,
    pub prize: Option<String>,
    pub related: Option<String>, // habit id, parsed into HabitId
    #[serde(default = "default_true")]
    pub is_public: bool,
    pub sunday: Option<bool>,
    pub monday: Option<bool>,
    pub tuesday: Option<bool>,
    pub wednesday: Option<bool>,
    pub thursday: Option<bool>,
    pub friday: Option<bool>,
    pub saturday: Option<bool>,
}

impl CreateHabitParams {
    /// Coerce the raw request into a typed candidate
    ///
    /// Fails on shape problems only; business rules run afterwards. Weekdays
    /// left out of the request default to selected.
    pub fn into_draft(self, owner: UserId) -> Result<HabitDraft, crate::domain::DomainError> {
        let day = |flag: Option<bool>| flag.unwrap_or(true);

        Ok(HabitDraft {
            id: None,
            owner,
            place: required_text("place", &self.place)?,
            time: parse_time(&self.time)?,
            action: required_text("action", &self.action)?,
            is_nice: self.is_nice,
            related: parse_related(self.related.as_deref())?,
            prize: normalize_prize(self.prize),
            periodicity: self.periodicity,
            duration: self.duration,
            is_public: self.is_public,
            weekdays: Weekdays::from_flags([
                day(self.sunday),
                day(self.monday),
                day(self.tuesday),
                day(self.wednesday),
                day(self.thursday),
                day(self.friday),
                day(self.saturday),
            ]),
        })
    }
}

/// Create a new habit using the provided storage
pub fn create_habit<S: HabitStorage>(
    storage: &S,
    owner: UserId,
    params: CreateHabitParams,
) -> Result<Habit, LifecycleError> {
    let draft = params.into_draft(owner)?;

    check_draft(storage, &draft)?;

    let habit = Habit::from_draft(draft);
    storage.create_habit(&habit)?;

    tracing::info!("Created habit '{}' ({}) for user {}", habit.action, habit.id, owner);
    Ok(habit)
}
