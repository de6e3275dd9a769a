/// Habit record and habit candidate types
///
/// This module defines the Habit struct (an accepted, stored record) and the
/// HabitDraft struct (a candidate about to be validated), along with the
/// coercion helpers that turn raw request values into typed fields.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveTime, SubsecRound, Utc};
use crate::domain::{DomainError, HabitId, UserId, Weekdays};

/// Wire format for the time-of-day field
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// A recurring habit owned by one user
///
/// Records of this type have passed the validation rules. They are only
/// built from a validated draft or loaded back from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    /// Unique identifier for this habit
    pub id: HabitId,
    /// User who owns this habit
    pub owner: UserId,
    /// Where the habit is performed (e.g., "Store")
    pub place: String,
    /// Time of day the habit is performed
    pub time: NaiveTime,
    /// What the user does (e.g., "Buy groceries")
    pub action: String,
    /// Self-rewarding habit that can't carry a reward
    pub is_nice: bool,
    /// Nice habit performed as the reward for this one
    pub related: Option<HabitId>,
    /// Free-text reward
    pub prize: Option<String>,
    /// Days between repetitions (1-7)
    pub periodicity: i64,
    /// Seconds the habit takes (1-120)
    pub duration: i64,
    /// Whether the habit shows up in the public listing
    pub is_public: bool,
    /// Days of the week the habit recurs on
    #[serde(flatten)]
    pub weekdays: Weekdays,
    /// When this habit was created
    pub created_at: DateTime<Utc>,
    /// When this habit was last written
    pub updated_at: DateTime<Utc>,
}

impl Habit {
    /// Turn an accepted draft into a new record owned by the draft's owner
    pub fn from_draft(draft: HabitDraft) -> Self {
        let now = Self::now();
        Self {
            id: draft.id.unwrap_or_default(),
            owner: draft.owner,
            place: draft.place,
            time: draft.time,
            action: draft.action,
            is_nice: draft.is_nice,
            related: draft.related,
            prize: draft.prize,
            periodicity: draft.periodicity,
            duration: draft.duration,
            is_public: draft.is_public,
            weekdays: draft.weekdays,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply an accepted draft on top of this record
    ///
    /// Identity, owner and creation time never change.
    pub fn apply(&mut self, draft: HabitDraft) {
        self.place = draft.place;
        self.time = draft.time;
        self.action = draft.action;
        self.is_nice = draft.is_nice;
        self.related = draft.related;
        self.prize = draft.prize;
        self.periodicity = draft.periodicity;
        self.duration = draft.duration;
        self.is_public = draft.is_public;
        self.weekdays = draft.weekdays;
        self.updated_at = Self::now();
    }

    /// Current time at the precision storage keeps (microseconds)
    fn now() -> DateTime<Utc> {
        Utc::now().trunc_subsecs(6)
    }

    /// The full candidate this record would be if written again
    ///
    /// Updates start from this and overlay the incoming fields, so the rules
    /// always see the final state rather than a delta.
    pub fn to_draft(&self) -> HabitDraft {
        HabitDraft {
            id: Some(self.id.clone()),
            owner: self.owner,
            place: self.place.clone(),
            time: self.time,
            action: self.action.clone(),
            is_nice: self.is_nice,
            related: self.related.clone(),
            prize: self.prize.clone(),
            periodicity: self.periodicity,
            duration: self.duration,
            is_public: self.is_public,
            weekdays: self.weekdays,
        }
    }

    /// Formatted time of day (e.g., "18:00:00")
    pub fn time_display(&self) -> String {
        self.time.format(TIME_FORMAT).to_string()
    }
}

/// A fully typed habit candidate awaiting validation
///
/// Numeric fields are kept wide so out-of-range input reaches the rules
/// instead of failing as a type error.
#[derive(Debug, Clone, PartialEq)]
pub struct HabitDraft {
    /// Set when the draft replaces a stored habit
    pub id: Option<HabitId>,
    pub owner: UserId,
    pub place: String,
    pub time: NaiveTime,
    pub action: String,
    pub is_nice: bool,
    pub related: Option<HabitId>,
    pub prize: Option<String>,
    pub periodicity: i64,
    pub duration: i64,
    pub is_public: bool,
    pub weekdays: Weekdays,
}

impl HabitDraft {
    /// Whether a non-blank prize is set
    pub fn has_prize(&self) -> bool {
        self.prize.as_deref().map_or(false, |p| !p.trim().is_empty())
    }

    /// Whether a related habit is referenced
    pub fn has_related(&self) -> bool {
        self.related.is_some()
    }
}

// Coercion helpers shared by the create and update parameter parsers

/// Parse a time of day, accepting `HH:MM:SS` and `HH:MM`
pub fn parse_time(value: &str) -> Result<NaiveTime, DomainError> {
    let trimmed = value.trim();
    NaiveTime::parse_from_str(trimmed, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .map_err(|_| DomainError::InvalidTime(value.to_string()))
}

/// Validate a required free-text field and return it trimmed
pub fn required_text(field: &'static str, value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

/// Normalize an optional prize: blank means no prize
pub fn normalize_prize(prize: Option<String>) -> Option<String> {
    prize
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
}

/// Parse an optional related habit reference
pub fn parse_related(related: Option<&str>) -> Result<Option<HabitId>, DomainError> {
    match related.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => HabitId::from_string(raw)
            .map(Some)
            .map_err(|_| DomainError::InvalidReference(raw.to_string())),
    }
}
