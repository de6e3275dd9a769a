/// Core identifier and schedule types used throughout the domain layer
///
/// This module defines HabitId, UserId and the Weekdays recurrence flags
/// that are shared by Habit, HabitDraft and the validation rules.

use serde::{Deserialize, Serialize};
use chrono::Weekday;
use uuid::Uuid;

/// Unique identifier for a habit
///
/// This is a wrapper around UUID to provide type safety - you can't accidentally
/// pass a habit ID where a user ID is expected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HabitId(pub Uuid);

impl HabitId {
    /// Generate a new random habit ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a habit ID from a string (request paths, payloads, database rows)
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}

impl Default for HabitId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for HabitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of the user owning a habit
///
/// Users live in the external authentication layer; we only ever see the
/// numeric id it hands us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Days of the week a habit recurs on
///
/// Serialized flat, so a habit's JSON carries `sunday` .. `saturday` as
/// top-level booleans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weekdays {
    pub sunday: bool,
    pub monday: bool,
    pub tuesday: bool,
    pub wednesday: bool,
    pub thursday: bool,
    pub friday: bool,
    pub saturday: bool,
}

impl Weekdays {
    /// Field names in the order they appear on the wire
    pub const FIELDS: [&'static str; 7] = [
        "sunday", "monday", "tuesday", "wednesday", "thursday", "friday", "saturday",
    ];

    /// Every day selected (the default for new habits)
    pub fn all() -> Self {
        Self::from_flags([true; 7])
    }

    /// No day selected
    pub fn none() -> Self {
        Self::from_flags([false; 7])
    }

    /// Build from flags ordered Sunday first
    pub fn from_flags(flags: [bool; 7]) -> Self {
        let [sunday, monday, tuesday, wednesday, thursday, friday, saturday] = flags;
        Self { sunday, monday, tuesday, wednesday, thursday, friday, saturday }
    }

    /// Flags ordered Sunday first
    pub fn flags(&self) -> [bool; 7] {
        [
            self.sunday,
            self.monday,
            self.tuesday,
            self.wednesday,
            self.thursday,
            self.friday,
            self.saturday,
        ]
    }

    /// Whether at least one day is selected
    pub fn any(&self) -> bool {
        self.flags().iter().any(|day| *day)
    }

    /// Check whether the habit recurs on the given weekday
    pub fn includes(&self, day: Weekday) -> bool {
        match day {
            Weekday::Sun => self.sunday,
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
        }
    }
}

impl Default for Weekdays {
    fn default() -> Self {
        Self::all()
    }
}
