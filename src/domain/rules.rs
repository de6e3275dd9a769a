/// Business rules guarding every habit write
///
/// A candidate habit is run through each rule in a fixed order. Every rule is
/// evaluated and all violations are reported together; the first entry is
/// always the first failing rule in that order.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use crate::domain::{Habit, HabitDraft, HabitId, Weekdays};

/// Smallest accepted periodicity, in days
pub const MIN_PERIODICITY: i64 = 1;
/// Largest accepted periodicity, in days
pub const MAX_PERIODICITY: i64 = 7;
/// Largest accepted duration, in seconds (duration must also be positive)
pub const MAX_DURATION: i64 = 120;

/// Identifier of each rule a habit can violate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    PeriodicityBound,
    DurationBound,
    WeekdayCoverage,
    NiceHabitPurity,
    RewardExclusivity,
    RelatedReference,
    RelatedMustBeNice,
    /// A nice habit other habits reward themselves with can't stop being nice
    ReferencedNiceHabit,
}

impl RuleId {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::PeriodicityBound => "periodicity_bound",
            RuleId::DurationBound => "duration_bound",
            RuleId::WeekdayCoverage => "weekday_coverage",
            RuleId::NiceHabitPurity => "nice_habit_purity",
            RuleId::RewardExclusivity => "reward_exclusivity",
            RuleId::RelatedReference => "related_reference",
            RuleId::RelatedMustBeNice => "related_must_be_nice",
            RuleId::ReferencedNiceHabit => "referenced_nice_habit",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broad class of a violation, used by callers to phrase responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// A numeric field is outside its allowed range
    FieldBound,
    /// No weekday is selected
    Coverage,
    /// Fields conflict with each other or with the related habit
    Relationship,
    /// The related habit can't be resolved
    Reference,
}

/// One broken rule, with the fields responsible
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleViolation {
    pub rule: RuleId,
    pub kind: ViolationKind,
    pub message: String,
    pub fields: Vec<&'static str>,
}

impl RuleViolation {
    pub fn new(
        rule: RuleId,
        kind: ViolationKind,
        message: impl Into<String>,
        fields: Vec<&'static str>,
    ) -> Self {
        Self {
            rule,
            kind,
            message: message.into(),
            fields,
        }
    }
}

impl fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.rule, self.message)
    }
}

/// A candidate habit that failed one or more rules
///
/// Never empty; violations are ordered by rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    #[serde(rename = "errors")]
    violations: Vec<RuleViolation>,
}

impl Rejection {
    /// Build a rejection, or None when there is nothing to reject
    pub fn from_violations(violations: Vec<RuleViolation>) -> Option<Self> {
        if violations.is_empty() {
            None
        } else {
            Some(Self { violations })
        }
    }

    /// Rejection carrying a single violation
    pub fn single(violation: RuleViolation) -> Self {
        Self {
            violations: vec![violation],
        }
    }

    /// The first violation in rule order
    pub fn first(&self) -> &RuleViolation {
        &self.violations[0]
    }

    pub fn violations(&self) -> &[RuleViolation] {
        &self.violations
    }

    /// Check whether a given rule was broken
    pub fn violates(&self, rule: RuleId) -> bool {
        self.violations.iter().any(|v| v.rule == rule)
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "habit rejected: {}", self.first())?;
        if self.violations.len() > 1 {
            write!(f, " (and {} more)", self.violations.len() - 1)?;
        }
        Ok(())
    }
}

impl std::error::Error for Rejection {}

/// Lookup capability for the habit named by `related`
///
/// Returning None means the reference does not resolve for this caller.
pub trait RelatedResolver {
    fn resolve(&self, id: &HabitId) -> Option<Habit>;
}

impl<F> RelatedResolver for F
where
    F: Fn(&HabitId) -> Option<Habit>,
{
    fn resolve(&self, id: &HabitId) -> Option<Habit> {
        self(id)
    }
}

impl RelatedResolver for HashMap<HabitId, Habit> {
    fn resolve(&self, id: &HabitId) -> Option<Habit> {
        self.get(id).cloned()
    }
}

/// Resolver for candidates that reference nothing, or when nothing resolves
pub struct NoRelated;

impl RelatedResolver for NoRelated {
    fn resolve(&self, _id: &HabitId) -> Option<Habit> {
        None
    }
}

/// Run every rule against a candidate
pub fn validate<R>(candidate: &HabitDraft, resolver: &R) -> Result<(), Rejection>
where
    R: RelatedResolver + ?Sized,
{
    let violations: Vec<RuleViolation> = [
        check_periodicity(candidate),
        check_duration(candidate),
        check_weekday_coverage(candidate),
        check_nice_purity(candidate),
        check_reward_exclusivity(candidate),
        check_related(candidate, resolver),
    ]
    .into_iter()
    .flatten()
    .collect();

    match Rejection::from_violations(violations) {
        None => Ok(()),
        Some(rejection) => {
            tracing::debug!(
                "Habit candidate rejected with {} violation(s), first: {}",
                rejection.violations().len(),
                rejection.first()
            );
            Err(rejection)
        }
    }
}

fn check_periodicity(candidate: &HabitDraft) -> Option<RuleViolation> {
    if (MIN_PERIODICITY..=MAX_PERIODICITY).contains(&candidate.periodicity) {
        return None;
    }
    Some(RuleViolation::new(
        RuleId::PeriodicityBound,
        ViolationKind::FieldBound,
        format!(
            "Periodicity must be between {} and {} days, got {}",
            MIN_PERIODICITY, MAX_PERIODICITY, candidate.periodicity
        ),
        vec!["periodicity"],
    ))
}

fn check_duration(candidate: &HabitDraft) -> Option<RuleViolation> {
    if candidate.duration > 0 && candidate.duration <= MAX_DURATION {
        return None;
    }
    Some(RuleViolation::new(
        RuleId::DurationBound,
        ViolationKind::FieldBound,
        format!(
            "Duration must be greater than 0 and at most {} seconds, got {}",
            MAX_DURATION, candidate.duration
        ),
        vec!["duration"],
    ))
}

fn check_weekday_coverage(candidate: &HabitDraft) -> Option<RuleViolation> {
    if candidate.weekdays.any() {
        return None;
    }
    Some(RuleViolation::new(
        RuleId::WeekdayCoverage,
        ViolationKind::Coverage,
        "At least one day of the week must be selected",
        Weekdays::FIELDS.to_vec(),
    ))
}

fn check_nice_purity(candidate: &HabitDraft) -> Option<RuleViolation> {
    if !candidate.is_nice || (!candidate.has_prize() && !candidate.has_related()) {
        return None;
    }

    let mut fields = vec!["is_nice"];
    if candidate.has_prize() {
        fields.push("prize");
    }
    if candidate.has_related() {
        fields.push("related");
    }
    Some(RuleViolation::new(
        RuleId::NiceHabitPurity,
        ViolationKind::Relationship,
        "A nice habit can't have a prize or a related habit",
        fields,
    ))
}

fn check_reward_exclusivity(candidate: &HabitDraft) -> Option<RuleViolation> {
    if !(candidate.has_prize() && candidate.has_related()) {
        return None;
    }
    Some(RuleViolation::new(
        RuleId::RewardExclusivity,
        ViolationKind::Relationship,
        "Choose either a prize or a related habit, not both",
        vec!["prize", "related"],
    ))
}

fn check_related<R>(candidate: &HabitDraft, resolver: &R) -> Option<RuleViolation>
where
    R: RelatedResolver + ?Sized,
{
    let related_id = candidate.related.as_ref()?;

    if candidate.id.as_ref() == Some(related_id) {
        return Some(RuleViolation::new(
            RuleId::RelatedReference,
            ViolationKind::Reference,
            "A habit can't be its own related habit",
            vec!["related"],
        ));
    }

    match resolver.resolve(related_id) {
        None => Some(RuleViolation::new(
            RuleId::RelatedReference,
            ViolationKind::Reference,
            format!("Related habit {} does not exist", related_id),
            vec!["related"],
        )),
        Some(related) if !related.is_nice => Some(RuleViolation::new(
            RuleId::RelatedMustBeNice,
            ViolationKind::Relationship,
            "Only nice habits can be used as a related habit",
            vec!["related"],
        )),
        Some(_) => None,
    }
}

/// Guard for nice habits other habits point at
///
/// A referenced nice habit may not be deleted (`next` is None) or turned
/// into an ordinary habit while `referencing` habits still depend on it.
pub fn check_referenced_nice(
    referencing: u64,
    next: Option<&HabitDraft>,
) -> Result<(), Rejection> {
    if referencing == 0 || next.map_or(false, |draft| draft.is_nice) {
        return Ok(());
    }

    let action = if next.is_some() { "be made not nice" } else { "be deleted" };
    Err(Rejection::single(RuleViolation::new(
        RuleId::ReferencedNiceHabit,
        ViolationKind::Relationship,
        format!(
            "This habit is the related habit of {} other habit(s) and can't {}",
            referencing, action
        ),
        vec!["is_nice"],
    )))
}
