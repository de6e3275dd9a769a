/// Habit rule checks through the public API
use habit_rules::*;
use std::collections::HashMap;

#[cfg(test)]
mod rules_unit_tests {
    use super::*;

    fn candidate() -> HabitDraft {
        HabitDraft {
            id: None,
            owner: UserId(1),
            place: "Store".to_string(),
            time: parse_time("18:00:00").unwrap(),
            action: "Buy groceries".to_string(),
            is_nice: false,
            related: None,
            prize: None,
            periodicity: 1,
            duration: 60,
            is_public: true,
            weekdays: Weekdays::all(),
        }
    }

    fn stored(is_nice: bool) -> Habit {
        let mut draft = candidate();
        draft.is_nice = is_nice;
        draft.action = "Take a bath".to_string();
        Habit::from_draft(draft)
    }

    #[test]
    fn test_periodicity_range() {
        for periodicity in -2..=10 {
            let mut draft = candidate();
            draft.periodicity = periodicity;
            let accepted = validate(&draft, &NoRelated).is_ok();
            assert_eq!(accepted, (1..=7).contains(&periodicity), "periodicity {}", periodicity);
        }
    }

    #[test]
    fn test_duration_range() {
        for duration in [-5, 0, 1, 60, 119, 120, 121, 180] {
            let mut draft = candidate();
            draft.duration = duration;
            let accepted = validate(&draft, &NoRelated).is_ok();
            assert_eq!(accepted, duration > 0 && duration <= MAX_DURATION, "duration {}", duration);
        }
    }

    #[test]
    fn test_any_single_weekday_is_enough() {
        for day in 0..7 {
            let mut flags = [false; 7];
            flags[day] = true;
            let mut draft = candidate();
            draft.weekdays = Weekdays::from_flags(flags);
            assert!(validate(&draft, &NoRelated).is_ok());
        }

        let mut draft = candidate();
        draft.weekdays = Weekdays::none();
        let rejection = validate(&draft, &NoRelated).unwrap_err();
        assert_eq!(rejection.first().rule, RuleId::WeekdayCoverage);
        assert_eq!(rejection.first().fields.len(), 7);
    }

    #[test]
    fn test_violations_follow_rule_order() {
        let nice = stored(true);
        let mut resolver = HashMap::new();
        resolver.insert(nice.id.clone(), nice.clone());

        let mut draft = candidate();
        draft.periodicity = 0;
        draft.duration = 500;
        draft.weekdays = Weekdays::none();
        draft.is_nice = true;
        draft.prize = Some("cake".to_string());
        draft.related = Some(nice.id.clone());

        let rejection = validate(&draft, &resolver).unwrap_err();
        let rules: Vec<RuleId> = rejection.violations().iter().map(|v| v.rule).collect();
        assert_eq!(
            rules,
            vec![
                RuleId::PeriodicityBound,
                RuleId::DurationBound,
                RuleId::WeekdayCoverage,
                RuleId::NiceHabitPurity,
                RuleId::RewardExclusivity,
            ]
        );
    }

    #[test]
    fn test_related_resolution() {
        let nice = stored(true);
        let ordinary = stored(false);
        let mut resolver = HashMap::new();
        resolver.insert(nice.id.clone(), nice.clone());
        resolver.insert(ordinary.id.clone(), ordinary.clone());

        let mut draft = candidate();
        draft.related = Some(nice.id.clone());
        assert!(validate(&draft, &resolver).is_ok());

        draft.related = Some(ordinary.id.clone());
        let rejection = validate(&draft, &resolver).unwrap_err();
        assert!(rejection.violates(RuleId::RelatedMustBeNice));

        draft.related = Some(HabitId::new());
        let rejection = validate(&draft, &resolver).unwrap_err();
        assert_eq!(rejection.first().kind, ViolationKind::Reference);
    }

    #[test]
    fn test_blank_prize_is_no_prize() {
        let params: CreateHabitParams = serde_json::from_value(serde_json::json!({
            "place": "Home",
            "time": "21:00",
            "action": "Take a bath",
            "duration": 60,
            "periodicity": 1,
            "is_nice": true,
            "prize": "   ",
            "owner": 99
        }))
        .unwrap();

        let draft = params.into_draft(UserId(1)).unwrap();
        assert_eq!(draft.owner, UserId(1));
        assert_eq!(draft.prize, None);
        assert_eq!(draft.weekdays, Weekdays::all());
        assert!(validate(&draft, &NoRelated).is_ok());
    }

    #[test]
    fn test_referenced_nice_guard() {
        let mut next = candidate();
        next.is_nice = false;

        assert!(check_referenced_nice(0, None).is_ok());
        assert!(check_referenced_nice(2, None).is_err());
        assert!(check_referenced_nice(1, Some(&next)).is_err());

        next.is_nice = true;
        assert!(check_referenced_nice(1, Some(&next)).is_ok());
    }
}
