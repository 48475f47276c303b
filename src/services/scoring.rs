//! Heuristic probability score for a set of survey answers.
//!
//! Pure and deterministic. Inputs are trusted to be well-typed; values outside
//! the intended ranges fall through to the last bracket of each table.

use crate::models::survey::{FluidColor, ImportantActivity, SurveyAnswers};

/// Upper bound (inclusive) of each age bracket and its base probability.
pub const AGE_BRACKETS: [(u32, f64); 6] = [
    (25, 0.6),
    (35, 0.5),
    (40, 0.4),
    (50, 0.3),
    (60, 0.2),
    (70, 0.1),
];

/// Base probability for anyone older than the last bracket.
pub const OLDEST_BASE: f64 = 0.05;

/// Returned instead of any rounded score above 1.
pub const SCORE_CEILING: f64 = 0.99;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaysRule {
    AtLeast(u32),
    Below(u32),
}

impl DaysRule {
    pub fn matches(self, days: u32) -> bool {
        match self {
            DaysRule::AtLeast(n) => days >= n,
            DaysRule::Below(n) => days < n,
        }
    }
}

/// Evaluated top to bottom, first match wins.
///
/// Only the first and fourth rows can ever match: `AtLeast(7)` shadows
/// `AtLeast(14)` and `AtLeast(30)`, and `Below(7)` shadows `Below(2)` and
/// `Below(1)`. Whether the shadowed tiers were meant to apply is an open
/// product question, so the table is kept exactly as declared.
pub const DAYS_FACTORS: [(DaysRule, f64); 6] = [
    (DaysRule::AtLeast(7), 1.1),
    (DaysRule::AtLeast(14), 1.2),
    (DaysRule::AtLeast(30), 1.3),
    (DaysRule::Below(7), 0.8),
    (DaysRule::Below(2), 0.5),
    (DaysRule::Below(1), 0.1),
];

pub fn base_for_age(age: u32) -> f64 {
    AGE_BRACKETS
        .iter()
        .find(|(upper, _)| age <= *upper)
        .map(|(_, base)| *base)
        .unwrap_or(OLDEST_BASE)
}

pub fn days_factor(days: u32) -> f64 {
    days_factor_traced(days, |_| {})
}

/// Same as [`days_factor`], reporting the index of every rule it evaluates.
pub fn days_factor_traced(days: u32, mut on_eval: impl FnMut(usize)) -> f64 {
    for (idx, (rule, factor)) in DAYS_FACTORS.iter().enumerate() {
        on_eval(idx);
        if rule.matches(days) {
            return *factor;
        }
    }
    1.0
}

pub fn intensity_factor(desire_intensity: u32) -> f64 {
    1.0 + desire_intensity as f64 / 5.0
}

pub fn activity_factor(activity: ImportantActivity) -> f64 {
    match activity {
        ImportantActivity::No => 1.1,
        ImportantActivity::Yes | ImportantActivity::Maybe => 0.9,
    }
}

pub fn fluid_color_factor(color: Option<FluidColor>) -> f64 {
    match color {
        Some(FluidColor::Red) => 0.1,
        Some(FluidColor::Green) => 0.2,
        Some(FluidColor::Clear) => 1.1,
        Some(FluidColor::White) | Some(FluidColor::Yellow) | None => 1.0,
    }
}

/// Round half up to two decimals.
fn round2(value: f64) -> f64 {
    (value * 100.0 + 0.5).floor() / 100.0
}

pub fn score(answers: &SurveyAnswers) -> f64 {
    let mut prob = base_for_age(answers.age);
    prob *= days_factor(answers.days_without_activity);
    prob *= intensity_factor(answers.desire_intensity);
    prob *= activity_factor(answers.has_important_activity);
    prob *= fluid_color_factor(answers.fluid_color);

    let prob = round2(prob);
    // No lower clamp.
    if prob > 1.0 {
        SCORE_CEILING
    } else {
        prob
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(
        age: u32,
        days: u32,
        desire: u32,
        activity: ImportantActivity,
        color: Option<FluidColor>,
    ) -> SurveyAnswers {
        SurveyAnswers {
            days_without_activity: days,
            desire_intensity: desire,
            has_important_activity: activity,
            age,
            fluid_color: color,
        }
    }

    // ── Age brackets ─────────────────────────────────────────────────────

    #[test]
    fn test_age_bracket_boundaries() {
        assert_eq!(base_for_age(18), 0.6);
        assert_eq!(base_for_age(25), 0.6);
        assert_eq!(base_for_age(26), 0.5);
        assert_eq!(base_for_age(35), 0.5);
        assert_eq!(base_for_age(36), 0.4);
        assert_eq!(base_for_age(40), 0.4);
        assert_eq!(base_for_age(41), 0.3);
        assert_eq!(base_for_age(50), 0.3);
        assert_eq!(base_for_age(51), 0.2);
        assert_eq!(base_for_age(60), 0.2);
        assert_eq!(base_for_age(61), 0.1);
        assert_eq!(base_for_age(70), 0.1);
        assert_eq!(base_for_age(71), 0.05);
        assert_eq!(base_for_age(100), 0.05);
    }

    #[test]
    fn test_age_brackets_cover_intended_range_without_gaps() {
        let mut previous = base_for_age(18);
        for age in 18..=100 {
            let base = base_for_age(age);
            assert!(base <= previous, "base must not increase with age ({age})");
            assert!(base > 0.0);
            previous = base;
        }
    }

    #[test]
    fn test_out_of_range_age_falls_through() {
        assert_eq!(base_for_age(0), 0.6);
        assert_eq!(base_for_age(150), OLDEST_BASE);
    }

    // ── Days-without-activity chain ──────────────────────────────────────

    #[test]
    fn test_short_gap_stops_at_below_seven() {
        let mut evaluated = Vec::new();
        let factor = days_factor_traced(1, |idx| evaluated.push(idx));
        assert_eq!(factor, 0.8);
        assert_eq!(evaluated, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_below_two_and_below_one_never_evaluated() {
        for days in 0..=100 {
            let mut evaluated = Vec::new();
            days_factor_traced(days, |idx| evaluated.push(idx));
            assert!(
                !evaluated.contains(&4) && !evaluated.contains(&5),
                "rules after Below(7) ran for days={days}"
            );
        }
    }

    #[test]
    fn test_long_gaps_stop_at_first_rule() {
        for days in [7, 14, 30, 365] {
            let mut evaluated = Vec::new();
            let factor = days_factor_traced(days, |idx| evaluated.push(idx));
            assert_eq!(factor, 1.1, "days={days}");
            assert_eq!(evaluated, vec![0]);
        }
    }

    #[test]
    fn test_zero_days_uses_below_seven_factor() {
        assert_eq!(days_factor(0), 0.8);
    }

    #[test]
    fn test_shadowed_rules_still_declared() {
        assert_eq!(DAYS_FACTORS.len(), 6);
        assert_eq!(DAYS_FACTORS[4], (DaysRule::Below(2), 0.5));
        assert_eq!(DAYS_FACTORS[5], (DaysRule::Below(1), 0.1));
    }

    // ── Fixtures ─────────────────────────────────────────────────────────

    #[test]
    fn test_young_long_gap_high_desire_is_clamped() {
        // 0.6 * 1.1 * 2.0 * 1.1 * 1.0 = 1.452 -> 1.45 -> 0.99
        let a = answers(20, 10, 5, ImportantActivity::No, Some(FluidColor::White));
        assert_eq!(score(&a), 0.99);
    }

    #[test]
    fn test_red_penalty() {
        // 0.5 * 0.8 * 1.0 * 0.9 * 0.1 = 0.036 -> 0.04
        let a = answers(30, 3, 0, ImportantActivity::Yes, Some(FluidColor::Red));
        assert_eq!(score(&a), 0.04);
    }

    #[test]
    fn test_clear_boost_with_maybe() {
        // 0.3 * 0.8 * 2.0 * 0.9 * 1.1 = 0.4752 -> 0.48
        let a = answers(45, 0, 5, ImportantActivity::Maybe, Some(FluidColor::Clear));
        assert_eq!(score(&a), 0.48);
    }

    #[test]
    fn test_green_penalty_oldest_bracket() {
        // 0.05 * 1.1 * 1.6 * 1.1 * 0.2 = 0.01936 -> 0.02
        let a = answers(75, 30, 3, ImportantActivity::No, Some(FluidColor::Green));
        assert_eq!(score(&a), 0.02);
    }

    #[test]
    fn test_form_defaults() {
        // 0.6 * 0.8 * 1.0 * 1.1 * 1.0 = 0.528 -> 0.53
        let a = answers(18, 0, 0, ImportantActivity::No, Some(FluidColor::White));
        assert_eq!(score(&a), 0.53);
    }

    #[test]
    fn test_missing_color_is_neutral() {
        // 0.4 * 0.8 * 1.2 * 0.9 = 0.3456 -> 0.35
        let a = answers(36, 1, 1, ImportantActivity::Yes, None);
        assert_eq!(score(&a), 0.35);
        let white = answers(36, 1, 1, ImportantActivity::Yes, Some(FluidColor::White));
        assert_eq!(score(&a), score(&white));
    }

    #[test]
    fn test_score_can_round_to_zero() {
        // 0.05 * 0.8 * 1.0 * 0.9 * 0.1 = 0.0036 -> 0.00
        let a = answers(100, 0, 0, ImportantActivity::Yes, Some(FluidColor::Red));
        assert_eq!(score(&a), 0.0);
    }

    #[test]
    fn test_fourteen_days_uses_seven_day_factor() {
        // 0.1 * 1.1 * 1.4 * 0.9 * 1.0 = 0.1386 -> 0.14 (would be 0.15 with the 1.2 tier)
        let a = answers(61, 14, 2, ImportantActivity::Maybe, Some(FluidColor::Yellow));
        assert_eq!(score(&a), 0.14);
    }

    // ── Properties ───────────────────────────────────────────────────────

    #[test]
    fn test_score_bounded_and_deterministic_over_valid_inputs() {
        let activities = [
            ImportantActivity::Yes,
            ImportantActivity::No,
            ImportantActivity::Maybe,
        ];
        let colors = [
            None,
            Some(FluidColor::White),
            Some(FluidColor::Yellow),
            Some(FluidColor::Red),
            Some(FluidColor::Green),
            Some(FluidColor::Clear),
        ];

        for age in 18..=100 {
            for days in 0..=40 {
                for desire in 0..=5 {
                    for activity in activities {
                        for color in colors {
                            let a = answers(age, days, desire, activity, color);
                            let s = score(&a);
                            assert!(
                                (0.0..=SCORE_CEILING).contains(&s),
                                "score {s} out of range for {a:?}"
                            );
                            assert_eq!(s, score(&a));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_score_has_two_decimals() {
        let a = answers(52, 9, 4, ImportantActivity::No, Some(FluidColor::Clear));
        let s = score(&a);
        assert!(((s * 100.0).round() - s * 100.0).abs() < 1e-9);
    }
}
