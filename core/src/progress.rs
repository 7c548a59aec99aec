//! BMI arithmetic and the comparison between two measurements.
//!
//! Every function here is total: zero, negative or non-finite inputs give a
//! neutral result (usually `0`) instead of an error or a NaN.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{Locale, ProgressEntry, UserSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    /// Bins are closed below and open above: 18.5 is normal, 25 is overweight.
    #[must_use]
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Normal
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }

    #[must_use]
    pub fn label(self, locale: Locale) -> &'static str {
        match (locale, self) {
            (Locale::Es, BmiCategory::Underweight) => "Bajo peso",
            (Locale::Es, BmiCategory::Normal) => "Peso normal",
            (Locale::Es, BmiCategory::Overweight) => "Sobrepeso",
            (Locale::Es, BmiCategory::Obese) => "Obesidad",
            (Locale::En, BmiCategory::Underweight) => "Underweight",
            (Locale::En, BmiCategory::Normal) => "Normal weight",
            (Locale::En, BmiCategory::Overweight) => "Overweight",
            (Locale::En, BmiCategory::Obese) => "Obese",
        }
    }
}

/// Round half away from zero to `decimals` places.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

fn is_positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

/// `weight / (height_cm / 100)^2`, two decimals. Returns `0` when either
/// input is missing, zero or negative.
#[must_use]
pub fn calculate_bmi(weight_kg: f64, height_cm: f64) -> f64 {
    if !is_positive(weight_kg) || !is_positive(height_cm) {
        return 0.0;
    }
    let height_m = height_cm / 100.0;
    round_to(weight_kg / (height_m * height_m), 2)
}

#[must_use]
pub fn bmi_category(bmi: f64, locale: Locale) -> &'static str {
    BmiCategory::from_bmi(bmi).label(locale)
}

/// Share of the distance from `initial_kg` to `goal_kg` already covered,
/// in percent, one decimal, clamped to `[0, 100]`.
#[must_use]
pub fn progress_percentage(current_kg: f64, initial_kg: f64, goal_kg: f64) -> f64 {
    if !is_positive(goal_kg) || !initial_kg.is_finite() || !current_kg.is_finite() {
        return 0.0;
    }
    let total = (goal_kg - initial_kg).abs();
    if total == 0.0 {
        return 0.0;
    }
    let changed = (initial_kg - current_kg).abs();
    round_to(changed / total * 100.0, 1).clamp(0.0, 100.0)
}

/// Weight, height and BMI recorded before the new measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PreviousMeasurement {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub bmi: f64,
}

impl PreviousMeasurement {
    /// The latest history entry supplies the BMI; without history it is
    /// computed from the stored weight and height.
    #[must_use]
    pub fn from_snapshot(user: &UserSnapshot) -> Self {
        let bmi = normalize_history(&user.progress)
            .last()
            .map_or_else(|| calculate_bmi(user.weight_kg, user.height_cm), |e| e.bmi);
        Self {
            weight_kg: user.weight_kg,
            height_cm: user.height_cm,
            bmi,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub new_bmi: f64,
    pub previous_bmi: f64,
    pub bmi_difference: f64,
    pub is_improvement: bool,
    pub new_weight: f64,
    pub previous_weight: f64,
    pub weight_difference: f64,
    pub weight_improvement: bool,
    pub category: BmiCategory,
    pub percentage: f64,
    pub achieved_goal: bool,
}

impl ComparisonResult {
    /// Build the comparison from a BMI computed elsewhere, e.g. by the server.
    #[must_use]
    pub fn from_new_bmi(
        previous: &PreviousMeasurement,
        new_weight_kg: f64,
        new_bmi: f64,
        goal_kg: Option<f64>,
    ) -> Self {
        let goal = goal_kg.filter(|g| is_positive(*g));
        let previous_weight = previous.weight_kg;

        let weight_improvement = match goal {
            Some(g) if g < previous_weight => new_weight_kg < previous_weight,
            Some(g) if g > previous_weight => new_weight_kg > previous_weight,
            _ => false,
        };
        let achieved_goal = match goal {
            Some(g) if g < previous_weight => new_weight_kg <= g,
            Some(g) if g > previous_weight => new_weight_kg >= g,
            Some(g) => (new_weight_kg - g).abs() < f64::EPSILON,
            None => false,
        };
        let percentage = goal.map_or(0.0, |g| {
            progress_percentage(new_weight_kg, previous_weight, g)
        });

        Self {
            new_bmi,
            previous_bmi: previous.bmi,
            bmi_difference: finite_or_zero(round_to((new_bmi - previous.bmi).abs(), 2)),
            is_improvement: new_bmi < previous.bmi,
            new_weight: new_weight_kg,
            previous_weight,
            weight_difference: finite_or_zero(round_to(
                (new_weight_kg - previous_weight).abs(),
                2,
            )),
            weight_improvement,
            category: BmiCategory::from_bmi(new_bmi),
            percentage,
            achieved_goal,
        }
    }

    #[must_use]
    pub fn category_label(&self, locale: Locale) -> &'static str {
        self.category.label(locale)
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

/// Compare a new weight/height against the previous measurement.
///
/// Weight improvement is judged against the goal: with a goal below the
/// previous weight a decrease counts, with a goal above it an increase
/// counts, and without a goal nothing counts.
#[must_use]
pub fn compare(
    previous: &PreviousMeasurement,
    new_weight_kg: f64,
    new_height_cm: f64,
    goal_kg: Option<f64>,
) -> ComparisonResult {
    let new_bmi = calculate_bmi(new_weight_kg, new_height_cm);
    ComparisonResult::from_new_bmi(previous, new_weight_kg, new_bmi, goal_kg)
}

/// Collapse entries sharing a date (the later one wins) and sort by date.
/// Undated entries count as one date that sorts before every real date.
#[must_use]
pub fn normalize_history(entries: &[ProgressEntry]) -> Vec<ProgressEntry> {
    let by_date: BTreeMap<_, _> = entries
        .iter()
        .map(|e| (e.registration_date, e.bmi))
        .collect();
    by_date
        .into_iter()
        .map(|(registration_date, bmi)| ProgressEntry {
            bmi,
            registration_date,
        })
        .collect()
}
