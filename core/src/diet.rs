use anyhow::bail;
use serde::{Deserialize, Serialize};

use crate::models::Recipe;

pub const DAYS_PER_WEEK: usize = 7;
pub const SLOTS_PER_WEEK: usize = DAYS_PER_WEEK * MEAL_SLOTS.len();

/// Meal slot inside a day, in serving order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
}

pub const MEAL_SLOTS: [MealSlot; 3] = [MealSlot::Breakfast, MealSlot::Lunch, MealSlot::Dinner];

impl MealSlot {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MealSlot::Breakfast => "breakfast",
            MealSlot::Lunch => "lunch",
            MealSlot::Dinner => "dinner",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayMeals {
    pub day: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakfast: Option<Recipe>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lunch: Option<Recipe>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dinner: Option<Recipe>,
}

impl DayMeals {
    #[must_use]
    pub fn empty(day: &str) -> Self {
        Self {
            day: day.to_string(),
            breakfast: None,
            lunch: None,
            dinner: None,
        }
    }

    #[must_use]
    pub fn get(&self, slot: MealSlot) -> Option<&Recipe> {
        match slot {
            MealSlot::Breakfast => self.breakfast.as_ref(),
            MealSlot::Lunch => self.lunch.as_ref(),
            MealSlot::Dinner => self.dinner.as_ref(),
        }
    }

    fn slot_mut(&mut self, slot: MealSlot) -> &mut Option<Recipe> {
        match slot {
            MealSlot::Breakfast => &mut self.breakfast,
            MealSlot::Lunch => &mut self.lunch,
            MealSlot::Dinner => &mut self.dinner,
        }
    }

    /// Slots in serving order, paired with their recipe if assigned.
    pub fn meals(&self) -> impl Iterator<Item = (MealSlot, Option<&Recipe>)> {
        MEAL_SLOTS.into_iter().map(|slot| (slot, self.get(slot)))
    }
}

/// Seven days of meals, Monday first. Always holds exactly seven days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<DayMeals>", into = "Vec<DayMeals>")]
pub struct WeekPlan {
    days: Vec<DayMeals>,
}

impl TryFrom<Vec<DayMeals>> for WeekPlan {
    type Error = anyhow::Error;

    fn try_from(days: Vec<DayMeals>) -> anyhow::Result<Self> {
        if days.len() != DAYS_PER_WEEK {
            bail!(
                "A week plan must have {DAYS_PER_WEEK} days (got {})",
                days.len()
            );
        }
        Ok(Self { days })
    }
}

impl From<WeekPlan> for Vec<DayMeals> {
    fn from(plan: WeekPlan) -> Self {
        plan.days
    }
}

impl WeekPlan {
    #[must_use]
    pub fn days(&self) -> &[DayMeals] {
        &self.days
    }

    /// Recipe in linear slot `index`, counted day-major, meal-minor.
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&Recipe> {
        let day = self.days.get(index / MEAL_SLOTS.len())?;
        day.get(MEAL_SLOTS[index % MEAL_SLOTS.len()])
    }

    pub fn slots(&self) -> impl Iterator<Item = Option<&Recipe>> {
        self.days
            .iter()
            .flat_map(|d| d.meals().map(|(_, recipe)| recipe))
    }

    #[must_use]
    pub fn filled_slots(&self) -> usize {
        self.slots().flatten().count()
    }

    /// Ids of the assigned recipes in slot order, duplicates kept.
    #[must_use]
    pub fn recipe_ids(&self) -> Vec<i64> {
        self.slots().flatten().map(|r| r.id).collect()
    }

    #[must_use]
    pub fn find_recipe(&self, id: i64) -> Option<&Recipe> {
        self.slots().flatten().find(|r| r.id == id)
    }

    #[must_use]
    pub fn total_calories(&self) -> f64 {
        self.slots()
            .flatten()
            .filter_map(Recipe::calories_per_serving)
            .sum()
    }
}

/// Lay recipes out over the week in input order: day 1 breakfast, lunch,
/// dinner, then day 2, and so on. Missing recipes leave trailing slots
/// empty; anything past the 21st recipe is dropped.
#[must_use]
pub fn distribute_recipes(recipes: &[Recipe], day_labels: &[&str; DAYS_PER_WEEK]) -> WeekPlan {
    let mut queue = recipes.iter().take(SLOTS_PER_WEEK);
    let days = day_labels
        .iter()
        .map(|label| {
            let mut day = DayMeals::empty(label);
            for slot in MEAL_SLOTS {
                *day.slot_mut(slot) = queue.next().cloned();
            }
            day
        })
        .collect();
    WeekPlan { days }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GoalCategory, Locale, MealCategory, NutritionInfo, NutritionalInfo};

    fn recipe(id: i64) -> Recipe {
        Recipe {
            id,
            name: format!("Receta {id}"),
            description: String::new(),
            ingredients: vec!["agua".to_string()],
            preparation_steps: String::new(),
            nutritional_info: NutritionalInfo {
                per_serving: Some(NutritionInfo {
                    calories_kcal: Some(100.0),
                    ..NutritionInfo::default()
                }),
                per_100g: None,
            },
            meal: MealCategory::Lunch,
            goal: GoalCategory::Normal,
            tags: vec![],
            image_url: None,
        }
    }

    fn recipes(n: i64) -> Vec<Recipe> {
        (0..n).map(recipe).collect()
    }

    fn labels() -> &'static [&'static str; 7] {
        Locale::En.day_labels()
    }

    #[test]
    fn test_short_list_fills_leading_slots() {
        for n in 0..=21 {
            let plan = distribute_recipes(&recipes(n), labels());
            assert_eq!(plan.days().len(), 7);
            assert_eq!(plan.filled_slots(), n as usize);
        }
    }

    #[test]
    fn test_empty_list_leaves_all_slots_empty() {
        let plan = distribute_recipes(&[], labels());
        assert_eq!(plan.days().len(), 7);
        assert!(plan.slots().all(|s| s.is_none()));
        assert_eq!(plan.slots().count(), SLOTS_PER_WEEK);
    }

    #[test]
    fn test_full_week_is_day_major() {
        let input = recipes(21);
        let plan = distribute_recipes(&input, labels());
        for (k, expected) in input.iter().enumerate() {
            assert_eq!(plan.slot(k), Some(expected));
        }
        assert_eq!(plan.days()[0].breakfast.as_ref().unwrap().id, 0);
        assert_eq!(plan.days()[0].lunch.as_ref().unwrap().id, 1);
        assert_eq!(plan.days()[0].dinner.as_ref().unwrap().id, 2);
        assert_eq!(plan.days()[1].breakfast.as_ref().unwrap().id, 3);
        assert_eq!(plan.days()[6].dinner.as_ref().unwrap().id, 20);
    }

    #[test]
    fn test_surplus_recipes_dropped() {
        let plan = distribute_recipes(&recipes(30), labels());
        assert_eq!(plan.filled_slots(), 21);
        assert_eq!(plan.recipe_ids(), (0..21).collect::<Vec<_>>());
        assert!(plan.find_recipe(21).is_none());
    }

    #[test]
    fn test_partial_day() {
        let plan = distribute_recipes(&recipes(4), labels());
        let tuesday = &plan.days()[1];
        assert_eq!(tuesday.breakfast.as_ref().unwrap().id, 3);
        assert!(tuesday.lunch.is_none());
        assert!(tuesday.dinner.is_none());
        assert!(plan.days()[2..].iter().all(|d| d.meals().all(|(_, r)| r.is_none())));
    }

    #[test]
    fn test_day_labels_follow_locale() {
        let plan = distribute_recipes(&[], Locale::Es.day_labels());
        let days: Vec<&str> = plan.days().iter().map(|d| d.day.as_str()).collect();
        assert_eq!(days, Locale::Es.day_labels().to_vec());
    }

    #[test]
    fn test_meal_category_ignored() {
        let mut input = recipes(3);
        input[0].meal = MealCategory::Dinner;
        input[2].meal = MealCategory::Breakfast;
        let plan = distribute_recipes(&input, labels());
        assert_eq!(plan.days()[0].breakfast.as_ref().unwrap().id, 0);
        assert_eq!(plan.days()[0].dinner.as_ref().unwrap().id, 2);
    }

    #[test]
    fn test_total_calories() {
        let plan = distribute_recipes(&recipes(5), labels());
        assert!((plan.total_calories() - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_week_plan_json_requires_seven_days() {
        let plan = distribute_recipes(&recipes(2), labels());
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 7);
        let back: WeekPlan = serde_json::from_value(json).unwrap();
        assert_eq!(back, plan);

        let short = serde_json::json!([{ "day": "Monday" }]);
        assert!(serde_json::from_value::<WeekPlan>(short).is_err());
    }
}
