use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Language used for day labels and BMI category labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Es,
    En,
}

const DAY_LABELS_ES: [&str; 7] = [
    "Lunes",
    "Martes",
    "Miércoles",
    "Jueves",
    "Viernes",
    "Sábado",
    "Domingo",
];

const DAY_LABELS_EN: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

impl Locale {
    /// Monday-first day labels.
    #[must_use]
    pub fn day_labels(self) -> &'static [&'static str; 7] {
        match self {
            Locale::Es => &DAY_LABELS_ES,
            Locale::En => &DAY_LABELS_EN,
        }
    }
}

impl FromStr for Locale {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "es" | "es-es" | "spanish" => Ok(Locale::Es),
            "en" | "en-us" | "en-gb" | "english" => Ok(Locale::En),
            _ => bail!("Invalid locale '{s}'. Must be one of: es, en"),
        }
    }
}

/// Meal a recipe is meant for. Wire codes are single letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MealCategory {
    #[serde(rename = "B")]
    Breakfast,
    #[serde(rename = "L")]
    Lunch,
    #[serde(rename = "D")]
    Dinner,
}

impl MealCategory {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            MealCategory::Breakfast => "B",
            MealCategory::Lunch => "L",
            MealCategory::Dinner => "D",
        }
    }
}

impl fmt::Display for MealCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MealCategory::Breakfast => "breakfast",
            MealCategory::Lunch => "lunch",
            MealCategory::Dinner => "dinner",
        };
        f.write_str(name)
    }
}

impl FromStr for MealCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "b" | "breakfast" => Ok(MealCategory::Breakfast),
            "l" | "lunch" => Ok(MealCategory::Lunch),
            "d" | "dinner" => Ok(MealCategory::Dinner),
            _ => bail!("Invalid meal '{s}'. Must be one of: breakfast, lunch, dinner"),
        }
    }
}

/// Dietary goal a recipe targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalCategory {
    #[serde(rename = "N")]
    Normal,
    #[serde(rename = "W")]
    WeightGain,
    #[serde(rename = "L")]
    WeightLoss,
}

impl fmt::Display for GoalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GoalCategory::Normal => "normal",
            GoalCategory::WeightGain => "weight gain",
            GoalCategory::WeightLoss => "weight loss",
        };
        f.write_str(name)
    }
}

impl FromStr for GoalCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace(['-', '_'], " ").as_str() {
            "n" | "normal" => Ok(GoalCategory::Normal),
            "w" | "gain" | "weight gain" => Ok(GoalCategory::WeightGain),
            "l" | "loss" | "weight loss" => Ok(GoalCategory::WeightLoss),
            _ => bail!("Invalid goal '{s}'. Must be one of: normal, gain, loss"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serving_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories_kcal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saturated_fat_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_fat_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trans_fat_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cholesterol_mg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sodium_mg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbs_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiber_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sugars_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vitamin_d_mcg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calcium_mg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iron_mg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub potassium_mg: Option<f64>,
}

impl NutritionInfo {
    fn values(&self) -> [Option<f64>; 16] {
        [
            self.serving_g,
            self.calories_kcal,
            self.protein_g,
            self.fat_g,
            self.saturated_fat_g,
            self.total_fat_g,
            self.trans_fat_g,
            self.cholesterol_mg,
            self.sodium_mg,
            self.carbs_g,
            self.fiber_g,
            self.sugars_g,
            self.vitamin_d_mcg,
            self.calcium_mg,
            self.iron_mg,
            self.potassium_mg,
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionalInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_serving: Option<NutritionInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_100g: Option<NutritionInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawRecipe")]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub preparation_steps: String,
    pub nutritional_info: NutritionalInfo,
    pub meal: MealCategory,
    pub goal: GoalCategory,
    pub tags: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Recipe as the server sends it. Older admin payloads use
/// `short_description`, `preparation` and `nutrition`, sometimes next to the
/// current names.
#[derive(Deserialize)]
struct RawRecipe {
    id: i64,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    short_description: Option<String>,
    #[serde(default)]
    ingredients: Option<Vec<String>>,
    #[serde(default)]
    preparation_steps: Option<String>,
    #[serde(default)]
    preparation: Option<String>,
    #[serde(default)]
    nutritional_info: Option<NutritionalInfo>,
    #[serde(default)]
    nutrition: Option<NutritionalInfo>,
    meal: MealCategory,
    goal: GoalCategory,
    #[serde(default)]
    tags: Option<Vec<i64>>,
    #[serde(default)]
    image_url: Option<String>,
}

/// First non-empty text, current name before legacy name.
fn pick_text(current: Option<String>, legacy: Option<String>) -> String {
    current
        .filter(|s| !s.is_empty())
        .or(legacy)
        .unwrap_or_default()
}

impl From<RawRecipe> for Recipe {
    fn from(raw: RawRecipe) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            description: pick_text(raw.description, raw.short_description),
            ingredients: raw.ingredients.unwrap_or_default(),
            preparation_steps: pick_text(raw.preparation_steps, raw.preparation),
            nutritional_info: raw
                .nutritional_info
                .filter(|n| *n != NutritionalInfo::default())
                .or(raw.nutrition)
                .unwrap_or_default(),
            meal: raw.meal,
            goal: raw.goal,
            tags: raw.tags.unwrap_or_default(),
            image_url: raw.image_url,
        }
    }
}

impl Recipe {
    #[must_use]
    pub fn calories_per_serving(&self) -> Option<f64> {
        self.nutritional_info
            .per_serving
            .as_ref()
            .and_then(|n| n.calories_kcal)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// --- User types ---

/// User record cached in the session after login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "lastName")]
    pub last_name: String,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub bmi: f64,
    /// `None` when the server sent no usable date.
    #[serde(default)]
    pub registration_date: Option<NaiveDate>,
}

/// Weight, height, goal and BMI history of the logged-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    pub weight_kg: f64,
    pub height_cm: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal_weight_kg: Option<f64>,
    pub progress: Vec<ProgressEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub bmi: f64,
    #[serde(default)]
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IdealInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ideal_weight: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub date_joined: Option<String>,
    #[serde(default)]
    pub progress: Option<ProgressSummary>,
    #[serde(default)]
    pub tags: Vec<i64>,
    #[serde(default)]
    pub ideal: Option<IdealInfo>,
    #[serde(default)]
    pub email_opt_out: bool,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
}

// --- History / news types ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecipe {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub preparation_steps: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMenu {
    pub day: u32,
    pub recipes: Vec<HistoryRecipe>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietHistory {
    #[serde(rename = "startDate")]
    pub start_date: NaiveDate,
    #[serde(rename = "endDate")]
    pub end_date: NaiveDate,
    pub menus: Vec<DailyMenu>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsSource {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawNewsArticle")]
pub struct NewsArticle {
    pub id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub image_url: Option<String>,
    pub published_at: String,
    pub source: NewsSource,
}

/// Article as the news feed sends it; optional text may come as `null`.
#[derive(Deserialize)]
struct RawNewsArticle {
    id: String,
    title: String,
    #[serde(default)]
    description: Option<String>,
    url: String,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    source: Option<RawNewsSource>,
}

#[derive(Deserialize)]
struct RawNewsSource {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

impl From<RawNewsArticle> for NewsArticle {
    fn from(raw: RawNewsArticle) -> Self {
        let source = raw.source.map_or_else(NewsSource::default, |s| NewsSource {
            name: s.name.unwrap_or_default(),
            url: s.url.unwrap_or_default(),
        });
        Self {
            id: raw.id,
            title: raw.title,
            description: raw.description.unwrap_or_default(),
            url: raw.url,
            image_url: raw.image_url,
            published_at: raw.published_at.unwrap_or_default(),
            source,
        }
    }
}

// --- Validation ---

/// Validate a user-entered measurement before it is sent to the server.
pub fn validate_weight(weight_kg: f64) -> Result<()> {
    if !weight_kg.is_finite() || weight_kg <= 0.0 {
        bail!("Weight must be greater than 0");
    }
    Ok(())
}

pub fn validate_height(height_cm: f64) -> Result<()> {
    if !height_cm.is_finite() || height_cm <= 0.0 {
        bail!("Height must be greater than 0");
    }
    Ok(())
}

pub fn validate_measurement(weight_kg: f64, height_cm: f64) -> Result<()> {
    validate_weight(weight_kg)?;
    validate_height(height_cm)
}

pub fn validate_tag(tag: &Tag) -> Result<()> {
    if tag.name.trim().is_empty() {
        bail!("Tag name must not be empty");
    }
    Ok(())
}

/// Name must be set, at least one ingredient, no negative nutrition values.
pub fn validate_recipe_data(
    name: &str,
    ingredients: &[String],
    nutrition: &NutritionalInfo,
) -> Result<()> {
    if name.trim().is_empty() {
        bail!("Recipe name must not be empty");
    }
    if ingredients.iter().all(|i| i.trim().is_empty()) {
        bail!("Recipe must have at least one ingredient");
    }
    let negative = [&nutrition.per_serving, &nutrition.per_100g]
        .into_iter()
        .flatten()
        .flat_map(NutritionInfo::values)
        .flatten()
        .any(|v| v < 0.0);
    if negative {
        bail!("Nutrition values must not be negative");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe_json() -> serde_json::Value {
        serde_json::json!({
            "id": 7,
            "name": "Avena con fruta",
            "description": "Desayuno rápido",
            "ingredients": ["avena", "plátano"],
            "preparation_steps": "Mezclar",
            "nutritional_info": {
                "per_serving": { "calories_kcal": 320.0, "protein_g": null }
            },
            "meal": "B",
            "goal": "L",
            "tags": [1, 2]
        })
    }

    #[test]
    fn test_recipe_deserialize() {
        let recipe: Recipe = serde_json::from_value(recipe_json()).unwrap();
        assert_eq!(recipe.id, 7);
        assert_eq!(recipe.meal, MealCategory::Breakfast);
        assert_eq!(recipe.goal, GoalCategory::WeightLoss);
        assert_eq!(recipe.tags, vec![1, 2]);
        assert_eq!(recipe.calories_per_serving(), Some(320.0));
        let per_serving = recipe.nutritional_info.per_serving.unwrap();
        assert!(per_serving.protein_g.is_none());
        assert!(recipe.nutritional_info.per_100g.is_none());
    }

    #[test]
    fn test_recipe_legacy_field_names() {
        let recipe: Recipe = serde_json::from_value(serde_json::json!({
            "id": 1,
            "name": "Sopa",
            "short_description": "Ligera",
            "preparation": "Hervir",
            "nutrition": { "per_100g": { "calories_kcal": 40.0 } },
            "meal": "D",
            "goal": "N"
        }))
        .unwrap();
        assert_eq!(recipe.description, "Ligera");
        assert_eq!(recipe.preparation_steps, "Hervir");
        assert!(recipe.ingredients.is_empty());
        assert!(recipe.nutritional_info.per_100g.is_some());
    }

    #[test]
    fn test_recipe_with_current_and_legacy_names() {
        let recipe: Recipe = serde_json::from_value(serde_json::json!({
            "id": 2,
            "name": "Crema de calabaza",
            "description": "Ligera",
            "short_description": "Ligera",
            "preparation_steps": "",
            "preparation": "Triturar",
            "nutritional_info": { "per_serving": { "calories_kcal": 180.0 } },
            "nutrition": { "per_serving": { "calories_kcal": 999.0 } },
            "ingredients": null,
            "meal": "D",
            "goal": "L",
            "tags": null
        }))
        .unwrap();
        assert_eq!(recipe.description, "Ligera");
        assert_eq!(recipe.preparation_steps, "Triturar");
        assert_eq!(recipe.calories_per_serving(), Some(180.0));
        assert!(recipe.ingredients.is_empty());
        assert!(recipe.tags.is_empty());

        // Serializes with the current names only and reads back unchanged.
        let json = serde_json::to_value(&recipe).unwrap();
        assert!(json.get("short_description").is_none());
        assert_eq!(serde_json::from_value::<Recipe>(json).unwrap(), recipe);
    }

    #[test]
    fn test_recipe_list_survives_mixed_payloads() {
        let recipes: Vec<Recipe> = serde_json::from_value(serde_json::json!([
            recipe_json(),
            {
                "id": 3,
                "name": "Sopa",
                "description": "Caliente",
                "short_description": "Caliente",
                "meal": "D",
                "goal": "N"
            }
        ]))
        .unwrap();
        assert_eq!(recipes.len(), 2);
    }

    #[test]
    fn test_recipe_unknown_meal_code_rejected() {
        let mut json = recipe_json();
        json["meal"] = serde_json::json!("X");
        assert!(serde_json::from_value::<Recipe>(json).is_err());
    }

    #[test]
    fn test_meal_category_parse() {
        assert_eq!("B".parse::<MealCategory>().unwrap(), MealCategory::Breakfast);
        assert_eq!("Lunch".parse::<MealCategory>().unwrap(), MealCategory::Lunch);
        assert_eq!("dinner".parse::<MealCategory>().unwrap(), MealCategory::Dinner);
        assert!("brunch".parse::<MealCategory>().is_err());
        assert_eq!(MealCategory::Dinner.code(), "D");
    }

    #[test]
    fn test_goal_category_parse() {
        assert_eq!("n".parse::<GoalCategory>().unwrap(), GoalCategory::Normal);
        assert_eq!(
            "weight-gain".parse::<GoalCategory>().unwrap(),
            GoalCategory::WeightGain
        );
        assert_eq!("loss".parse::<GoalCategory>().unwrap(), GoalCategory::WeightLoss);
        assert!("bulk".parse::<GoalCategory>().is_err());
    }

    #[test]
    fn test_locale_day_labels() {
        assert_eq!(Locale::Es.day_labels()[0], "Lunes");
        assert_eq!(Locale::Es.day_labels()[6], "Domingo");
        assert_eq!(Locale::En.day_labels()[2], "Wednesday");
        assert_eq!("EN".parse::<Locale>().unwrap(), Locale::En);
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn test_session_user_camel_case_last_name() {
        let user: SessionUser = serde_json::from_value(serde_json::json!({
            "id": 3,
            "email": "ana@example.com",
            "name": "Ana",
            "lastName": "García"
        }))
        .unwrap();
        assert_eq!(user.last_name, "García");
        assert!(!user.is_staff);
        assert!(!user.is_superuser);
    }

    #[test]
    fn test_validate_measurement() {
        assert!(validate_measurement(70.0, 175.0).is_ok());
        assert!(validate_measurement(0.0, 175.0).is_err());
        assert!(validate_measurement(70.0, 0.0).is_err());
        assert!(validate_measurement(-1.0, 175.0).is_err());
        assert!(validate_measurement(f64::NAN, 175.0).is_err());
        assert!(validate_weight(0.1).is_ok());
        assert!(validate_height(f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_tag() {
        let mut tag = Tag {
            id: None,
            name: "vegano".to_string(),
            description: None,
        };
        assert!(validate_tag(&tag).is_ok());
        tag.name = "   ".to_string();
        assert!(validate_tag(&tag).is_err());
    }

    #[test]
    fn test_validate_recipe_data() {
        let ingredients = vec!["arroz".to_string()];
        let mut nutrition = NutritionalInfo::default();
        assert!(validate_recipe_data("Arroz", &ingredients, &nutrition).is_ok());
        assert!(validate_recipe_data(" ", &ingredients, &nutrition).is_err());
        assert!(validate_recipe_data("Arroz", &[], &nutrition).is_err());

        nutrition.per_100g = Some(NutritionInfo {
            sodium_mg: Some(-5.0),
            ..NutritionInfo::default()
        });
        assert!(validate_recipe_data("Arroz", &ingredients, &nutrition).is_err());
    }
}
