use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use nutriplan_core::models::Recipe;

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn parse_date(date_str: Option<String>) -> Result<Option<NaiveDate>> {
    let Some(s) = date_str else {
        return Ok(None);
    };
    let today = Local::now().date_naive();
    let date = match s.as_str() {
        "today" => today,
        "yesterday" => today - chrono::Duration::days(1),
        "tomorrow" => today + chrono::Duration::days(1),
        _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d").with_context(|| {
            format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
        })?,
    };
    Ok(Some(date))
}

/// Read one line from stdin after printing `label` to stderr.
pub(crate) fn prompt_line(label: &str) -> Result<String> {
    eprint!("{label}: ");
    io::stderr().flush()?;
    let stdin = io::stdin();
    let line = stdin.lock().lines().next().context("No input")??;
    let line = line.trim().to_string();
    if line.is_empty() {
        bail!("{label} must not be empty");
    }
    Ok(line)
}

pub(crate) fn value_or_prompt(value: Option<String>, label: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => prompt_line(label),
    }
}

pub(crate) fn print_recipe_table(recipes: &[Recipe]) {
    #[derive(Tabled)]
    struct RecipeRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Meal")]
        meal: String,
        #[tabled(rename = "Goal")]
        goal: String,
        #[tabled(rename = "kcal/serving")]
        calories: String,
        #[tabled(rename = "Tags")]
        tags: String,
    }

    let rows: Vec<RecipeRow> = recipes
        .iter()
        .map(|r| RecipeRow {
            id: r.id,
            name: truncate(&r.name, 40),
            meal: r.meal.to_string(),
            goal: r.goal.to_string(),
            calories: fmt_opt(r.calories_per_serving(), 0),
            tags: r
                .tags
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(","),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(4..5)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn print_recipe_detail(recipe: &Recipe) {
    println!("{} (#{})", recipe.name, recipe.id);
    println!("  Meal: {}   Goal: {}", recipe.meal, recipe.goal);
    if !recipe.description.is_empty() {
        println!("  {}", recipe.description);
    }
    if !recipe.ingredients.is_empty() {
        println!("\nIngredients:");
        for ingredient in &recipe.ingredients {
            println!("  - {ingredient}");
        }
    }
    if !recipe.preparation_steps.is_empty() {
        println!("\nPreparation:\n  {}", recipe.preparation_steps);
    }
    if let Some(n) = &recipe.nutritional_info.per_serving {
        println!(
            "\nPer serving: {} kcal, P {} g, C {} g, F {} g",
            fmt_opt(n.calories_kcal, 0),
            fmt_opt(n.protein_g, 1),
            fmt_opt(n.carbs_g, 1),
            fmt_opt(n.fat_g, 1),
        );
    }
    if let Some(n) = &recipe.nutritional_info.per_100g {
        println!(
            "Per 100 g:   {} kcal, P {} g, C {} g, F {} g",
            fmt_opt(n.calories_kcal, 0),
            fmt_opt(n.protein_g, 1),
            fmt_opt(n.carbs_g, 1),
            fmt_opt(n.fat_g, 1),
        );
    }
}

pub(crate) fn fmt_opt(v: Option<f64>, decimals: usize) -> String {
    v.map_or_else(|| "-".to_string(), |v| format!("{v:.decimals$}"))
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_none() {
        assert_eq!(parse_date(None).unwrap(), None);
    }

    #[test]
    fn test_parse_date_keywords() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date(Some("today".to_string())).unwrap(), Some(today));
        assert_eq!(
            parse_date(Some("yesterday".to_string())).unwrap(),
            Some(today - chrono::Duration::days(1))
        );
    }

    #[test]
    fn test_parse_date_iso() {
        let date = parse_date(Some("2024-01-15".to_string())).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15));
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date(Some("nope".to_string())).is_err());
    }

    #[test]
    fn test_fmt_opt() {
        assert_eq!(fmt_opt(None, 1), "-");
        assert_eq!(fmt_opt(Some(12.345), 1), "12.3");
        assert_eq!(fmt_opt(Some(320.0), 0), "320");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hola", 10), "hola");
        assert_eq!(truncate("Ensalada de quinoa con aguacate", 12), "Ensalada ...");
        assert_eq!(truncate("Crème brûlée casera", 10), "Crème b...");
    }

    #[test]
    fn test_value_or_prompt_uses_value() {
        assert_eq!(
            value_or_prompt(Some("x".to_string()), "Email").unwrap(),
            "x"
        );
    }
}
