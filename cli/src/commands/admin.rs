use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;
use tabled::{Table, Tabled, settings::Style};

use nutriplan_core::api::RecipeCreateRequest;
use nutriplan_core::models::{
    AdminUser, GoalCategory, MealCategory, NutritionInfo, NutritionalInfo, Tag,
};

use super::Service;
use super::helpers::{fmt_opt, print_json, print_recipe_detail, truncate};

/// Per-serving values given on the command line.
pub(crate) struct ServingNutrition {
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub serving: Option<f64>,
}

impl ServingNutrition {
    fn into_info(self) -> NutritionalInfo {
        let per_serving = NutritionInfo {
            serving_g: self.serving,
            calories_kcal: self.calories,
            protein_g: self.protein,
            carbs_g: self.carbs,
            fat_g: self.fat,
            ..NutritionInfo::default()
        };
        NutritionalInfo {
            per_serving: (per_serving != NutritionInfo::default()).then_some(per_serving),
            per_100g: None,
        }
    }
}

pub(crate) struct NewRecipe {
    pub name: String,
    pub description: Option<String>,
    pub ingredients: Vec<String>,
    pub preparation: Option<String>,
    pub meal: MealCategory,
    pub goal: GoalCategory,
    pub tags: Vec<i64>,
    pub image_url: Option<String>,
    pub nutrition: ServingNutrition,
}

pub(crate) fn cmd_recipe_add(svc: &Service, recipe: NewRecipe, json: bool) -> Result<()> {
    let request = RecipeCreateRequest {
        name: recipe.name,
        description: recipe.description.unwrap_or_default(),
        ingredients: recipe.ingredients,
        preparation_steps: recipe.preparation.unwrap_or_default(),
        nutritional_info: recipe.nutrition.into_info(),
        meal: recipe.meal,
        goal: recipe.goal,
        tags: recipe.tags,
        image_url: recipe.image_url,
    };
    let created = svc.create_recipe(&request)?;

    if json {
        print_json(&created)?;
    } else {
        println!("Created recipe #{}", created.id);
        print_recipe_detail(&created);
    }
    Ok(())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ImportFile {
    Many(Vec<RecipeCreateRequest>),
    One(Box<RecipeCreateRequest>),
}

fn parse_recipe_import(input: &str) -> Result<Vec<RecipeCreateRequest>> {
    let parsed: ImportFile =
        serde_json::from_str(input).context("Expected a recipe object or an array of recipes")?;
    let recipes = match parsed {
        ImportFile::Many(list) => list,
        ImportFile::One(r) => vec![*r],
    };
    if recipes.is_empty() {
        bail!("No recipes found in file");
    }
    Ok(recipes)
}

fn read_recipe_import(file: &Path) -> Result<Vec<RecipeCreateRequest>> {
    let input = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read file: {}", file.display()))?;
    parse_recipe_import(&input)
        .with_context(|| format!("Failed to parse recipe file: {}", file.display()))
}

pub(crate) fn cmd_recipe_import(svc: &Service, file: &Path, json: bool) -> Result<()> {
    let recipes = read_recipe_import(file)?;

    let mut created = Vec::with_capacity(recipes.len());
    for request in &recipes {
        let recipe = svc
            .create_recipe(request)
            .with_context(|| format!("Failed to import '{}'", request.name))?;
        created.push(recipe);
    }

    if json {
        print_json(&created)?;
    } else {
        for r in &created {
            println!("Imported #{} {}", r.id, r.name);
        }
        println!("{} recipe(s) imported", created.len());
    }
    Ok(())
}

pub(crate) fn cmd_recipe_delete(svc: &Service, id: i64, json: bool) -> Result<()> {
    svc.delete_recipe(id)?;

    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted recipe {id}");
    }
    Ok(())
}

pub(crate) fn cmd_tag_list(svc: &Service, json: bool) -> Result<()> {
    let tags = svc.tags()?;

    if json {
        print_json(&tags)?;
    } else if tags.is_empty() {
        eprintln!("No tags defined.");
    } else {
        print_tag_table(&tags);
    }
    Ok(())
}

pub(crate) fn cmd_tag_add(
    svc: &Service,
    name: String,
    description: Option<String>,
    json: bool,
) -> Result<()> {
    let tag = svc.create_tag(&Tag {
        id: None,
        name,
        description,
    })?;

    if json {
        print_json(&tag)?;
    } else {
        println!(
            "Created tag {} ({})",
            tag.name,
            tag.id.map_or_else(|| "-".to_string(), |id| format!("#{id}"))
        );
    }
    Ok(())
}

pub(crate) fn cmd_tag_update(
    svc: &Service,
    id: i64,
    name: String,
    description: Option<String>,
    json: bool,
) -> Result<()> {
    let tag = svc.update_tag(
        id,
        &Tag {
            id: Some(id),
            name,
            description,
        },
    )?;

    if json {
        print_json(&tag)?;
    } else {
        println!("Updated tag #{id}: {}", tag.name);
    }
    Ok(())
}

pub(crate) fn cmd_tag_delete(svc: &Service, id: i64, json: bool) -> Result<()> {
    svc.delete_tag(id)?;

    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted tag {id}");
    }
    Ok(())
}

pub(crate) fn cmd_users(svc: &Service, json: bool) -> Result<()> {
    let users = svc.users()?;

    if json {
        print_json(&users)?;
    } else if users.is_empty() {
        eprintln!("No users.");
    } else {
        print_user_table(&users);
    }
    Ok(())
}

pub(crate) fn cmd_notify(svc: &Service, template: Option<&str>, json: bool) -> Result<()> {
    let response = svc.send_email_notification(template)?;

    if json {
        print_json(&response)?;
    } else {
        println!("{} ({} recipients)", response.detail, response.count);
    }
    Ok(())
}

fn print_tag_table(tags: &[Tag]) {
    #[derive(Tabled)]
    struct TagRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Description")]
        description: String,
    }

    let rows: Vec<TagRow> = tags
        .iter()
        .map(|t| TagRow {
            id: t.id.map_or_else(|| "-".to_string(), |id| id.to_string()),
            name: t.name.clone(),
            description: truncate(t.description.as_deref().unwrap_or(""), 50),
        })
        .collect();

    println!("{}", Table::new(&rows).with(Style::rounded()));
}

fn print_user_table(users: &[AdminUser]) {
    #[derive(Tabled)]
    struct UserRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Email")]
        email: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Weight")]
        weight: String,
        #[tabled(rename = "BMI")]
        bmi: String,
        #[tabled(rename = "Role")]
        role: &'static str,
    }

    let rows: Vec<UserRow> = users
        .iter()
        .map(|u| UserRow {
            id: u.id,
            email: u.email.clone(),
            name: truncate(format!("{} {}", u.first_name, u.last_name).trim(), 30),
            weight: fmt_opt(u.weight, 1),
            bmi: fmt_opt(u.progress.as_ref().map(|p| p.bmi), 2),
            role: if u.is_superuser {
                "superuser"
            } else if u.is_staff {
                "staff"
            } else {
                "user"
            },
        })
        .collect();

    println!("{}", Table::new(&rows).with(Style::rounded()));
}
