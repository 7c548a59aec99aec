use anyhow::{Result, bail};
use tabled::{Table, Tabled, settings::Style};

use nutriplan_core::diet::WeekPlan;
use nutriplan_core::models::DietHistory;

use super::Service;
use super::helpers::{
    parse_date, print_json, print_recipe_detail, print_recipe_table, truncate,
};

pub(crate) fn cmd_recipes(svc: &Service, json: bool) -> Result<()> {
    let recipes = svc.recipes()?;

    if json {
        print_json(&recipes)?;
    } else if recipes.is_empty() {
        eprintln!("No recipes available.");
    } else {
        print_recipe_table(&recipes);
    }
    Ok(())
}

pub(crate) fn cmd_diet_generate(svc: &Service, json: bool) -> Result<()> {
    let plan = svc.generate_week_plan()?;

    if json {
        print_json(&plan)?;
    } else {
        print_week_plan(&plan);
        if plan.filled_slots() == 0 {
            eprintln!("No recipes were available, the plan is empty.");
        }
    }
    Ok(())
}

pub(crate) fn cmd_diet_show(svc: &Service, json: bool) -> Result<()> {
    let plan = svc.week_plan()?;

    match plan {
        Some(plan) if json => print_json(&plan)?,
        Some(plan) => print_week_plan(&plan),
        None if json => println!("null"),
        None => eprintln!("No week plan yet. Use `nutriplan diet generate` to create one."),
    }
    Ok(())
}

pub(crate) fn cmd_diet_recipe(svc: &Service, id: i64, json: bool) -> Result<()> {
    let Some(recipe) = svc.recipe_from_plan(id)? else {
        bail!("Recipe {id} is not in the current week plan");
    };

    if json {
        print_json(&recipe)?;
    } else {
        print_recipe_detail(&recipe);
    }
    Ok(())
}

pub(crate) fn cmd_diet_save(svc: &Service, json: bool) -> Result<()> {
    let diet = svc.save_week_plan()?;

    if json {
        print_json(&diet)?;
    } else {
        println!(
            "Saved diet #{} ({} to {}, {} recipes)",
            diet.id,
            diet.start_date,
            diet.end_date,
            diet.recipes.len()
        );
    }
    Ok(())
}

pub(crate) fn cmd_diet_clear(svc: &Service, json: bool) -> Result<()> {
    svc.clear_week_plan()?;

    if json {
        println!("{}", serde_json::json!({ "cleared": true }));
    } else {
        println!("Week plan cleared");
    }
    Ok(())
}

pub(crate) fn cmd_diet_delete(svc: &Service, id: i64, json: bool) -> Result<()> {
    svc.delete_diet(id)?;

    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted diet {id}");
    }
    Ok(())
}

pub(crate) fn cmd_diet_history(
    svc: &Service,
    from: Option<String>,
    to: Option<String>,
    json: bool,
) -> Result<()> {
    let history = svc.diet_history(parse_date(from)?, parse_date(to)?)?;

    if json {
        print_json(&history)?;
    } else if history.is_empty() {
        eprintln!("No diet history found.");
    } else {
        for diet in &history {
            print_history(diet);
        }
    }
    Ok(())
}

fn print_history(diet: &DietHistory) {
    println!(
        "{} → {}",
        diet.start_date.format("%Y-%m-%d"),
        diet.end_date.format("%Y-%m-%d")
    );
    for menu in &diet.menus {
        let names: Vec<&str> = menu.recipes.iter().map(|r| r.name.as_str()).collect();
        println!("  Day {}: {}", menu.day, names.join(", "));
    }
}

fn print_week_plan(plan: &WeekPlan) {
    #[derive(Tabled)]
    struct DayRow {
        #[tabled(rename = "Day")]
        day: String,
        #[tabled(rename = "Breakfast")]
        breakfast: String,
        #[tabled(rename = "Lunch")]
        lunch: String,
        #[tabled(rename = "Dinner")]
        dinner: String,
    }

    let cell = |r: Option<&nutriplan_core::models::Recipe>| {
        r.map_or_else(|| "-".to_string(), |r| format!("{} (#{})", truncate(&r.name, 28), r.id))
    };

    let rows: Vec<DayRow> = plan
        .days()
        .iter()
        .map(|d| DayRow {
            day: d.day.clone(),
            breakfast: cell(d.breakfast.as_ref()),
            lunch: cell(d.lunch.as_ref()),
            dinner: cell(d.dinner.as_ref()),
        })
        .collect();

    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");

    let total = plan.total_calories();
    if total > 0.0 {
        println!("Planned energy: {total:.0} kcal for the week");
    }
}
