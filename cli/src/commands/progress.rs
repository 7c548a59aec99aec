use anyhow::Result;

use nutriplan_core::models::{Locale, validate_measurement};
use nutriplan_core::progress::{
    ComparisonResult, bmi_category, calculate_bmi, normalize_history, progress_percentage,
};

use super::Service;
use super::helpers::print_json;

pub(crate) fn cmd_progress_record(
    svc: &Service,
    weight: f64,
    height: f64,
    json: bool,
) -> Result<()> {
    let result = svc.process_progress(weight, height)?;

    if json {
        print_json(&result)?;
    } else {
        print_comparison(&result, svc.locale());
    }
    Ok(())
}

pub(crate) fn cmd_progress_history(svc: &Service, json: bool) -> Result<()> {
    let user = svc.current_user()?;
    let history = normalize_history(&user.progress);

    if json {
        print_json(&history)?;
    } else if history.is_empty() {
        eprintln!("No progress recorded yet. Use `nutriplan progress record` to add one.");
    } else {
        for entry in &history {
            println!(
                "{}  BMI {:.2} ({})",
                entry
                    .registration_date
                    .map_or_else(|| "undated".to_string(), |d| d.format("%Y-%m-%d").to_string()),
                entry.bmi,
                bmi_category(entry.bmi, svc.locale())
            );
        }
    }
    Ok(())
}

/// Offline BMI calculation, no session needed.
pub(crate) fn cmd_bmi(locale: Locale, weight: f64, height: f64, json: bool) -> Result<()> {
    validate_measurement(weight, height)?;
    let bmi = calculate_bmi(weight, height);
    let category = bmi_category(bmi, locale);

    if json {
        println!(
            "{}",
            serde_json::json!({ "bmi": bmi, "category": category })
        );
    } else {
        println!("BMI {bmi:.2} ({category})");
    }
    Ok(())
}

pub(crate) fn cmd_goal_percentage(current: f64, initial: f64, goal: f64, json: bool) -> Result<()> {
    let pct = progress_percentage(current, initial, goal);

    if json {
        println!("{}", serde_json::json!({ "percentage": pct }));
    } else {
        println!("{pct:.1}% of the way from {initial:.1} kg to {goal:.1} kg");
    }
    Ok(())
}

fn print_comparison(r: &ComparisonResult, locale: Locale) {
    let arrow = |improved: bool| if improved { "▲ better" } else { "▼ not better" };

    println!(
        "BMI:    {:.2} → {:.2}  (Δ {:.2}, {})",
        r.previous_bmi,
        r.new_bmi,
        r.bmi_difference,
        arrow(r.is_improvement)
    );
    println!(
        "Weight: {:.1} → {:.1} kg  (Δ {:.2} kg, {})",
        r.previous_weight,
        r.new_weight,
        r.weight_difference,
        arrow(r.weight_improvement)
    );
    println!("Category: {}", r.category_label(locale));
    if r.percentage > 0.0 {
        println!("Toward goal: {:.1}%", r.percentage);
    }
    if r.achieved_goal {
        println!("Goal weight reached!");
    }
}
