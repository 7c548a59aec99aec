use anyhow::Result;

use nutriplan_core::api::{ProfileUpdate, RegisterRequest};
use nutriplan_core::models::{GoalCategory, IdealInfo};
use nutriplan_core::progress::{PreviousMeasurement, bmi_category};

use super::Service;
use super::helpers::{print_json, value_or_prompt};
use crate::config::Config;

pub(crate) fn cmd_login(
    svc: &Service,
    email: Option<String>,
    password: Option<String>,
    json: bool,
) -> Result<()> {
    let email = value_or_prompt(email, "Email")?;
    let password = value_or_prompt(password, "Password")?;
    let user = svc.login(&email, &password)?;

    if json {
        print_json(&user)?;
    } else {
        let name = format!("{} {}", user.name, user.last_name);
        println!("Logged in as {} <{}>", name.trim(), user.email);
        if user.is_staff || user.is_superuser {
            println!("  Administrator access enabled");
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_register(
    svc: &Service,
    email: String,
    password: Option<String>,
    first_name: String,
    last_name: String,
    age: u32,
    height: f64,
    weight: f64,
    goal_weight: Option<f64>,
    goal: Option<GoalCategory>,
    json: bool,
) -> Result<()> {
    let password = value_or_prompt(password, "Password")?;
    let request = RegisterRequest {
        email,
        password,
        first_name,
        last_name,
        age,
        height,
        weight,
        ideal: IdealInfo {
            ideal_weight: goal_weight,
        },
        goal,
    };
    let created = svc.register(&request)?;

    if json {
        print_json(&created)?;
    } else {
        println!("Registered {} (user #{})", created.email, created.id);
        println!("Run `nutriplan login` to start a session.");
    }
    Ok(())
}

pub(crate) fn cmd_logout(svc: &Service, json: bool) -> Result<()> {
    let result = svc.logout();
    if json {
        println!("{}", serde_json::json!({ "logged_out": true }));
    } else {
        println!("Logged out");
    }
    result
}

pub(crate) fn cmd_status(svc: &Service, config: &Config, json: bool) -> Result<()> {
    let session = svc.session()?;

    if json {
        print_json(&serde_json::json!({
            "api_url": config.api_url,
            "data_dir": config.data_dir,
            "session_file": config.session_path,
            "authenticated": session.is_authenticated(),
            "admin": session.is_admin(),
            "user": session.user,
            "week_plan_cached": session.has_week_plan(),
        }))?;
    } else {
        println!("API:        {}", config.api_url);
        println!("Data dir:   {}", config.data_dir.display());
        match &session.user {
            Some(u) if session.is_authenticated() => {
                let role = if session.is_admin() { " (admin)" } else { "" };
                println!("Logged in:  {}{role}", u.email);
            }
            _ => println!("Logged in:  no"),
        }
        println!(
            "Week plan:  {}",
            if session.has_week_plan() {
                "cached"
            } else {
                "none"
            }
        );
    }
    Ok(())
}

pub(crate) fn cmd_profile_show(svc: &Service, json: bool) -> Result<()> {
    let user = svc.current_user()?;

    if json {
        print_json(&user)?;
        return Ok(());
    }

    let previous = PreviousMeasurement::from_snapshot(&user);
    println!("{} <{}>", user.name, user.email);
    if let Some(age) = user.age {
        println!("  Age:          {age}");
    }
    println!("  Weight:       {:.1} kg", user.weight_kg);
    println!("  Height:       {:.0} cm", user.height_cm);
    println!(
        "  BMI:          {:.2} ({})",
        previous.bmi,
        bmi_category(previous.bmi, svc.locale())
    );
    match user.goal_weight_kg {
        Some(goal) => println!("  Goal weight:  {goal:.1} kg"),
        None => println!("  Goal weight:  not set"),
    }
    Ok(())
}

pub(crate) fn cmd_profile_update(
    svc: &Service,
    name: Option<&str>,
    update: ProfileUpdate,
    json: bool,
) -> Result<()> {
    let update = match name {
        Some(n) => update.with_full_name(n),
        None => update,
    };
    svc.update_profile(&update)?;

    if json {
        print_json(&serde_json::json!({ "updated": update }))?;
    } else {
        println!("Profile updated");
    }
    Ok(())
}

pub(crate) fn cmd_unsubscribe(
    svc: &Service,
    email: Option<String>,
    password: Option<String>,
    json: bool,
) -> Result<()> {
    let email = value_or_prompt(email, "Email")?;
    let password = value_or_prompt(password, "Password")?;
    svc.unsubscribe(&email, &password)?;

    if json {
        println!("{}", serde_json::json!({ "unsubscribed": email }));
    } else {
        println!("Unsubscribed {email}");
    }
    Ok(())
}
