mod client;
mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{EnvFilter, fmt};

use nutriplan_core::api::ProfileUpdate;
use nutriplan_core::models::{GoalCategory, MealCategory};
use nutriplan_core::service::NutriplanService;
use nutriplan_core::session::FileSessionStore;

use crate::client::ApiClient;
use crate::commands::{
    NewRecipe, Service, ServingNutrition, cmd_bmi, cmd_diet_clear, cmd_diet_delete,
    cmd_diet_generate, cmd_diet_history, cmd_diet_recipe, cmd_diet_save, cmd_diet_show,
    cmd_goal_percentage, cmd_login, cmd_logout, cmd_news, cmd_notify, cmd_profile_show,
    cmd_profile_update, cmd_progress_history, cmd_progress_record, cmd_recipe_add,
    cmd_recipe_delete, cmd_recipe_import, cmd_recipes, cmd_register, cmd_status, cmd_tag_add,
    cmd_tag_delete, cmd_tag_list, cmd_tag_update, cmd_unsubscribe, cmd_users,
};
use crate::config::Config;

#[derive(Parser)]
#[command(
    name = "nutriplan",
    version,
    about = "Weekly meal plans and weight progress from the terminal"
)]
struct Cli {
    /// Log debug output to stderr (overridden by NUTRIPLAN_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session token
    Login {
        #[arg(long)]
        email: Option<String>,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a new account
    Register {
        #[arg(long)]
        email: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        #[arg(long)]
        age: u32,
        /// Height in cm
        #[arg(long)]
        height: f64,
        /// Weight in kg
        #[arg(long)]
        weight: f64,
        /// Target weight in kg
        #[arg(long)]
        goal_weight: Option<f64>,
        /// Dietary goal: normal, gain, loss
        #[arg(long)]
        goal: Option<GoalCategory>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// End the session (local data is cleared even if the server is unreachable)
    Logout {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete the account and end the session
    Unsubscribe {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show API endpoint, data directory and session state
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// View or edit your profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// List all recipes
    Recipes {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate, view and save weekly diets
    Diet {
        #[command(subcommand)]
        command: DietCommands,
    },
    /// Record and review weight progress
    Progress {
        #[command(subcommand)]
        command: ProgressCommands,
    },
    /// Calculate BMI offline
    Bmi {
        /// Weight in kg
        weight: f64,
        /// Height in cm
        height: f64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Percentage of the way from an initial weight to a goal weight
    GoalProgress {
        /// Current weight in kg
        #[arg(long)]
        current: f64,
        /// Starting weight in kg
        #[arg(long)]
        initial: f64,
        /// Goal weight in kg
        #[arg(long)]
        goal: f64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Nutrition news
    News {
        /// Filter by title keyword (repeatable)
        #[arg(short, long = "title")]
        titles: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Administrator commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show your profile and current BMI
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update profile fields
    Update {
        /// Full name, split into first and last name at the first space
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        age: Option<u32>,
        /// Height in cm
        #[arg(long)]
        height: Option<f64>,
        /// Weight in kg
        #[arg(long)]
        weight: Option<f64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum DietCommands {
    /// Build a new week plan from the recipe catalogue
    Generate {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the current week plan
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a recipe from the current week plan
    Recipe {
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Save the current week plan to your account
    Save {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Discard the current week plan
    Clear {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a saved diet
    Delete {
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show saved diets
    History {
        /// Start date (YYYY-MM-DD, today, yesterday)
        #[arg(long)]
        from: Option<String>,
        /// End date (YYYY-MM-DD, today, yesterday)
        #[arg(long)]
        to: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ProgressCommands {
    /// Record a new measurement and compare it with the previous one
    Record {
        /// Weight in kg
        weight: f64,
        /// Height in cm
        height: f64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show recorded BMI history
    History {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Manage recipes
    Recipe {
        #[command(subcommand)]
        command: AdminRecipeCommands,
    },
    /// Manage tags
    Tag {
        #[command(subcommand)]
        command: TagCommands,
    },
    /// List registered users
    Users {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Send the email notification to all users
    Notify {
        /// Template name
        #[arg(long)]
        template: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum AdminRecipeCommands {
    /// Create a recipe
    Add {
        name: String,
        /// Meal: breakfast, lunch, dinner
        #[arg(short, long)]
        meal: MealCategory,
        /// Goal: normal, gain, loss
        #[arg(short, long)]
        goal: GoalCategory,
        /// Ingredient (repeatable)
        #[arg(short, long = "ingredient", required = true)]
        ingredients: Vec<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        preparation: Option<String>,
        /// Tag ID (repeatable)
        #[arg(long = "tag")]
        tags: Vec<i64>,
        #[arg(long)]
        image_url: Option<String>,
        /// Calories per serving
        #[arg(long)]
        calories: Option<f64>,
        /// Protein per serving in grams
        #[arg(long)]
        protein: Option<f64>,
        /// Carbs per serving in grams
        #[arg(long)]
        carbs: Option<f64>,
        /// Fat per serving in grams
        #[arg(long)]
        fat: Option<f64>,
        /// Serving size in grams
        #[arg(long)]
        serving: Option<f64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create recipes from a JSON file (one object or an array)
    Import {
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a recipe
    Delete {
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum TagCommands {
    /// List tags
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a tag
    Add {
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rename or describe a tag
    Update {
        id: i64,
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a tag
    Delete {
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env("NUTRIPLAN_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[allow(clippy::too_many_lines)]
fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;

    // Offline commands need neither the API client nor the session file.
    match cli.command {
        Commands::Bmi {
            weight,
            height,
            json,
        } => return cmd_bmi(config.locale, weight, height, json),
        Commands::GoalProgress {
            current,
            initial,
            goal,
            json,
        } => return cmd_goal_percentage(current, initial, goal, json),
        _ => {}
    }

    let client = ApiClient::new(&config.api_url)?;
    let store = FileSessionStore::new(config.session_path.clone());
    let svc: Service = NutriplanService::new(client, store, config.locale);

    match cli.command {
        Commands::Login {
            email,
            password,
            json,
        } => cmd_login(&svc, email, password, json),
        Commands::Register {
            email,
            password,
            first_name,
            last_name,
            age,
            height,
            weight,
            goal_weight,
            goal,
            json,
        } => cmd_register(
            &svc,
            email,
            password,
            first_name,
            last_name,
            age,
            height,
            weight,
            goal_weight,
            goal,
            json,
        ),
        Commands::Logout { json } => cmd_logout(&svc, json),
        Commands::Unsubscribe {
            email,
            password,
            json,
        } => cmd_unsubscribe(&svc, email, password, json),
        Commands::Status { json } => cmd_status(&svc, &config, json),
        Commands::Profile { command } => match command {
            ProfileCommands::Show { json } => cmd_profile_show(&svc, json),
            ProfileCommands::Update {
                name,
                first_name,
                last_name,
                email,
                age,
                height,
                weight,
                json,
            } => {
                let update = ProfileUpdate {
                    first_name,
                    last_name,
                    email,
                    age,
                    height,
                    weight,
                };
                cmd_profile_update(&svc, name.as_deref(), update, json)
            }
        },
        Commands::Recipes { json } => cmd_recipes(&svc, json),
        Commands::Diet { command } => match command {
            DietCommands::Generate { json } => cmd_diet_generate(&svc, json),
            DietCommands::Show { json } => cmd_diet_show(&svc, json),
            DietCommands::Recipe { id, json } => cmd_diet_recipe(&svc, id, json),
            DietCommands::Save { json } => cmd_diet_save(&svc, json),
            DietCommands::Clear { json } => cmd_diet_clear(&svc, json),
            DietCommands::Delete { id, json } => cmd_diet_delete(&svc, id, json),
            DietCommands::History { from, to, json } => cmd_diet_history(&svc, from, to, json),
        },
        Commands::Progress { command } => match command {
            ProgressCommands::Record {
                weight,
                height,
                json,
            } => cmd_progress_record(&svc, weight, height, json),
            ProgressCommands::History { json } => cmd_progress_history(&svc, json),
        },
        Commands::News { titles, json } => cmd_news(&svc, &titles, json),
        Commands::Admin { command } => match command {
            AdminCommands::Recipe { command } => match command {
                AdminRecipeCommands::Add {
                    name,
                    meal,
                    goal,
                    ingredients,
                    description,
                    preparation,
                    tags,
                    image_url,
                    calories,
                    protein,
                    carbs,
                    fat,
                    serving,
                    json,
                } => cmd_recipe_add(
                    &svc,
                    NewRecipe {
                        name,
                        description,
                        ingredients,
                        preparation,
                        meal,
                        goal,
                        tags,
                        image_url,
                        nutrition: ServingNutrition {
                            calories,
                            protein,
                            carbs,
                            fat,
                            serving,
                        },
                    },
                    json,
                ),
                AdminRecipeCommands::Import { file, json } => cmd_recipe_import(&svc, &file, json),
                AdminRecipeCommands::Delete { id, json } => cmd_recipe_delete(&svc, id, json),
            },
            AdminCommands::Tag { command } => match command {
                TagCommands::List { json } => cmd_tag_list(&svc, json),
                TagCommands::Add {
                    name,
                    description,
                    json,
                } => cmd_tag_add(&svc, name, description, json),
                TagCommands::Update {
                    id,
                    name,
                    description,
                    json,
                } => cmd_tag_update(&svc, id, name, description, json),
                TagCommands::Delete { id, json } => cmd_tag_delete(&svc, id, json),
            },
            AdminCommands::Users { json } => cmd_users(&svc, json),
            AdminCommands::Notify { template, json } => {
                cmd_notify(&svc, template.as_deref(), json)
            }
        },
        Commands::Bmi { .. } | Commands::GoalProgress { .. } => Ok(()),
    }
}
