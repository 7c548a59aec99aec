mod admin;
mod auth;
mod diet;
mod helpers;
mod news;
mod progress;

use nutriplan_core::service::NutriplanService;
use nutriplan_core::session::FileSessionStore;

use crate::client::ApiClient;

pub(crate) type Service = NutriplanService<ApiClient, FileSessionStore>;

pub(crate) use admin::{
    NewRecipe, ServingNutrition, cmd_notify, cmd_recipe_add, cmd_recipe_delete, cmd_recipe_import,
    cmd_tag_add, cmd_tag_delete, cmd_tag_list, cmd_tag_update, cmd_users,
};
pub(crate) use auth::{
    cmd_login, cmd_logout, cmd_profile_show, cmd_profile_update, cmd_register, cmd_status,
    cmd_unsubscribe,
};
pub(crate) use diet::{
    cmd_diet_clear, cmd_diet_delete, cmd_diet_generate, cmd_diet_history, cmd_diet_recipe,
    cmd_diet_save, cmd_diet_show, cmd_recipes,
};
pub(crate) use news::cmd_news;
pub(crate) use progress::{cmd_bmi, cmd_goal_percentage, cmd_progress_history, cmd_progress_record};
