use anyhow::{Result, bail};
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::api::{
    ApiError, Credentials, DietCreateRequest, DietResponse, HistoryQuery, LoginResponse,
    MeResponse, NotificationResponse, ProfileUpdate, ProgressRequest, ProgressResponse,
    RecipeCreateRequest, RegisterRequest, RegisterResponse,
};
use crate::diet::{WeekPlan, distribute_recipes};
use crate::models::{
    AdminUser, DietHistory, Locale, NewsArticle, Recipe, SessionUser, Tag, UserSnapshot,
    validate_height, validate_measurement, validate_recipe_data, validate_tag, validate_weight,
};
use crate::progress::{ComparisonResult, PreviousMeasurement, calculate_bmi};
use crate::session::{Session, SessionStore};

/// Remote diet API.
///
/// The CLI implements this with reqwest. Calls are blocking, so async callers
/// should run `NutriplanService` methods off the runtime's worker threads.
/// `token` is the session token when one is stored.
pub trait Backend: Send + Sync {
    fn login(&self, credentials: &Credentials) -> Result<LoginResponse>;
    fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse>;
    fn logout(&self, token: &str) -> Result<()>;
    fn unsubscribe(&self, credentials: &Credentials) -> Result<()>;

    fn current_user(&self, token: Option<&str>) -> Result<MeResponse>;
    fn update_profile(&self, token: Option<&str>, update: &ProfileUpdate) -> Result<()>;
    fn create_progress(
        &self,
        token: Option<&str>,
        request: &ProgressRequest,
    ) -> Result<ProgressResponse>;
    fn update_progress(
        &self,
        token: Option<&str>,
        request: &ProgressRequest,
    ) -> Result<ProgressResponse>;
    fn diet_history(&self, token: Option<&str>, query: &HistoryQuery) -> Result<Vec<DietHistory>>;

    fn list_recipes(&self, token: Option<&str>) -> Result<Vec<Recipe>>;
    fn create_recipe(&self, token: Option<&str>, recipe: &RecipeCreateRequest) -> Result<Recipe>;
    fn delete_recipe(&self, token: Option<&str>, id: i64) -> Result<()>;
    fn create_diet(&self, token: Option<&str>, request: &DietCreateRequest)
        -> Result<DietResponse>;
    fn delete_diet(&self, token: Option<&str>, id: i64) -> Result<()>;

    fn list_tags(&self, token: Option<&str>) -> Result<Vec<Tag>>;
    fn create_tag(&self, token: Option<&str>, tag: &Tag) -> Result<Tag>;
    fn update_tag(&self, token: Option<&str>, id: i64, tag: &Tag) -> Result<Tag>;
    fn delete_tag(&self, token: Option<&str>, id: i64) -> Result<()>;

    fn news(&self, token: Option<&str>, titles: &[String]) -> Result<Vec<NewsArticle>>;

    fn list_users(&self, token: Option<&str>) -> Result<Vec<AdminUser>>;
    fn send_email_notification(
        &self,
        token: Option<&str>,
        template: Option<&str>,
    ) -> Result<NotificationResponse>;
}

pub struct NutriplanService<B, S> {
    backend: B,
    store: S,
    locale: Locale,
}

impl<B: Backend, S: SessionStore> NutriplanService<B, S> {
    pub fn new(backend: B, store: S, locale: Locale) -> Self {
        Self {
            backend,
            store,
            locale,
        }
    }

    #[must_use]
    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn session(&self) -> Result<Session> {
        self.store.load()
    }

    /// Run a backend call with the stored token. A 401 wipes the stored
    /// session before the error is returned; the 401 is returned even when
    /// wiping fails.
    fn call<T>(&self, f: impl FnOnce(&B, Option<&str>) -> Result<T>) -> Result<T> {
        let session = self.store.load()?;
        let result = f(&self.backend, session.token.as_deref());
        if let Err(e) = &result {
            if ApiError::is_unauthorized_error(e) {
                warn!("Server rejected the session token, clearing local session");
                if let Err(clear_err) = self.store.clear() {
                    warn!(error = %format!("{clear_err:#}"), "Could not clear local session");
                }
            }
        }
        result
    }

    fn require_login(&self) -> Result<Session> {
        let session = self.store.load()?;
        if !session.is_authenticated() {
            bail!("Not logged in. Run `nutriplan login` first");
        }
        Ok(session)
    }

    fn require_admin(&self) -> Result<()> {
        let session = self.require_login()?;
        if !session.is_admin() {
            bail!("This operation requires an administrator account");
        }
        Ok(())
    }

    // --- Auth ---

    pub fn login(&self, email: &str, password: &str) -> Result<SessionUser> {
        let response = self.backend.login(&Credentials {
            email: email.trim().to_string(),
            password: password.to_string(),
        })?;
        let mut session = self.store.load()?;
        session.set_login(response.token, response.user.clone());
        self.store.save(&session)?;
        info!(user_id = response.user.id, "Logged in");
        Ok(response.user)
    }

    pub fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse> {
        validate_measurement(request.weight, request.height)?;
        self.backend.register(request)
    }

    /// Local state is cleared even when the server call fails.
    pub fn logout(&self) -> Result<()> {
        let session = self.store.load()?;
        let remote = match session.token.as_deref() {
            Some(token) if !token.is_empty() => self.backend.logout(token),
            _ => Ok(()),
        };
        self.store.clear()?;
        remote
    }

    pub fn unsubscribe(&self, email: &str, password: &str) -> Result<()> {
        self.backend.unsubscribe(&Credentials {
            email: email.trim().to_string(),
            password: password.to_string(),
        })?;
        self.store.clear()
    }

    // --- Profile ---

    pub fn current_user(&self) -> Result<UserSnapshot> {
        self.require_login()?;
        let me = self.call(|b, t| b.current_user(t))?;
        Ok(me.into_snapshot())
    }

    pub fn update_profile(&self, update: &ProfileUpdate) -> Result<()> {
        self.require_login()?;
        if update.is_empty() {
            bail!("Nothing to update");
        }
        if let Some(w) = update.weight {
            validate_weight(w)?;
        }
        if let Some(h) = update.height {
            validate_height(h)?;
        }
        self.call(|b, t| b.update_profile(t, update))
    }

    // --- Diets ---

    pub fn recipes(&self) -> Result<Vec<Recipe>> {
        self.call(|b, t| b.list_recipes(t))
    }

    /// Fetch recipes, lay them over the week and cache the plan. A failed
    /// fetch yields an empty plan rather than an error.
    pub fn generate_week_plan(&self) -> Result<WeekPlan> {
        let recipes = match self.recipes() {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Could not fetch recipes, generating an empty plan");
                Vec::new()
            }
        };
        let plan = distribute_recipes(&recipes, self.locale.day_labels());
        debug!(
            recipes = recipes.len(),
            filled = plan.filled_slots(),
            "Week plan generated"
        );
        let mut session = self.store.load()?;
        session.set_week_plan(plan.clone());
        self.store.save(&session)?;
        Ok(plan)
    }

    pub fn week_plan(&self) -> Result<Option<WeekPlan>> {
        Ok(self.store.load()?.week_plan)
    }

    pub fn clear_week_plan(&self) -> Result<()> {
        let mut session = self.store.load()?;
        session.clear_week_plan();
        self.store.save(&session)
    }

    pub fn recipe_from_plan(&self, id: i64) -> Result<Option<Recipe>> {
        Ok(self
            .week_plan()?
            .and_then(|plan| plan.find_recipe(id).cloned()))
    }

    /// Store the cached plan on the server as a diet.
    pub fn save_week_plan(&self) -> Result<DietResponse> {
        self.require_login()?;
        let Some(plan) = self.week_plan()? else {
            bail!("No week plan generated yet. Run `nutriplan diet generate` first");
        };
        let recipes = plan.recipe_ids();
        if recipes.is_empty() {
            bail!("The week plan has no recipes to save");
        }
        self.call(|b, t| b.create_diet(t, &DietCreateRequest { recipes }))
    }

    pub fn delete_diet(&self, id: i64) -> Result<()> {
        self.require_login()?;
        self.call(|b, t| b.delete_diet(t, id))
    }

    pub fn diet_history(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<DietHistory>> {
        self.require_login()?;
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                bail!("Start date {s} is after end date {e}");
            }
        }
        let query = HistoryQuery {
            start_date: start,
            end_date: end,
        };
        self.call(|b, t| b.diet_history(t, &query))
    }

    // --- Progress ---

    /// Record a new measurement and compare it with the previous one.
    ///
    /// The first measurement creates the progress record, later ones update
    /// it. The server's BMI is used when it sends one.
    pub fn process_progress(
        &self,
        new_weight_kg: f64,
        new_height_cm: f64,
    ) -> Result<ComparisonResult> {
        validate_measurement(new_weight_kg, new_height_cm)?;
        let user = self.current_user()?;
        let previous = PreviousMeasurement::from_snapshot(&user);
        let request = ProgressRequest {
            current_weight: new_weight_kg,
            current_height: new_height_cm,
        };

        let response = if user.progress.is_empty() {
            self.call(|b, t| b.create_progress(t, &request))?
        } else {
            self.call(|b, t| b.update_progress(t, &request))?
        };

        let new_bmi = if response.bmi > 0.0 {
            response.bmi
        } else {
            calculate_bmi(new_weight_kg, new_height_cm)
        };
        Ok(ComparisonResult::from_new_bmi(
            &previous,
            new_weight_kg,
            new_bmi,
            user.goal_weight_kg,
        ))
    }

    // --- News ---

    pub fn news(&self, titles: &[String]) -> Result<Vec<NewsArticle>> {
        self.call(|b, t| b.news(t, titles))
    }

    // --- Tags ---

    pub fn tags(&self) -> Result<Vec<Tag>> {
        self.call(|b, t| b.list_tags(t))
    }

    pub fn create_tag(&self, tag: &Tag) -> Result<Tag> {
        self.require_admin()?;
        validate_tag(tag)?;
        self.call(|b, t| b.create_tag(t, tag))
    }

    pub fn update_tag(&self, id: i64, tag: &Tag) -> Result<Tag> {
        self.require_admin()?;
        validate_tag(tag)?;
        self.call(|b, t| b.update_tag(t, id, tag))
    }

    pub fn delete_tag(&self, id: i64) -> Result<()> {
        self.require_admin()?;
        self.call(|b, t| b.delete_tag(t, id))
    }

    // --- Admin ---

    pub fn create_recipe(&self, recipe: &RecipeCreateRequest) -> Result<Recipe> {
        self.require_admin()?;
        validate_recipe_data(&recipe.name, &recipe.ingredients, &recipe.nutritional_info)?;
        self.call(|b, t| b.create_recipe(t, recipe))
    }

    pub fn delete_recipe(&self, id: i64) -> Result<()> {
        self.require_admin()?;
        self.call(|b, t| b.delete_recipe(t, id))
    }

    pub fn users(&self) -> Result<Vec<AdminUser>> {
        self.require_admin()?;
        self.call(|b, t| b.list_users(t))
    }

    pub fn send_email_notification(&self, template: Option<&str>) -> Result<NotificationResponse> {
        self.require_admin()?;
        self.call(|b, t| b.send_email_notification(t, template))
    }
}
