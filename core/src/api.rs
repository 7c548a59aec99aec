//! Request and response payloads for every endpoint the client talks to.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{
    GoalCategory, IdealInfo, MealCategory, NewsArticle, NutritionalInfo, ProgressEntry,
    ProgressSummary, SessionUser, UserSnapshot,
};

pub mod paths {
    pub const LOGIN: &str = "/users/login/";
    pub const REGISTER: &str = "/users/register/";
    pub const LOGOUT: &str = "/users/logout/";
    pub const ME: &str = "/users/me/";
    pub const PROGRESS: &str = "/users/progress/";
    pub const PROGRESS_PATCH: &str = "/users/progress/patch/";
    pub const HISTORY: &str = "/users/historical/";
    pub const UNSUBSCRIBE: &str = "/users/unsubscribe-by-credentials/";
    pub const USERS: &str = "/users/get-users/";
    pub const RECIPES: &str = "/diets/recipes/";
    pub const DIETS: &str = "/diets/diets/";
    pub const TAGS: &str = "/diets/tags/";
    pub const NEWS: &str = "/news/news/";
    pub const EMAIL_NOTIFICATION: &str = "/notifications/email-notification/";

    #[must_use]
    pub fn recipe(id: i64) -> String {
        format!("{RECIPES}{id}/")
    }

    #[must_use]
    pub fn diet(id: i64) -> String {
        format!("{DIETS}{id}/")
    }

    #[must_use]
    pub fn tag(id: i64) -> String {
        format!("{TAGS}{id}/")
    }
}

// --- Auth ---

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: SessionUser,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
    pub height: f64,
    pub weight: f64,
    pub ideal: IdealInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<GoalCategory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "lastName")]
    pub last_name: String,
}

// --- Current user ---

#[derive(Debug, Clone, Deserialize)]
pub struct MeResponse {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub ideal: Option<IdealInfo>,
    #[serde(default)]
    pub progress: Option<ProgressSummary>,
}

impl MeResponse {
    #[must_use]
    pub fn into_snapshot(self) -> UserSnapshot {
        let name = format!(
            "{} {}",
            self.first_name,
            self.last_name.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string();

        let progress = self
            .progress
            .into_iter()
            .map(|p| {
                let raw = p.last_updated.as_deref().unwrap_or_default();
                let registration_date = parse_api_date(raw);
                if registration_date.is_none() {
                    warn!(last_updated = raw, "Progress entry has no usable date");
                }
                ProgressEntry {
                    bmi: p.bmi,
                    registration_date,
                }
            })
            .collect();

        UserSnapshot {
            id: self.id,
            name,
            email: self.email,
            age: self.age,
            weight_kg: self.weight.unwrap_or_default(),
            height_cm: self.height.unwrap_or_default(),
            goal_weight_kg: self
                .ideal
                .and_then(|i| i.ideal_weight)
                .filter(|w| *w > 0.0),
            progress,
        }
    }
}

/// Only the fields that are set are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl ProfileUpdate {
    /// Split a full name into first name and the rest.
    #[must_use]
    pub fn with_full_name(mut self, full_name: &str) -> Self {
        let mut parts = full_name.split_whitespace();
        if let Some(first) = parts.next() {
            self.first_name = Some(first.to_string());
            let rest: Vec<&str> = parts.collect();
            if !rest.is_empty() {
                self.last_name = Some(rest.join(" "));
            }
        }
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.age.is_none()
            && self.height.is_none()
            && self.weight.is_none()
    }
}

// --- Progress ---

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ProgressRequest {
    pub current_weight: f64,
    pub current_height: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProgressResponse {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub user: i64,
    pub current_weight: f64,
    pub current_height: f64,
    pub bmi: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub registration_date: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct HistoryQuery {
    #[serde(rename = "startDate", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "endDate", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

// --- Diets / recipes ---

#[derive(Debug, Clone, Serialize)]
pub struct DietCreateRequest {
    pub recipes: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DietResponse {
    pub id: i64,
    pub user: i64,
    #[serde(rename = "startDate")]
    pub start_date: String,
    #[serde(rename = "endDate")]
    pub end_date: String,
    pub recipes: Vec<i64>,
}

/// Body of `POST recipes/`. Also the shape accepted by recipe import files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeCreateRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub ingredients: Vec<String>,
    #[serde(default, alias = "preparation")]
    pub preparation_steps: String,
    #[serde(default, alias = "nutrition")]
    pub nutritional_info: NutritionalInfo,
    pub meal: MealCategory,
    pub goal: GoalCategory,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

// --- Admin ---

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationResponse {
    pub detail: String,
    pub count: i64,
}

// --- News ---

/// The news endpoint has answered with a bare array and with the list
/// wrapped under `data`, `articles` or `results`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NewsResponse {
    List(Vec<serde_json::Value>),
    Wrapped(NewsEnvelope),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsEnvelope {
    #[serde(default)]
    pub status: Option<serde_json::Value>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub articles: Option<serde_json::Value>,
    #[serde(default)]
    pub results: Option<serde_json::Value>,
}

impl NewsResponse {
    /// Articles from the first envelope key holding an array. Items that do
    /// not parse as articles are skipped.
    #[must_use]
    pub fn into_articles(self) -> Vec<NewsArticle> {
        let items = match self {
            NewsResponse::List(items) => items,
            NewsResponse::Wrapped(env) => {
                let status = env.status;
                let list = [env.data, env.articles, env.results]
                    .into_iter()
                    .flatten()
                    .find_map(|v| match v {
                        serde_json::Value::Array(items) => Some(items),
                        _ => None,
                    });
                let Some(items) = list else {
                    warn!(status = ?status, "Unexpected news response shape, no articles found");
                    return Vec::new();
                };
                items
            }
        };

        items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<NewsArticle>(item) {
                Ok(article) => Some(article),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed news article");
                    None
                }
            })
            .collect()
    }

    /// Parse any JSON value; shapes that match nothing give an empty list.
    #[must_use]
    pub fn articles_from_value(value: serde_json::Value) -> Vec<NewsArticle> {
        match serde_json::from_value::<NewsResponse>(value) {
            Ok(resp) => resp.into_articles(),
            Err(e) => {
                warn!(error = %e, "Could not parse news response");
                Vec::new()
            }
        }
    }
}

// --- Errors ---

/// Non-success response from the server.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: u16,
    pub message: String,
}

impl ApiError {
    #[must_use]
    pub fn from_body(status: u16, body: &str) -> Self {
        Self {
            status,
            message: api_error_message(status, body),
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// True when `err` carries a 401 anywhere in its chain.
    #[must_use]
    pub fn is_unauthorized_error(err: &anyhow::Error) -> bool {
        err.chain()
            .filter_map(|e| e.downcast_ref::<ApiError>())
            .any(ApiError::is_unauthorized)
    }
}

/// Human-readable message for an error response: `detail`, then `message`,
/// then every `key: value` pair, then the bare status.
#[must_use]
pub fn api_error_message(status: u16, body: &str) -> String {
    let fallback = format!("HTTP {status}");
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        let text = body.trim();
        return if text.is_empty() || text.starts_with('<') {
            fallback
        } else {
            format!("{fallback}: {text}")
        };
    };
    let Some(obj) = value.as_object() else {
        return fallback;
    };
    for key in ["detail", "message"] {
        if let Some(msg) = obj.get(key).and_then(serde_json::Value::as_str) {
            return msg.to_string();
        }
    }
    let pairs: Vec<String> = obj
        .iter()
        .map(|(k, v)| format!("{k}: {}", display_value(v)))
        .collect();
    if pairs.is_empty() {
        fallback
    } else {
        pairs.join(", ")
    }
}

fn display_value(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

/// Accepts `YYYY-MM-DD`, RFC 3339, or anything starting with a `YYYY-MM-DD` date.
#[must_use]
pub fn parse_api_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    s.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(id: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "title": "Dieta mediterránea",
            "description": "Estudio",
            "url": "https://example.com/a",
            "image_url": "https://example.com/a.png",
            "published_at": "2024-06-15T08:00:00Z",
            "source": { "name": "Example", "url": "https://example.com" }
        })
    }

    #[test]
    fn test_news_bare_array() {
        let articles = NewsResponse::articles_from_value(serde_json::json!([article("1")]));
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].source.name, "Example");
    }

    #[test]
    fn test_news_wrapped_shapes() {
        for key in ["data", "articles", "results"] {
            let body = serde_json::json!({ "status": "ok", key: [article("1"), article("2")] });
            let articles = NewsResponse::articles_from_value(body);
            assert_eq!(articles.len(), 2, "shape {key}");
        }
    }

    #[test]
    fn test_news_unexpected_shape_is_empty() {
        assert!(NewsResponse::articles_from_value(serde_json::json!({ "status": "ok" })).is_empty());
        assert!(NewsResponse::articles_from_value(serde_json::json!("nope")).is_empty());
        assert!(NewsResponse::articles_from_value(serde_json::json!({ "data": 3 })).is_empty());
    }

    #[test]
    fn test_news_null_text_fields_kept() {
        let mut second = article("2");
        second["description"] = serde_json::Value::Null;
        second["published_at"] = serde_json::Value::Null;
        second["source"] = serde_json::Value::Null;
        let articles = NewsResponse::articles_from_value(serde_json::json!({
            "status": "ok",
            "data": [article("1"), second]
        }));
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[1].description, "");
        assert_eq!(articles[1].published_at, "");
        assert_eq!(articles[1].source, crate::models::NewsSource::default());
    }

    #[test]
    fn test_news_skips_non_array_keys_and_bad_items() {
        let articles = NewsResponse::articles_from_value(serde_json::json!({
            "data": { "total": 1 },
            "articles": [article("1"), { "title": "sin id ni url" }]
        }));
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].id, "1");
    }

    #[test]
    fn test_me_response_into_snapshot() {
        let me: MeResponse = serde_json::from_value(serde_json::json!({
            "id": 4,
            "email": "luis@example.com",
            "first_name": "Luis",
            "last_name": "Pérez Gil",
            "age": 41,
            "weight": 88.5,
            "height": 178.0,
            "ideal": { "ideal_weight": 80.0 },
            "progress": { "bmi": 27.93, "last_updated": "2024-06-15T10:30:00Z" }
        }))
        .unwrap();
        let user = me.into_snapshot();
        assert_eq!(user.name, "Luis Pérez Gil");
        assert_eq!(user.goal_weight_kg, Some(80.0));
        assert_eq!(user.progress.len(), 1);
        assert_eq!(
            user.progress[0].registration_date,
            NaiveDate::from_ymd_opt(2024, 6, 15)
        );
    }

    #[test]
    fn test_me_response_minimal() {
        let me: MeResponse = serde_json::from_value(serde_json::json!({
            "id": 5,
            "email": "x@example.com",
            "first_name": "Eva",
            "ideal": {}
        }))
        .unwrap();
        let user = me.into_snapshot();
        assert_eq!(user.name, "Eva");
        assert!(user.goal_weight_kg.is_none());
        assert!(user.progress.is_empty());
        assert_eq!(user.weight_kg, 0.0);
    }

    #[test]
    fn test_me_response_keeps_undated_progress() {
        for last_updated in [serde_json::Value::Null, serde_json::json!("ayer")] {
            let me: MeResponse = serde_json::from_value(serde_json::json!({
                "id": 5,
                "email": "x@example.com",
                "progress": { "bmi": 24.0, "last_updated": last_updated }
            }))
            .unwrap();
            let progress = me.into_snapshot().progress;
            assert_eq!(progress.len(), 1);
            assert!((progress[0].bmi - 24.0).abs() < f64::EPSILON);
            assert!(progress[0].registration_date.is_none());
        }
    }

    #[test]
    fn test_profile_update_full_name_split() {
        let update = ProfileUpdate::default().with_full_name("María José  Ruiz");
        assert_eq!(update.first_name.as_deref(), Some("María"));
        assert_eq!(update.last_name.as_deref(), Some("José Ruiz"));

        let json = serde_json::to_value(ProfileUpdate {
            weight: Some(70.0),
            ..ProfileUpdate::default()
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "weight": 70.0 }));
        assert!(ProfileUpdate::default().is_empty());
    }

    #[test]
    fn test_api_error_message_detail() {
        let msg = api_error_message(400, r#"{"detail": "Credenciales inválidas"}"#);
        assert_eq!(msg, "Credenciales inválidas");
        let msg = api_error_message(400, r#"{"message": "Bad input"}"#);
        assert_eq!(msg, "Bad input");
    }

    #[test]
    fn test_api_error_message_field_errors() {
        let msg = api_error_message(
            400,
            r#"{"email": ["This field is required."], "age": ["Must be positive."]}"#,
        );
        assert_eq!(
            msg,
            "age: Must be positive., email: This field is required."
        );
    }

    #[test]
    fn test_api_error_message_fallbacks() {
        assert_eq!(api_error_message(500, ""), "HTTP 500");
        assert_eq!(api_error_message(502, "<html>bad gateway</html>"), "HTTP 502");
        assert_eq!(api_error_message(503, "down"), "HTTP 503: down");
        assert_eq!(api_error_message(400, "{}"), "HTTP 400");
        assert_eq!(api_error_message(400, "[1, 2]"), "HTTP 400");
    }

    #[test]
    fn test_api_error_unauthorized_in_chain() {
        let err = anyhow::Error::new(ApiError::from_body(401, r#"{"detail": "Invalid token."}"#))
            .context("GET /users/me/");
        assert!(ApiError::is_unauthorized_error(&err));
        assert_eq!(format!("{err:#}"), "GET /users/me/: Invalid token.");

        let err = anyhow::Error::new(ApiError::from_body(404, "{}"));
        assert!(!ApiError::is_unauthorized_error(&err));
        assert!(!ApiError::is_unauthorized_error(&anyhow::anyhow!("offline")));
    }

    #[test]
    fn test_parse_api_date() {
        let d = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(parse_api_date("2024-06-15"), Some(d));
        assert_eq!(parse_api_date("2024-06-15T10:30:00+02:00"), Some(d));
        assert_eq!(parse_api_date("2024-06-15 10:30:00.123"), Some(d));
        assert_eq!(parse_api_date("yesterday"), None);
        assert_eq!(parse_api_date(""), None);
    }

    #[test]
    fn test_history_query_serialization() {
        let q = HistoryQuery {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            end_date: None,
        };
        assert_eq!(
            serde_json::to_value(&q).unwrap(),
            serde_json::json!({ "startDate": "2024-01-01" })
        );
    }

    #[test]
    fn test_recipe_create_request_from_import_file() {
        let req: RecipeCreateRequest = serde_json::from_value(serde_json::json!({
            "name": "Avena con fruta",
            "ingredients": ["avena", "plátano"],
            "preparation": "Mezclar",
            "nutrition": { "per_serving": { "calories_kcal": 320.0 } },
            "meal": "B",
            "goal": "N"
        }))
        .unwrap();
        assert_eq!(req.preparation_steps, "Mezclar");
        assert_eq!(req.meal, MealCategory::Breakfast);
        assert!(req.tags.is_empty());
        assert_eq!(
            req.nutritional_info
                .per_serving
                .as_ref()
                .and_then(|n| n.calories_kcal),
            Some(320.0)
        );

        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["preparation_steps"], "Mezclar");
        assert!(body.get("tags").is_none());
        assert!(body.get("image_url").is_none());
    }

    #[test]
    fn test_paths() {
        assert_eq!(paths::recipe(12), "/diets/recipes/12/");
        assert_eq!(paths::diet(3), "/diets/diets/3/");
        assert_eq!(paths::tag(9), "/diets/tags/9/");
    }
}
