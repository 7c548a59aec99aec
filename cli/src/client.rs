use anyhow::{Context, Result};
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use nutriplan_core::api::{
    ApiError, Credentials, DietCreateRequest, DietResponse, HistoryQuery, LoginResponse,
    MeResponse, NewsResponse, NotificationResponse, ProfileUpdate, ProgressRequest,
    ProgressResponse, RecipeCreateRequest, RegisterRequest, RegisterResponse, paths,
};
use nutriplan_core::models::{AdminUser, DietHistory, NewsArticle, Recipe, Tag};
use nutriplan_core::service::Backend;

/// Blocking client for the nutriplan REST API, driven by its own runtime.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    rt: tokio::runtime::Runtime,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!("nutriplan-cli/{}", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(15))
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .context("Failed to build HTTP client")?;
        let rt = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            rt,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        debug!(%method, path, authenticated = token.is_some(), "API request");
        let req = self.client.request(method, self.url(path));
        match token {
            Some(t) => req.header(AUTHORIZATION, format!("Token {t}")),
            None => req,
        }
    }

    async fn execute(req: RequestBuilder, label: &str) -> Result<reqwest::Response> {
        let resp = req
            .send()
            .await
            .with_context(|| format!("Failed to reach the nutriplan API ({label})"))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), label, "API error response");
        Err(anyhow::Error::new(ApiError::from_body(status.as_u16(), &body)).context(label.to_string()))
    }

    fn fetch_json<T: DeserializeOwned>(&self, req: RequestBuilder, label: &str) -> Result<T> {
        self.rt.block_on(async {
            let resp = Self::execute(req, label).await?;
            resp.json::<T>()
                .await
                .with_context(|| format!("Failed to parse response from {label}"))
        })
    }

    fn fetch_empty(&self, req: RequestBuilder, label: &str) -> Result<()> {
        self.rt.block_on(async {
            Self::execute(req, label).await?;
            Ok(())
        })
    }
}

impl Backend for ApiClient {
    fn login(&self, credentials: &Credentials) -> Result<LoginResponse> {
        let req = self
            .request(Method::POST, paths::LOGIN, None)
            .json(credentials);
        self.fetch_json(req, "POST /users/login/")
    }

    fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse> {
        let req = self
            .request(Method::POST, paths::REGISTER, None)
            .json(request);
        self.fetch_json(req, "POST /users/register/")
    }

    fn logout(&self, token: &str) -> Result<()> {
        let req = self
            .request(Method::POST, paths::LOGOUT, Some(token))
            .json(&serde_json::json!({}));
        self.fetch_empty(req, "POST /users/logout/")
    }

    fn unsubscribe(&self, credentials: &Credentials) -> Result<()> {
        let req = self
            .request(Method::POST, paths::UNSUBSCRIBE, None)
            .json(credentials);
        self.fetch_empty(req, "POST /users/unsubscribe-by-credentials/")
    }

    fn current_user(&self, token: Option<&str>) -> Result<MeResponse> {
        let req = self.request(Method::GET, paths::ME, token);
        self.fetch_json(req, "GET /users/me/")
    }

    fn update_profile(&self, token: Option<&str>, update: &ProfileUpdate) -> Result<()> {
        let req = self.request(Method::PATCH, paths::ME, token).json(update);
        self.fetch_empty(req, "PATCH /users/me/")
    }

    fn create_progress(
        &self,
        token: Option<&str>,
        request: &ProgressRequest,
    ) -> Result<ProgressResponse> {
        let req = self
            .request(Method::POST, paths::PROGRESS, token)
            .json(request);
        self.fetch_json(req, "POST /users/progress/")
    }

    fn update_progress(
        &self,
        token: Option<&str>,
        request: &ProgressRequest,
    ) -> Result<ProgressResponse> {
        let req = self
            .request(Method::PATCH, paths::PROGRESS_PATCH, token)
            .json(request);
        self.fetch_json(req, "PATCH /users/progress/patch/")
    }

    fn diet_history(&self, token: Option<&str>, query: &HistoryQuery) -> Result<Vec<DietHistory>> {
        let req = self.request(Method::GET, paths::HISTORY, token).query(query);
        self.fetch_json(req, "GET /users/historical/")
    }

    fn list_recipes(&self, token: Option<&str>) -> Result<Vec<Recipe>> {
        let req = self.request(Method::GET, paths::RECIPES, token);
        self.fetch_json(req, "GET /diets/recipes/")
    }

    fn create_recipe(&self, token: Option<&str>, recipe: &RecipeCreateRequest) -> Result<Recipe> {
        let req = self.request(Method::POST, paths::RECIPES, token).json(recipe);
        self.fetch_json(req, "POST /diets/recipes/")
    }

    fn delete_recipe(&self, token: Option<&str>, id: i64) -> Result<()> {
        let path = paths::recipe(id);
        let req = self.request(Method::DELETE, &path, token);
        self.fetch_empty(req, &format!("DELETE {path}"))
    }

    fn create_diet(
        &self,
        token: Option<&str>,
        request: &DietCreateRequest,
    ) -> Result<DietResponse> {
        let req = self.request(Method::POST, paths::DIETS, token).json(request);
        self.fetch_json(req, "POST /diets/diets/")
    }

    fn delete_diet(&self, token: Option<&str>, id: i64) -> Result<()> {
        let path = paths::diet(id);
        let req = self.request(Method::DELETE, &path, token);
        self.fetch_empty(req, &format!("DELETE {path}"))
    }

    fn list_tags(&self, token: Option<&str>) -> Result<Vec<Tag>> {
        let req = self.request(Method::GET, paths::TAGS, token);
        self.fetch_json(req, "GET /diets/tags/")
    }

    fn create_tag(&self, token: Option<&str>, tag: &Tag) -> Result<Tag> {
        let req = self.request(Method::POST, paths::TAGS, token).json(tag);
        self.fetch_json(req, "POST /diets/tags/")
    }

    fn update_tag(&self, token: Option<&str>, id: i64, tag: &Tag) -> Result<Tag> {
        let path = paths::tag(id);
        let req = self.request(Method::PUT, &path, token).json(tag);
        self.fetch_json(req, &format!("PUT {path}"))
    }

    fn delete_tag(&self, token: Option<&str>, id: i64) -> Result<()> {
        let path = paths::tag(id);
        let req = self.request(Method::DELETE, &path, token);
        self.fetch_empty(req, &format!("DELETE {path}"))
    }

    fn news(&self, token: Option<&str>, titles: &[String]) -> Result<Vec<NewsArticle>> {
        let query: Vec<(&str, &str)> = titles.iter().map(|t| ("title", t.as_str())).collect();
        let req = self.request(Method::GET, paths::NEWS, token).query(&query);
        let value: serde_json::Value = self.fetch_json(req, "GET /news/news/")?;
        Ok(NewsResponse::articles_from_value(value))
    }

    fn list_users(&self, token: Option<&str>) -> Result<Vec<AdminUser>> {
        let req = self.request(Method::GET, paths::USERS, token);
        self.fetch_json(req, "GET /users/get-users/")
    }

    fn send_email_notification(
        &self,
        token: Option<&str>,
        template: Option<&str>,
    ) -> Result<NotificationResponse> {
        let mut req = self
            .request(Method::POST, paths::EMAIL_NOTIFICATION, token)
            .json(&serde_json::json!({}));
        if let Some(t) = template {
            req = req.query(&[("template", t)]);
        }
        self.fetch_json(req, "POST /notifications/email-notification/")
    }
}
