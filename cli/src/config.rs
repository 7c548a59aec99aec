use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;
use tracing::warn;

use nutriplan_core::models::Locale;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

pub struct Config {
    pub data_dir: PathBuf,
    pub session_path: PathBuf,
    pub api_url: String,
    pub locale: Locale,
}

impl Config {
    pub fn load() -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "nutriplan").context("Could not determine home directory")?;

        let data_dir = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let session_path = data_dir.join("session.json");

        Ok(Config {
            data_dir,
            session_path,
            api_url: api_url_from(std::env::var("NUTRIPLAN_API_URL").ok()),
            locale: locale_from(std::env::var("NUTRIPLAN_LOCALE").ok()),
        })
    }
}

fn api_url_from(value: Option<String>) -> String {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => v,
        _ => DEFAULT_API_URL.to_string(),
    }
}

fn locale_from(value: Option<String>) -> Locale {
    match value {
        None => Locale::default(),
        Some(v) => v.parse().unwrap_or_else(|e| {
            warn!("Invalid NUTRIPLAN_LOCALE: {e:#}, using default");
            Locale::default()
        }),
    }
}
