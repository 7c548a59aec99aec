use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::diet::WeekPlan;
use crate::models::SessionUser;

/// Auth token, logged-in user and the last generated week plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_plan: Option<WeekPlan>,
}

impl Session {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user
            .as_ref()
            .is_some_and(|u| u.is_staff || u.is_superuser)
    }

    pub fn set_login(&mut self, token: String, user: SessionUser) {
        self.token = Some(token);
        self.user = Some(user);
    }

    pub fn set_week_plan(&mut self, plan: WeekPlan) {
        self.week_plan = Some(plan);
    }

    pub fn clear_week_plan(&mut self) {
        self.week_plan = None;
    }

    #[must_use]
    pub fn has_week_plan(&self) -> bool {
        self.week_plan.is_some()
    }

    pub fn clear(&mut self) {
        *self = Session::default();
    }
}

/// Where the session lives between runs.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Session>;
    fn save(&self, session: &Session) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// JSON file, usually `<data dir>/session.json`.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Session> {
        if !self.path.exists() {
            return Ok(Session::default());
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session file: {}", self.path.display()))?;
        match serde_json::from_str(&raw) {
            Ok(session) => Ok(session),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable session file");
                Ok(Session::default())
            }
        }
    }

    fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create session directory: {}", parent.display())
            })?;
        }
        let json = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write session file: {}", self.path.display()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .context("Failed to set session file permissions")?;
        }
        debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| {
                format!("Failed to remove session file: {}", self.path.display())
            }),
        }
    }
}

/// Keeps the session in memory only.
#[derive(Default)]
pub struct MemorySessionStore {
    inner: Mutex<Session>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn with_session(session: Session) -> Self {
        Self {
            inner: Mutex::new(session),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Session> {
        let guard = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("Session lock poisoned"))?;
        Ok(guard.clone())
    }

    fn save(&self, session: &Session) -> Result<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("Session lock poisoned"))?;
        *guard = session.clone();
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.save(&Session::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diet::distribute_recipes;
    use crate::models::Locale;

    fn user(is_staff: bool) -> SessionUser {
        SessionUser {
            id: 1,
            email: "ana@example.com".to_string(),
            name: "Ana".to_string(),
            last_name: "López".to_string(),
            is_staff,
            is_superuser: false,
        }
    }

    #[test]
    fn test_session_flags() {
        let mut session = Session::default();
        assert!(!session.is_authenticated());
        assert!(!session.is_admin());

        session.set_login("abc123".to_string(), user(false));
        assert!(session.is_authenticated());
        assert!(!session.is_admin());

        session.set_login("abc123".to_string(), user(true));
        assert!(session.is_admin());

        session.clear();
        assert_eq!(session, Session::default());
    }

    #[test]
    fn test_empty_token_is_not_authenticated() {
        let session = Session {
            token: Some(String::new()),
            ..Session::default()
        };
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_week_plan_cache() {
        let mut session = Session::default();
        assert!(!session.has_week_plan());
        session.set_week_plan(distribute_recipes(&[], Locale::Es.day_labels()));
        assert!(session.has_week_plan());
        session.clear_week_plan();
        assert!(!session.has_week_plan());
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested").join("session.json"));

        assert_eq!(store.load().unwrap(), Session::default());

        let mut session = Session::default();
        session.set_login("tok".to_string(), user(true));
        session.set_week_plan(distribute_recipes(&[], Locale::En.day_labels()));
        store.save(&session).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, session);

        store.clear().unwrap();
        assert!(!store.path().exists());
        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));
        store.save(&Session::default()).unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_file_store_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = FileSessionStore::new(path);
        assert_eq!(store.load().unwrap(), Session::default());
    }

    #[test]
    fn test_memory_store() {
        let store = MemorySessionStore::default();
        let mut session = store.load().unwrap();
        session.set_login("tok".to_string(), user(false));
        store.save(&session).unwrap();
        assert!(store.load().unwrap().is_authenticated());
        store.clear().unwrap();
        assert!(!store.load().unwrap().is_authenticated());
    }
}
