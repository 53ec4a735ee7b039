//! Session credentials and the auth header contract
//!
//! The client only needs to know whether a bearer token is present and how to
//! tear the session down. [`SessionStore`] keeps the token in a small YAML file,
//! the native stand-in for browser session storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::SessionError;

type Result<T> = std::result::Result<T, SessionError>;

/// Supplies the authorization header for outgoing requests.
pub trait AuthProvider: Send + Sync {
    /// `Some("Bearer <token>")` when a token is stored, `None` otherwise
    fn auth_header(&self) -> Option<String>;

    /// Drop the stored credentials and send the user back to sign in.
    ///
    /// Global and irreversible for the current session.
    fn teardown(&self);
}

/// Hook invoked with the login URL after a teardown
pub type LoginRedirect = Box<dyn Fn(&str) + Send + Sync>;

/// Stored session: bearer token plus the metadata the views display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    pub stored_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user_id: None,
            name: None,
            role: None,
            stored_at: Utc::now(),
        }
    }

    /// Expiry from the token's `exp` claim, if the token is a JWT.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        use base64::{Engine as _, engine::general_purpose};

        #[derive(Deserialize)]
        struct Claims {
            exp: i64,
        }

        let parts: Vec<&str> = self.token.split('.').collect();
        if parts.len() != 3 {
            return None;
        }

        let payload = general_purpose::URL_SAFE_NO_PAD
            .decode(parts[1].trim_end_matches('='))
            .ok()?;
        let claims: Claims = serde_json::from_slice(&payload).ok()?;
        DateTime::from_timestamp(claims.exp, 0)
    }
}

/// File-backed session storage
pub struct SessionStore {
    path: PathBuf,
    login_url: String,
    redirect: LoginRedirect,
}

impl SessionStore {
    /// Default session file (~/.hallbook/session.yaml)
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(SessionError::NoHome)?;
        Ok(home.join(".hallbook").join("session.yaml"))
    }

    /// Open the session file at the default location
    pub fn open_default(login_url: impl Into<String>) -> Result<Self> {
        Ok(Self::open_at(Self::default_path()?, login_url))
    }

    /// Open a session file at a specific path. The file need not exist yet.
    pub fn open_at(path: impl Into<PathBuf>, login_url: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            login_url: login_url.into(),
            redirect: Box::new(|url| {
                log::warn!("Session ended. Sign in again at {}", url);
            }),
        }
    }

    /// Replace the action taken after teardown
    pub fn with_redirect(mut self, redirect: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.redirect = Box::new(redirect);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    /// Read the stored session, if any
    pub fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| SessionError::Io(format!("Failed to read session: {}", e)))?;
        let session: Session = serde_yaml::from_str(&contents)?;
        if session.token.is_empty() {
            return Ok(None);
        }
        Ok(Some(session))
    }

    /// Persist a session, replacing any previous one
    pub fn store(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SessionError::Io(format!("Failed to create session dir: {}", e)))?;
        }

        let contents = serde_yaml::to_string(session)?;
        std::fs::write(&self.path, contents)
            .map_err(|e| SessionError::Io(format!("Failed to write session: {}", e)))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.path, perms)
                .map_err(|e| SessionError::Io(format!("Failed to restrict session: {}", e)))?;
        }

        log::info!("Session stored at {}", self.path.display());
        Ok(())
    }

    /// Remove the token and all session metadata
    pub fn clear(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.path)
            .map_err(|e| SessionError::Io(format!("Failed to remove session: {}", e)))?;
        Ok(true)
    }
}

impl AuthProvider for SessionStore {
    fn auth_header(&self) -> Option<String> {
        match self.load() {
            Ok(session) => session.map(|s| format!("Bearer {}", s.token)),
            Err(e) => {
                log::warn!("Ignoring unreadable session: {}", e);
                None
            }
        }
    }

    fn teardown(&self) {
        if let Err(e) = self.clear() {
            log::warn!("Failed to clear session during teardown: {}", e);
        }
        (self.redirect)(&self.login_url);
    }
}
