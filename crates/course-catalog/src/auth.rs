/// Admin session handling.
///
/// One configured username/password pair unlocks the upload operation. A successful login
/// issues an opaque token that stays valid until logout or process exit. This gates the admin
/// workflow only; it is not a security boundary.
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::AuthError;

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(0);

pub struct AdminAuth {
    username: String,
    password: String,
    sessions: Mutex<HashSet<String>>,
}

impl AdminAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            sessions: Mutex::new(HashSet::new()),
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        if username != self.username || password != self.password {
            warn!(username, "admin login rejected");
            return Err(AuthError::InvalidCredentials);
        }
        let token = new_session_token();
        self.sessions.lock().await.insert(token.clone());
        info!("admin session opened");
        Ok(token)
    }

    /// Returns `true` if the token was live.
    pub async fn logout(&self, token: &str) -> bool {
        let removed = self.sessions.lock().await.remove(token);
        if removed {
            info!("admin session closed");
        }
        removed
    }

    pub async fn is_admin(&self, token: &str) -> bool {
        self.sessions.lock().await.contains(token)
    }

    pub async fn require_admin(&self, token: Option<&str>) -> Result<(), AuthError> {
        match token {
            Some(t) if self.is_admin(t).await => Ok(()),
            _ => Err(AuthError::Unauthorized),
        }
    }
}

fn new_session_token() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0));
    let counter = SESSION_COUNTER.fetch_add(1, Ordering::Relaxed);
    let pid = std::process::id();

    let mut h = Sha256::new();
    h.update(now.as_nanos().to_le_bytes());
    h.update(pid.to_le_bytes());
    h.update(counter.to_le_bytes());
    h.update(uuid::Uuid::new_v4().as_bytes());
    format!("{:x}", h.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn login_issues_distinct_tokens() {
        let auth = AdminAuth::new("ADMIN", "ADMIN");
        let a = auth.login("ADMIN", "ADMIN").await.unwrap();
        let b = auth.login("ADMIN", "ADMIN").await.unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert!(auth.is_admin(&a).await);
        assert!(auth.require_admin(Some(&b)).await.is_ok());
    }

    #[tokio::test]
    async fn wrong_credentials_change_nothing() {
        let auth = AdminAuth::new("ADMIN", "ADMIN");
        assert_eq!(
            auth.login("admin", "ADMIN").await,
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(
            auth.login("ADMIN", "ADMIN ").await,
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Credenciais inválidas."
        );
        assert!(auth.sessions.lock().await.is_empty());
    }

    #[tokio::test]
    async fn logout_revokes_token() {
        let auth = AdminAuth::new("secretaria", "s3nha");
        let token = auth.login("secretaria", "s3nha").await.unwrap();
        assert!(auth.logout(&token).await);
        assert!(!auth.logout(&token).await);
        assert_eq!(
            auth.require_admin(Some(&token)).await,
            Err(AuthError::Unauthorized)
        );
        assert_eq!(auth.require_admin(None).await, Err(AuthError::Unauthorized));
    }
}
