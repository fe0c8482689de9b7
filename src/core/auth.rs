use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use rand::Rng;
use thiserror::Error;
use tracing::warn;

use super::config::AdminConfig;
use super::security;

/// Bcrypt cost factor for hashing the admin password.
const BCRYPT_COST: u32 = 10;

/// Characters used for random session token generation.
const ALPHANUMERIC: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Errors returned by admin login.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoginError {
    #[error("invalid password")]
    InvalidPassword,

    #[error("too many failed attempts, IP temporarily blocked")]
    TooManyAttempts,

    #[error("admin login is disabled (no password configured)")]
    Disabled,
}

/// Admin authentication provider: password check, session issue/verify, and
/// IP-based brute-force throttling.
///
/// Thread-safe: all mutable state is behind `Mutex` so methods take `&self`,
/// allowing the provider to be shared via `Arc<AdminAuth>`.
///
/// The configured password is stored only as a bcrypt hash. Session tokens
/// are random opaque strings held in memory with a TTL; restarting the
/// process logs every admin out.
#[derive(Debug)]
pub struct AdminAuth {
    /// Bcrypt hash of the configured password; `None` disables login.
    password_hash: Mutex<Option<String>>,
    /// Active session tokens mapped to their expiry instant.
    sessions: Mutex<HashMap<String, Instant>>,
    session_ttl: Duration,
    /// IP-based brute-force tracker.
    brute_force_tracker: Mutex<HashMap<IpAddr, BruteForceEntry>>,
}

/// Tracks failed login attempts from a single IP.
#[derive(Debug, Clone)]
struct BruteForceEntry {
    attempts: u32,
    window_start: Instant,
    blocked_until: Option<Instant>,
}

impl AdminAuth {
    pub fn new(config: &AdminConfig) -> Self {
        let password_hash = if config.password.is_empty() {
            None
        } else {
            bcrypt::hash(&config.password, BCRYPT_COST).ok()
        };
        Self {
            password_hash: Mutex::new(password_hash),
            sessions: Mutex::new(HashMap::new()),
            session_ttl: Duration::from_secs(config.session_ttl_secs),
            brute_force_tracker: Mutex::new(HashMap::new()),
        }
    }

    /// Verify the admin password against the stored bcrypt hash.
    /// With no password configured, login is always rejected.
    pub fn verify_password(&self, password: &str) -> bool {
        let hash = self
            .password_hash
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        match hash.as_deref() {
            Some(hash) => bcrypt::verify(password, hash).unwrap_or(false),
            None => false,
        }
    }

    fn login_disabled(&self) -> bool {
        self.password_hash
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_none()
    }

    /// Attempt a login with IP-based brute-force protection. On success a
    /// fresh session token is issued and returned.
    pub fn login(&self, password: &str, client_ip: IpAddr) -> Result<String, LoginError> {
        if self.login_disabled() {
            return Err(LoginError::Disabled);
        }

        if self.is_ip_blocked(client_ip) {
            warn!(ip = %client_ip, "admin login rejected: IP is temporarily blocked");
            return Err(LoginError::TooManyAttempts);
        }

        if self.verify_password(password) {
            self.reset_ip_attempts(client_ip);
            Ok(self.issue_session())
        } else {
            self.record_failed_attempt(client_ip);
            Err(LoginError::InvalidPassword)
        }
    }

    /// Issue a new session token with the configured TTL.
    fn issue_session(&self) -> String {
        let token = generate_random_token(
            security::SESSION_TOKEN_PREFIX,
            security::SESSION_TOKEN_RANDOM_LENGTH,
        );
        let expires_at = Instant::now() + self.session_ttl;
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.insert(token.clone(), expires_at);
        token
    }

    /// Check whether a session token is active. Expired tokens are removed
    /// on the way out.
    pub fn verify_session(&self, token: Option<&str>) -> bool {
        let Some(token) = token else {
            return false;
        };
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        match sessions.get(token) {
            Some(expires_at) if Instant::now() < *expires_at => true,
            Some(_) => {
                sessions.remove(token);
                false
            }
            None => false,
        }
    }

    /// Revoke a session token (logout). Unknown tokens are a no-op.
    pub fn revoke_session(&self, token: &str) {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.remove(token);
    }

    /// Replace the admin password at runtime (supports SIGHUP reload without
    /// restart). An empty password disables login; existing sessions stay
    /// valid until expiry.
    pub fn update_password(&self, password: &str) {
        let mut hash = self
            .password_hash
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        *hash = if password.is_empty() {
            None
        } else {
            bcrypt::hash(password, BCRYPT_COST).ok()
        };
    }

    fn is_ip_blocked(&self, ip: IpAddr) -> bool {
        let tracker = self
            .brute_force_tracker
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = tracker.get(&ip) {
            if let Some(blocked_until) = entry.blocked_until {
                return Instant::now() < blocked_until;
            }
        }
        false
    }

    fn record_failed_attempt(&self, ip: IpAddr) {
        let mut tracker = self
            .brute_force_tracker
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        let entry = tracker.entry(ip).or_insert(BruteForceEntry {
            attempts: 0,
            window_start: now,
            blocked_until: None,
        });

        // Reset window if expired
        if now.duration_since(entry.window_start).as_secs() > security::BRUTE_FORCE_WINDOW_SECS {
            entry.attempts = 0;
            entry.window_start = now;
            entry.blocked_until = None;
        }

        entry.attempts += 1;

        if entry.attempts >= security::BRUTE_FORCE_MAX_ATTEMPTS {
            entry.blocked_until =
                Some(now + Duration::from_secs(security::BRUTE_FORCE_BLOCK_SECS));
            warn!(ip = %ip, attempts = entry.attempts, "IP blocked after repeated failed admin logins");
        }
    }

    fn reset_ip_attempts(&self, ip: IpAddr) {
        let mut tracker = self
            .brute_force_tracker
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        tracker.remove(&ip);
    }

    /// Drop expired sessions. Called periodically by the sweep task.
    pub fn cleanup_expired_sessions(&self) {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        sessions.retain(|_token, expires_at| now < *expires_at);
    }

    /// Drop stale brute-force tracker entries. Called periodically by the
    /// sweep task.
    pub fn cleanup_brute_force_tracker(&self) {
        let mut tracker = self
            .brute_force_tracker
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        tracker.retain(|_ip, entry| {
            if let Some(blocked_until) = entry.blocked_until {
                if now < blocked_until {
                    return true;
                }
            }
            now.duration_since(entry.window_start).as_secs() < security::BRUTE_FORCE_WINDOW_SECS
        });
    }
}

#[cfg(test)]
impl AdminAuth {
    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

/// Generate a random token with a given prefix and random part length.
/// Characters are drawn from [a-z0-9].
fn generate_random_token(prefix: &str, random_length: usize) -> String {
    let mut rng = rand::thread_rng();
    let random_part: String = (0..random_length)
        .map(|_| {
            let idx = rng.gen_range(0..ALPHANUMERIC.len());
            ALPHANUMERIC[idx] as char
        })
        .collect();
    format!("{}{}", prefix, random_part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AdminConfig;

    fn auth_with_password(password: &str) -> AdminAuth {
        AdminAuth::new(&AdminConfig {
            password: password.to_string(),
            session_ttl_secs: 3600,
        })
    }

    fn test_ip(last: u8) -> IpAddr {
        IpAddr::from([10, 0, 0, last])
    }

    #[test]
    fn test_login_issues_verifiable_session() {
        let auth = auth_with_password("hunter2");
        let token = auth.login("hunter2", test_ip(1)).unwrap();
        assert!(token.starts_with(security::SESSION_TOKEN_PREFIX));
        assert!(auth.verify_session(Some(&token)));
        assert!(!auth.verify_session(Some("as_bogus")));
        assert!(!auth.verify_session(None));
    }

    #[test]
    fn test_wrong_password_rejected() {
        let auth = auth_with_password("hunter2");
        assert_eq!(
            auth.login("wrong", test_ip(2)),
            Err(LoginError::InvalidPassword)
        );
    }

    #[test]
    fn test_empty_password_disables_login() {
        let auth = auth_with_password("");
        assert_eq!(auth.login("anything", test_ip(3)), Err(LoginError::Disabled));
        assert!(!auth.verify_password("anything"));
    }

    #[test]
    fn test_logout_revokes_session() {
        let auth = auth_with_password("hunter2");
        let token = auth.login("hunter2", test_ip(4)).unwrap();
        auth.revoke_session(&token);
        assert!(!auth.verify_session(Some(&token)));
        assert_eq!(auth.session_count(), 0);
    }

    #[test]
    fn test_brute_force_blocks_ip() {
        let auth = auth_with_password("hunter2");
        let ip = test_ip(5);
        for _ in 0..security::BRUTE_FORCE_MAX_ATTEMPTS {
            assert_eq!(auth.login("wrong", ip), Err(LoginError::InvalidPassword));
        }
        // Even the correct password is rejected while blocked.
        assert_eq!(auth.login("hunter2", ip), Err(LoginError::TooManyAttempts));
        // A different IP is unaffected.
        assert!(auth.login("hunter2", test_ip(6)).is_ok());
    }

    #[test]
    fn test_expired_session_rejected() {
        let auth = AdminAuth::new(&AdminConfig {
            password: "hunter2".to_string(),
            session_ttl_secs: 0,
        });
        let token = auth.login("hunter2", test_ip(7)).unwrap();
        assert!(!auth.verify_session(Some(&token)));
    }

    #[test]
    fn test_password_hot_reload() {
        let auth = auth_with_password("old-password");
        auth.update_password("new-password");
        assert!(!auth.verify_password("old-password"));
        assert!(auth.verify_password("new-password"));
        auth.update_password("");
        assert_eq!(
            auth.login("new-password", test_ip(9)),
            Err(LoginError::Disabled)
        );
    }

    #[test]
    fn test_session_sweep_drops_expired() {
        let auth = AdminAuth::new(&AdminConfig {
            password: "hunter2".to_string(),
            session_ttl_secs: 0,
        });
        let _ = auth.login("hunter2", test_ip(8)).unwrap();
        assert_eq!(auth.session_count(), 1);
        auth.cleanup_expired_sessions();
        assert_eq!(auth.session_count(), 0);
    }
}
