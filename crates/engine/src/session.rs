//! Explicit session state
//!
//! One `Session` is created at startup and handed to every component that
//! needs the credential or the cached balance. It starts anonymous, is
//! established on login/register/restore, and ends on logout or when the
//! backend answers 401.

use hostcredits_core::User;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::watch;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct SessionInner {
    token: Option<String>,
    user: Option<User>,
}

/// Cloneable handle to the authenticated session
#[derive(Clone)]
pub struct Session {
    inner: Arc<RwLock<SessionInner>>,
    balance_tx: Arc<watch::Sender<Option<i64>>>,
}

impl Session {
    /// Anonymous session
    pub fn new() -> Self {
        let (balance_tx, _) = watch::channel(None);
        Self {
            inner: Arc::new(RwLock::new(SessionInner::default())),
            balance_tx: Arc::new(balance_tx),
        }
    }

    /// Start (or replace) the authenticated session
    pub fn establish(&self, token: &str, user: User) {
        let credits = user.credits;
        info!("Session established for {}", user.username);
        {
            let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            inner.token = Some(token.to_string());
            inner.user = Some(user);
        }
        self.balance_tx.send_replace(Some(credits));
    }

    /// Drop the credential and everything derived from it
    pub fn end(&self) {
        let was_active = {
            let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            let was_active = inner.token.is_some();
            inner.token = None;
            inner.user = None;
            was_active
        };
        if was_active {
            info!("Session ended");
        }
        self.balance_tx.send_replace(None);
    }

    pub fn is_active(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .token
            .is_some()
    }

    pub fn token(&self) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .token
            .clone()
    }

    pub fn user(&self) -> Option<User> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .user
            .clone()
    }

    pub fn is_admin(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .user
            .as_ref()
            .is_some_and(User::is_admin)
    }

    /// Cached balance; `None` when no session is active
    pub fn balance(&self) -> Option<i64> {
        *self.balance_tx.borrow()
    }

    /// Replace the cached balance with a server-reported total.
    ///
    /// Returns false (and changes nothing) when the session has ended, so a
    /// response arriving after logout cannot resurrect state.
    pub fn set_balance(&self, credits: i64) -> bool {
        {
            let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            if inner.token.is_none() {
                debug!("Ignoring balance {} for ended session", credits);
                return false;
            }
            if let Some(user) = inner.user.as_mut() {
                user.credits = credits;
            }
        }
        self.balance_tx.send_replace(Some(credits));
        true
    }

    /// Watch the cached balance (for display surfaces)
    pub fn subscribe_balance(&self) -> watch::Receiver<Option<i64>> {
        self.balance_tx.subscribe()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
