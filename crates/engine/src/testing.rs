//! Scripted backend for driver tests

use crate::{CreditsBackend, Session};
use async_trait::async_trait;
use hostcredits_core::{ClaimResponse, EarnOutcome, Error, Result, Role, User};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// Answers claims and earns from queued results, recording every call
#[derive(Default)]
pub(crate) struct ScriptedBackend {
    claims: Mutex<VecDeque<Result<ClaimResponse>>>,
    earns: Mutex<VecDeque<Result<EarnOutcome>>>,
    claim_calls: Mutex<Vec<u64>>,
    earn_calls: Mutex<u32>,
    /// When set, each call waits for a permit before answering
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each call blocks until one permit is added to the returned semaphore
    pub fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let backend = Self {
            gate: Some(gate.clone()),
            ..Self::default()
        };
        (backend, gate)
    }

    pub fn push_claim(&self, result: Result<ClaimResponse>) {
        self.claims.lock().unwrap().push_back(result);
    }

    pub fn push_earn(&self, result: Result<EarnOutcome>) {
        self.earns.lock().unwrap().push_back(result);
    }

    pub fn claim_calls(&self) -> Vec<u64> {
        self.claim_calls.lock().unwrap().clone()
    }

    pub fn earn_calls(&self) -> u32 {
        *self.earn_calls.lock().unwrap()
    }

    async fn wait_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
    }
}

pub(crate) fn claimed(total_credits: i64) -> Result<ClaimResponse> {
    Ok(ClaimResponse {
        total_credits,
        message: None,
    })
}

#[async_trait]
impl CreditsBackend for ScriptedBackend {
    async fn claim(&self, intervals: u64) -> Result<ClaimResponse> {
        self.claim_calls.lock().unwrap().push(intervals);
        self.wait_gate().await;
        self.claims
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::ApiError("no scripted claim".into())))
    }

    async fn earn(&self) -> Result<EarnOutcome> {
        *self.earn_calls.lock().unwrap() += 1;
        self.wait_gate().await;
        self.earns
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::ApiError("no scripted earn".into())))
    }
}

/// A session established for a plain user with the given balance
pub(crate) fn active_session(credits: i64) -> Session {
    let session = Session::new();
    session.establish(
        "test-token",
        User {
            id: "u1".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            username: "ada".into(),
            credits,
            role: Role::User,
        },
    );
    session
}
