//! The backend calls the timers depend on

use async_trait::async_trait;
use hostcredits_core::{ClaimResponse, EarnOutcome, Result};
use hostcredits_networking::CreditsClient;

/// The two mutating calls the earning timers make
///
/// Implemented by [`CreditsClient`]; tests substitute a scripted backend.
#[async_trait]
pub trait CreditsBackend: Send + Sync + 'static {
    /// `POST /credits/claim` with the number of completed intervals
    async fn claim(&self, intervals: u64) -> Result<ClaimResponse>;

    /// `POST /user/earn-credits`
    async fn earn(&self) -> Result<EarnOutcome>;
}

#[async_trait]
impl CreditsBackend for CreditsClient {
    async fn claim(&self, intervals: u64) -> Result<ClaimResponse> {
        self.claim_credits(intervals).await
    }

    async fn earn(&self) -> Result<EarnOutcome> {
        self.earn_credits().await
    }
}
