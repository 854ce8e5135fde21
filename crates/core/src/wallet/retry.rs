//! Retry controller for transient storage conflicts.
//!
//! Wraps a [`BalanceMutator`] and re-runs it as a fresh atomic unit whenever it
//! fails with a transient conflict (serialization failure or deadlock). After
//! attempt `n` fails the controller waits `n² × base` before attempt `n + 1`.
//! There is no wait after the final attempt.

use std::time::Duration;

use async_trait::async_trait;
use coffer_shared::WalletId;
use tracing::{error, warn};

use super::error::WalletError;
use super::store::BalanceMutator;
use super::types::OperationKind;

/// Retry limits and backoff base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_backoff: Duration,
}

impl RetryPolicy {
    /// Default number of attempts, including the first.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 6;

    /// Default backoff base.
    pub const DEFAULT_BASE_BACKOFF: Duration = Duration::from_millis(100);

    /// Creates a policy. `max_attempts` is raised to 1 if zero.
    #[must_use]
    pub const fn new(max_attempts: u32, base_backoff: Duration) -> Self {
        Self {
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
            base_backoff,
        }
    }

    /// Total attempts allowed, including the first.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait after the 1-indexed `attempt` failed.
    #[must_use]
    pub const fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff
            .saturating_mul(attempt.saturating_mul(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_BASE_BACKOFF)
    }
}

/// A [`BalanceMutator`] that retries transient conflicts of the inner mutator.
#[derive(Debug, Clone)]
pub struct RetryingMutator<M> {
    inner: M,
    policy: RetryPolicy,
}

impl<M: BalanceMutator> RetryingMutator<M> {
    /// Wraps `inner` with the given policy.
    pub const fn new(inner: M, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// The policy in effect.
    pub const fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Applies the mutation, retrying transient conflicts.
    ///
    /// # Returns
    /// * `Ok(balance)` - the new balance from the attempt that committed
    /// * `Err(WalletError::RetriesExhausted)` - every attempt hit a conflict;
    ///   the last conflict is kept as the source
    /// * `Err(_)` - any non-transient failure, unchanged and without retrying
    pub async fn apply_with_retry(
        &self,
        wallet_id: WalletId,
        amount: i64,
        kind: OperationKind,
    ) -> Result<i64, WalletError> {
        let mut attempt = 1;
        loop {
            match self.inner.apply(wallet_id, amount, kind).await {
                Ok(balance) => return Ok(balance),
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) if attempt >= self.policy.max_attempts => {
                    error!(
                        wallet_id = %wallet_id,
                        attempts = attempt,
                        error = %err,
                        "Giving up on wallet mutation"
                    );
                    return Err(WalletError::RetriesExhausted {
                        attempts: attempt,
                        last: Box::new(err),
                    });
                }
                Err(err) => {
                    let delay = self.policy.backoff(attempt);
                    warn!(
                        wallet_id = %wallet_id,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "Transient conflict, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[async_trait]
impl<M: BalanceMutator> BalanceMutator for RetryingMutator<M> {
    async fn apply(
        &self,
        wallet_id: WalletId,
        amount: i64,
        kind: OperationKind,
    ) -> Result<i64, WalletError> {
        self.apply_with_retry(wallet_id, amount, kind).await
    }
}
