//! Wallet operation orchestrator.
//!
//! Sequences one deposit or withdrawal end to end:
//! fetch wallet, fetch currency, convert the amount, pre-check the balance,
//! apply through the retry controller, and render the committed balance.
//! Any stage failure short-circuits with the originating error unchanged.

use std::time::Duration;

use coffer_shared::WalletId;
use tracing::{Instrument, debug, error, info, info_span, warn};

use super::balance::check_operation;
use super::error::{FailureClass, WalletError};
use super::retry::{RetryPolicy, RetryingMutator};
use super::store::{BalanceMutator, WalletStore};
use super::types::{OperationOutcome, WalletBalance, WalletOperation};
use crate::currency::{from_minor_units, to_minor_units};

/// Orchestrates wallet operations over a store and a transactional mutator.
#[derive(Debug)]
pub struct WalletService<S, M> {
    store: S,
    mutator: RetryingMutator<M>,
    deadline: Option<Duration>,
}

impl<S, M> WalletService<S, M>
where
    S: WalletStore,
    M: BalanceMutator,
{
    /// Creates a service with no deadline.
    pub const fn new(store: S, mutator: M, policy: RetryPolicy) -> Self {
        Self {
            store,
            mutator: RetryingMutator::new(mutator, policy),
            deadline: None,
        }
    }

    /// Sets the deadline applied by [`Self::operate`]. `None` disables it.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// The retry policy in effect.
    pub const fn policy(&self) -> RetryPolicy {
        self.mutator.policy()
    }

    /// Executes a deposit or withdrawal under the configured deadline.
    ///
    /// # Arguments
    /// * `request` - Target wallet, operation kind and raw amount text
    ///
    /// # Returns
    /// * `Ok(OperationOutcome)` with the authoritative balance after commit
    /// * `Err(WalletError)` from whichever stage failed first
    pub async fn operate(&self, request: WalletOperation) -> Result<OperationOutcome, WalletError> {
        self.execute(request, self.deadline).await
    }

    /// Executes a deposit or withdrawal that must finish within `deadline`.
    ///
    /// On expiry the in-flight attempt is dropped, which rolls back any open
    /// storage transaction, and `WalletError::Timeout` is returned.
    pub async fn operate_within(
        &self,
        request: WalletOperation,
        deadline: Duration,
    ) -> Result<OperationOutcome, WalletError> {
        self.execute(request, Some(deadline)).await
    }

    async fn execute(
        &self,
        request: WalletOperation,
        deadline: Option<Duration>,
    ) -> Result<OperationOutcome, WalletError> {
        let span = info_span!(
            "wallet_operation",
            wallet_id = %request.wallet_id,
            operation = %request.kind,
        );

        let stages = self.run_stages(request).instrument(span.clone());
        let result = match deadline {
            Some(deadline) => tokio::time::timeout(deadline, stages)
                .await
                .unwrap_or_else(|_| {
                    span.in_scope(|| warn!(?deadline, "Wallet operation timed out"));
                    Err(WalletError::Timeout(deadline))
                }),
            None => stages.await,
        };

        span.in_scope(|| match &result {
            Ok(outcome) => info!(
                amount_minor = outcome.amount_minor,
                balance_minor = outcome.balance_minor,
                "Wallet operation committed"
            ),
            Err(err) => match err.class() {
                FailureClass::Domain => {
                    info!(code = err.error_code(), error = %err, "Wallet operation rejected");
                }
                FailureClass::Transient | FailureClass::Fatal => {
                    error!(code = err.error_code(), error = %err, "Wallet operation failed");
                }
            },
        });
        result
    }

    async fn run_stages(&self, request: WalletOperation) -> Result<OperationOutcome, WalletError> {
        let wallet = self.store.get_wallet(request.wallet_id).await?;
        let currency = self.store.get_currency(&wallet.currency_code).await?;
        let exponent = currency.exponent()?;

        let amount = to_minor_units(&request.amount, exponent)?;
        check_operation(wallet.balance, amount, request.kind)?;
        debug!(amount_minor = amount, balance_minor = wallet.balance, "Pre-check passed");

        let balance_minor = self
            .mutator
            .apply_with_retry(wallet.id, amount, request.kind)
            .await?;
        let balance = from_minor_units(balance_minor, exponent)?;

        Ok(OperationOutcome {
            wallet_id: wallet.id,
            kind: request.kind,
            amount_minor: amount,
            balance_minor,
            balance,
            currency: currency.code,
        })
    }

    /// Returns the current balance of a wallet.
    #[tracing::instrument(skip(self), fields(wallet_id = %wallet_id))]
    pub async fn balance(&self, wallet_id: WalletId) -> Result<WalletBalance, WalletError> {
        let wallet = self.store.get_wallet(wallet_id).await?;
        let currency = self.store.get_currency(&wallet.currency_code).await?;
        let balance = from_minor_units(wallet.balance, currency.exponent()?)?;

        Ok(WalletBalance {
            wallet_id: wallet.id,
            currency: currency.code,
            balance_minor: wallet.balance,
            balance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::memory::InMemoryWalletStore;
    use crate::wallet::store::{MockBalanceMutator, MockWalletStore};
    use crate::wallet::types::{Currency, OperationKind, TransactionStatus, Wallet};
    use chrono::Utc;
    use std::sync::Arc;

    fn rub() -> Currency {
        Currency {
            code: "RUB".to_string(),
            name: "Russian Ruble".to_string(),
            minor_units: 2,
            is_fractional: true,
        }
    }

    fn wallet(id: WalletId, balance: i64) -> Wallet {
        Wallet {
            id,
            balance,
            currency_code: "RUB".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn request(wallet_id: WalletId, kind: OperationKind, amount: &str) -> WalletOperation {
        WalletOperation {
            wallet_id,
            kind,
            amount: amount.to_string(),
        }
    }

    fn memory_service(
        balance: i64,
    ) -> (
        Arc<InMemoryWalletStore>,
        WalletId,
        WalletService<Arc<InMemoryWalletStore>, Arc<InMemoryWalletStore>>,
    ) {
        let store = Arc::new(InMemoryWalletStore::new());
        store.insert_currency(rub());
        let id = store.create_wallet("RUB", balance);
        let service = WalletService::new(store.clone(), store.clone(), RetryPolicy::default());
        (store, id, service)
    }

    fn mock_store(balance: i64) -> MockWalletStore {
        let mut store = MockWalletStore::new();
        store
            .expect_get_wallet()
            .returning(move |id| Ok(wallet(id, balance)));
        store.expect_get_currency().returning(|_| Ok(rub()));
        store
    }

    #[tokio::test]
    async fn test_deposit_with_comma_separator() {
        let (store, id, service) = memory_service(0);

        let outcome = service
            .operate(request(id, OperationKind::Deposit, "12,34"))
            .await
            .unwrap();

        assert_eq!(outcome.amount_minor, 1234);
        assert_eq!(outcome.balance_minor, 1234);
        assert_eq!(outcome.balance, "12.34");
        assert_eq!(outcome.currency, "RUB");
        assert_eq!(store.ledger(id).len(), 1);
    }

    #[tokio::test]
    async fn test_withdraw_more_than_balance() {
        let (store, id, service) = memory_service(500);

        let err = service
            .operate(request(id, OperationKind::Withdraw, "6.00"))
            .await
            .unwrap_err();

        assert!(matches!(err, WalletError::InsufficientFunds { balance: 500, requested: 600 }));
        assert_eq!(store.balance_of(id), Some(500));
        assert!(store.ledger(id).is_empty());
    }

    #[tokio::test]
    async fn test_withdraw_exact_balance() {
        let (store, id, service) = memory_service(500);

        let outcome = service
            .operate(request(id, OperationKind::Withdraw, "5"))
            .await
            .unwrap();

        assert_eq!(outcome.balance_minor, 0);
        assert_eq!(outcome.balance, "0.00");
        let ledger = store.ledger(id);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].kind, OperationKind::Withdraw);
        assert_eq!(ledger[0].amount, 500);
        assert_eq!(ledger[0].status, TransactionStatus::Completed);
    }

    #[tokio::test]
    async fn test_malformed_amount_never_reaches_mutator() {
        let mut mutator = MockBalanceMutator::new();
        mutator.expect_apply().never();
        let service = WalletService::new(mock_store(1000), mutator, RetryPolicy::default());

        let err = service
            .operate(request(WalletId::new(), OperationKind::Deposit, "12.345"))
            .await
            .unwrap_err();

        assert!(matches!(err, WalletError::MalformedAmount(text) if text == "12.345"));
    }

    #[tokio::test]
    async fn test_zero_amount_is_rejected() {
        let mut mutator = MockBalanceMutator::new();
        mutator.expect_apply().never();
        let service = WalletService::new(mock_store(1000), mutator, RetryPolicy::default());

        let err = service
            .operate(request(WalletId::new(), OperationKind::Deposit, "0,00"))
            .await
            .unwrap_err();

        assert!(matches!(err, WalletError::NonPositiveAmount));
    }

    #[tokio::test]
    async fn test_missing_wallet_short_circuits() {
        let mut store = MockWalletStore::new();
        store
            .expect_get_wallet()
            .returning(|id| Err(WalletError::WalletNotFound(id)));
        store.expect_get_currency().never();
        let mut mutator = MockBalanceMutator::new();
        mutator.expect_apply().never();
        let service = WalletService::new(store, mutator, RetryPolicy::default());
        let missing = WalletId::new();

        let err = service
            .operate(request(missing, OperationKind::Deposit, "1"))
            .await
            .unwrap_err();

        assert!(matches!(err, WalletError::WalletNotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn test_unconfigured_currency_is_fatal() {
        let store = Arc::new(InMemoryWalletStore::new());
        let id = store.create_wallet("XXX", 0);
        let service = WalletService::new(store.clone(), store, RetryPolicy::default());

        let err = service
            .operate(request(id, OperationKind::Deposit, "1"))
            .await
            .unwrap_err();

        assert!(matches!(err, WalletError::CurrencyNotFound(ref code) if code == "XXX"));
        assert_eq!(err.class(), FailureClass::Fatal);
    }

    #[tokio::test]
    async fn test_invalid_exponent_is_rejected_before_mutation() {
        let mut store = MockWalletStore::new();
        store
            .expect_get_wallet()
            .returning(|id| Ok(wallet(id, 0)));
        store.expect_get_currency().returning(|_| {
            Ok(Currency {
                minor_units: 0,
                ..rub()
            })
        });
        let mut mutator = MockBalanceMutator::new();
        mutator.expect_apply().never();
        let service = WalletService::new(store, mutator, RetryPolicy::default());

        let err = service
            .operate(request(WalletId::new(), OperationKind::Deposit, "1"))
            .await
            .unwrap_err();

        assert!(matches!(err, WalletError::InvalidCurrencyExponent(_)));
    }

    #[tokio::test]
    async fn test_result_uses_committed_balance() {
        // Another writer moved the balance between the read and the commit.
        let mut mutator = MockBalanceMutator::new();
        mutator
            .expect_apply()
            .times(1)
            .returning(|_, amount, _| Ok(10_000 + amount));
        let service = WalletService::new(mock_store(100), mutator, RetryPolicy::default());

        let outcome = service
            .operate(request(WalletId::new(), OperationKind::Deposit, "1.50"))
            .await
            .unwrap();

        assert_eq!(outcome.balance_minor, 10_150);
        assert_eq!(outcome.balance, "101.50");
    }

    #[tokio::test]
    async fn test_storage_insufficient_funds_propagates_unchanged() {
        let mut mutator = MockBalanceMutator::new();
        mutator.expect_apply().times(1).returning(|_, amount, _| {
            Err(WalletError::InsufficientFunds {
                balance: 10,
                requested: amount,
            })
        });
        let service = WalletService::new(mock_store(1000), mutator, RetryPolicy::default());

        let err = service
            .operate(request(WalletId::new(), OperationKind::Withdraw, "5"))
            .await
            .unwrap_err();

        assert!(matches!(err, WalletError::InsufficientFunds { balance: 10, requested: 500 }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhausted_surfaces() {
        let mut mutator = MockBalanceMutator::new();
        mutator
            .expect_apply()
            .times(6)
            .returning(|_, _, _| Err(WalletError::TransientConflict("40001".into())));
        let service = WalletService::new(mock_store(1000), mutator, RetryPolicy::default());

        let err = service
            .operate(request(WalletId::new(), OperationKind::Deposit, "1"))
            .await
            .unwrap_err();

        assert!(matches!(err, WalletError::RetriesExhausted { attempts: 6, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expires_mid_retry() {
        let mut mutator = MockBalanceMutator::new();
        mutator
            .expect_apply()
            .returning(|_, _, _| Err(WalletError::TransientConflict("40P01".into())));
        let service = WalletService::new(mock_store(1000), mutator, RetryPolicy::default())
            .with_deadline(Some(Duration::from_millis(1000)));

        let begin = tokio::time::Instant::now();
        let err = service
            .operate(request(WalletId::new(), OperationKind::Deposit, "1"))
            .await
            .unwrap_err();

        assert!(matches!(err, WalletError::Timeout(d) if d == Duration::from_millis(1000)));
        assert_eq!(begin.elapsed(), Duration::from_millis(1000));
    }

    /// Records each event's message and the name of its enclosing span.
    #[derive(Clone, Default)]
    struct SpanRecorder(Arc<std::sync::Mutex<Vec<(String, Option<String>)>>>);

    struct MessageVisitor(String);

    impl tracing::field::Visit for MessageVisitor {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{value:?}");
            }
        }
    }

    impl<S> tracing_subscriber::Layer<S> for SpanRecorder
    where
        S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            let mut visitor = MessageVisitor(String::new());
            event.record(&mut visitor);
            let span = ctx.event_span(event).map(|span| span.name().to_string());
            self.0.lock().unwrap().push((visitor.0, span));
        }
    }

    /// A mutator whose unit never finishes.
    struct StalledMutator;

    #[async_trait::async_trait]
    impl BalanceMutator for StalledMutator {
        async fn apply(
            &self,
            _wallet_id: WalletId,
            _amount: i64,
            _kind: OperationKind,
        ) -> Result<i64, WalletError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_logged_in_operation_span() {
        use tracing_subscriber::layer::SubscriberExt;

        let recorder = SpanRecorder::default();
        let subscriber = tracing_subscriber::registry().with(recorder.clone());
        let _guard = tracing::subscriber::set_default(subscriber);

        let service = WalletService::new(mock_store(1000), StalledMutator, RetryPolicy::default());
        let err = service
            .operate_within(
                request(WalletId::new(), OperationKind::Deposit, "1"),
                Duration::from_millis(250),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::Timeout(_)));

        let events = recorder.0.lock().unwrap();
        let timed_out = events
            .iter()
            .find(|(message, _)| message == "Wallet operation timed out")
            .expect("timeout event recorded");
        assert_eq!(timed_out.1.as_deref(), Some("wallet_operation"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_not_hit_returns_result() {
        let (_store, id, service) = memory_service(0);
        let service = service.with_deadline(Some(Duration::from_secs(5)));

        let outcome = service
            .operate(request(id, OperationKind::Deposit, "1"))
            .await
            .unwrap();

        assert_eq!(outcome.balance_minor, 100);
    }

    #[tokio::test]
    async fn test_balance_query() {
        let (_store, id, service) = memory_service(123_456);

        let balance = service.balance(id).await.unwrap();

        assert_eq!(balance.wallet_id, id);
        assert_eq!(balance.balance_minor, 123_456);
        assert_eq!(balance.balance, "1234.56");
        assert_eq!(balance.currency, "RUB");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_deposits_all_land() {
        let (store, id, service) = memory_service(0);
        let service = Arc::new(service);

        let tasks = (0..1000).map(|_| {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                service
                    .operate(request(id, OperationKind::Deposit, "0.01"))
                    .await
            })
        });
        let results = futures::future::join_all(tasks).await;

        assert!(results.into_iter().all(|r| r.unwrap().is_ok()));
        assert_eq!(store.balance_of(id), Some(1000));
        let ledger = store.ledger(id);
        assert_eq!(ledger.len(), 1000);
        assert!(ledger.iter().all(|e| e.status == TransactionStatus::Completed && e.amount == 1));
    }
}
