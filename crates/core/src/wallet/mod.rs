//! Wallet balance mutation.
//!
//! - [`balance`] - invariant checks on a candidate mutation
//! - [`retry`] - retry controller for transient storage conflicts
//! - [`service`] - the orchestrator that callers use
//! - [`store`] - traits implemented by the storage layer

pub mod balance;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod retry;
pub mod service;
pub mod store;
pub mod types;

pub use balance::{apply_operation, check_operation};
pub use error::{FailureClass, WalletError};
#[cfg(any(test, feature = "test-util"))]
pub use memory::InMemoryWalletStore;
pub use retry::{RetryPolicy, RetryingMutator};
pub use service::WalletService;
pub use store::{BalanceMutator, WalletStore};
pub use types::{
    Currency, LedgerEntry, OperationKind, OperationOutcome, TransactionStatus, Wallet,
    WalletBalance, WalletOperation,
};
