//! `SeaORM` entity prelude.

pub use super::currencies::Entity as Currencies;
pub use super::transactions::Entity as Transactions;
pub use super::wallets::Entity as Wallets;
