//! Currency repository for reference data.

use coffer_core::wallet::Currency;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, QueryOrder, Set};

use crate::entities::currencies;

/// Currency repository.
#[derive(Debug, Clone)]
pub struct CurrencyRepository {
    db: DatabaseConnection,
}

impl CurrencyRepository {
    /// Creates a new currency repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Inserts a currency or updates the existing row with the same code.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails, including when `minor_units`
    /// is outside the range allowed by the schema.
    pub async fn upsert(&self, currency: &Currency) -> Result<(), DbErr> {
        let model = currencies::ActiveModel {
            code: Set(currency.code.clone()),
            name: Set(currency.name.clone()),
            minor_units: Set(currency.minor_units),
            is_fractional: Set(currency.is_fractional),
        };

        currencies::Entity::insert(model)
            .on_conflict(
                OnConflict::column(currencies::Column::Code)
                    .update_columns([
                        currencies::Column::Name,
                        currencies::Column::MinorUnits,
                        currencies::Column::IsFractional,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;

        Ok(())
    }

    /// Lists all currencies ordered by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(&self) -> Result<Vec<Currency>, DbErr> {
        let rows = currencies::Entity::find()
            .order_by_asc(currencies::Column::Code)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| Currency {
                code: row.code,
                name: row.name,
                minor_units: row.minor_units,
                is_fractional: row.is_fractional,
            })
            .collect())
    }
}
