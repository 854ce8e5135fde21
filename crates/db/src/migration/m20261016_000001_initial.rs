//! Initial database migration.
//!
//! Creates the currency reference table, wallets, and the append-only
//! transactions ledger.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: TABLES
        // ============================================================
        db.execute_unprepared(CURRENCIES_SQL).await?;
        db.execute_unprepared(WALLETS_SQL).await?;
        db.execute_unprepared(TRANSACTIONS_SQL).await?;

        // ============================================================
        // PART 3: TRIGGERS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE wallet_operation_type AS ENUM ('DEPOSIT', 'WITHDRAW');

CREATE TYPE transaction_status AS ENUM ('COMPLETED', 'FAILED');
";

const CURRENCIES_SQL: &str = r"
CREATE TABLE currencies (
    code VARCHAR(10) PRIMARY KEY,
    name VARCHAR(100) NOT NULL,
    minor_units INTEGER NOT NULL,
    is_fractional BOOLEAN NOT NULL DEFAULT true,

    -- 10^18 is the largest power of ten that fits in BIGINT
    CONSTRAINT chk_currencies_minor_units CHECK (minor_units BETWEEN 0 AND 18)
);
";

const WALLETS_SQL: &str = r"
CREATE TABLE wallets (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    -- Minor units of currency_code; written only by the wallet mutator
    balance BIGINT NOT NULL DEFAULT 0,
    currency_code VARCHAR(10) NOT NULL REFERENCES currencies(code),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_wallets_currency ON wallets(currency_code);
";

const TRANSACTIONS_SQL: &str = r"
CREATE TABLE transactions (
    id UUID PRIMARY KEY,
    wallet_id UUID NOT NULL REFERENCES wallets(id) ON DELETE RESTRICT,
    operation_type wallet_operation_type NOT NULL,
    amount BIGINT NOT NULL,
    status transaction_status NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_transactions_amount_positive CHECK (amount > 0)
);

CREATE INDEX idx_transactions_wallet ON transactions(wallet_id, created_at DESC);
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: prevent_ledger_modification
-- Ledger rows are append-only
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_ledger_modification()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'Wallet transactions are append-only (% rejected)', TG_OP;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_ledger_mod
BEFORE UPDATE OR DELETE ON transactions
FOR EACH ROW
EXECUTE FUNCTION prevent_ledger_modification();
";

const DROP_ALL_SQL: &str = r"
-- Order matters due to foreign key constraints
DROP TRIGGER IF EXISTS trg_prevent_ledger_mod ON transactions;
DROP FUNCTION IF EXISTS prevent_ledger_modification();

DROP TABLE IF EXISTS transactions CASCADE;
DROP TABLE IF EXISTS wallets CASCADE;
DROP TABLE IF EXISTS currencies CASCADE;

DROP TYPE IF EXISTS transaction_status;
DROP TYPE IF EXISTS wallet_operation_type;
";
