//! Initial database migration.
//!
//! Creates the enum types, the ledger fact tables, the statistic cell store,
//! triggers, and seed data.

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
        // PART 2: PROPERTIES & CATEGORIES
        // ============================================================
        db.execute_unprepared(PROPERTIES_SQL).await?;
        db.execute_unprepared(INCOME_CATEGORIES_SQL).await?;

        // ============================================================
        // PART 3: LEDGER FACTS
        // ============================================================
        db.execute_unprepared(INCOMES_SQL).await?;
        db.execute_unprepared(EXPENSES_SQL).await?;
        db.execute_unprepared(TRANSACTIONS_SQL).await?;

        // ============================================================
        // PART 4: STATISTIC CELL STORE
        // ============================================================
        db.execute_unprepared(PROPERTY_STATISTICS_SQL).await?;

        // ============================================================
        // PART 5: TRIGGERS & FUNCTIONS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        // ============================================================
        // PART 6: SEED DATA
        // ============================================================
        db.execute_unprepared(SEED_INCOME_CATEGORIES_SQL).await?;

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
-- Transaction kinds
CREATE TYPE transaction_kind AS ENUM (
    'income',
    'expense',
    'deposit',
    'withdraw'
);

-- Ledger entry review status
CREATE TYPE entry_status AS ENUM (
    'pending',
    'accepted',
    'rejected'
);

-- Statistic cell metrics
CREATE TYPE statistic_metric AS ENUM (
    'balance',
    'income',
    'expense',
    'deposit',
    'withdraw',
    'rental_visits'
);
";

const PROPERTIES_SQL: &str = r"
CREATE TABLE properties (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    address VARCHAR(500),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const INCOME_CATEGORIES_SQL: &str = r"
CREATE TABLE income_categories (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    code VARCHAR(64) NOT NULL UNIQUE,
    name VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const INCOMES_SQL: &str = r"
CREATE TABLE incomes (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    property_id UUID NOT NULL REFERENCES properties(id) ON DELETE CASCADE,
    category_id UUID NOT NULL REFERENCES income_categories(id),
    amount NUMERIC(19, 4) NOT NULL,
    income_date DATE NOT NULL,
    status entry_status NOT NULL DEFAULT 'pending',
    description VARCHAR(500),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_incomes_property_status ON incomes(property_id, status);
CREATE INDEX idx_incomes_date ON incomes(income_date);
";

const EXPENSES_SQL: &str = r"
CREATE TABLE expenses (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    property_id UUID NOT NULL REFERENCES properties(id) ON DELETE CASCADE,
    amount NUMERIC(19, 4) NOT NULL,
    expense_date DATE NOT NULL,
    status entry_status NOT NULL DEFAULT 'pending',
    description VARCHAR(500),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_expenses_property_status ON expenses(property_id, status);
CREATE INDEX idx_expenses_date ON expenses(expense_date);
";

const TRANSACTIONS_SQL: &str = r"
CREATE TABLE transactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    property_id UUID NOT NULL REFERENCES properties(id) ON DELETE CASCADE,
    kind transaction_kind NOT NULL,
    status entry_status NOT NULL DEFAULT 'pending',
    amount NUMERIC(19, 4) NOT NULL,
    transaction_date DATE NOT NULL,
    income_category_id UUID REFERENCES income_categories(id),
    description VARCHAR(500),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_transactions_property_status ON transactions(property_id, status);
CREATE INDEX idx_transactions_kind ON transactions(kind);
CREATE INDEX idx_transactions_date ON transactions(transaction_date);
";

const PROPERTY_STATISTICS_SQL: &str = r"
CREATE TABLE property_statistics (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    property_id UUID NOT NULL REFERENCES properties(id) ON DELETE CASCADE,
    metric statistic_metric NOT NULL,
    year INTEGER,
    month INTEGER,
    value NUMERIC(19, 4) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    -- A month only exists inside a year
    CONSTRAINT chk_statistics_month_range CHECK (month IS NULL OR month BETWEEN 1 AND 12),
    CONSTRAINT chk_statistics_month_requires_year CHECK (month IS NULL OR year IS NOT NULL),

    -- NULL year/month are coordinates of their own: the all-time and
    -- whole-year cells must be as unique as the monthly ones. Requires
    -- PostgreSQL 15+. The upsert in the delta applier targets this
    -- constraint with ON CONFLICT.
    CONSTRAINT uq_statistics_coordinate
        UNIQUE NULLS NOT DISTINCT (property_id, metric, year, month)
);

CREATE INDEX idx_statistics_property_metric ON property_statistics(property_id, metric);
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: set_updated_at
-- Keeps updated_at current on every row update, including the
-- ON CONFLICT DO UPDATE path of the statistics upsert.
-- ============================================================
CREATE OR REPLACE FUNCTION set_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at := now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_properties_updated_at
BEFORE UPDATE ON properties
FOR EACH ROW
EXECUTE FUNCTION set_updated_at();

CREATE TRIGGER trg_incomes_updated_at
BEFORE UPDATE ON incomes
FOR EACH ROW
EXECUTE FUNCTION set_updated_at();

CREATE TRIGGER trg_expenses_updated_at
BEFORE UPDATE ON expenses
FOR EACH ROW
EXECUTE FUNCTION set_updated_at();

CREATE TRIGGER trg_transactions_updated_at
BEFORE UPDATE ON transactions
FOR EACH ROW
EXECUTE FUNCTION set_updated_at();

CREATE TRIGGER trg_property_statistics_updated_at
BEFORE UPDATE ON property_statistics
FOR EACH ROW
EXECUTE FUNCTION set_updated_at();
";

const SEED_INCOME_CATEGORIES_SQL: &str = r"
INSERT INTO income_categories (code, name) VALUES
    ('long_term_rental', 'Long-term rental'),
    ('short_term_rental', 'Short-term rental'),
    ('deposit_refund', 'Deposit refund'),
    ('other', 'Other income')
ON CONFLICT (code) DO NOTHING;
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS property_statistics CASCADE;
DROP TABLE IF EXISTS transactions CASCADE;
DROP TABLE IF EXISTS expenses CASCADE;
DROP TABLE IF EXISTS incomes CASCADE;
DROP TABLE IF EXISTS income_categories CASCADE;
DROP TABLE IF EXISTS properties CASCADE;

DROP FUNCTION IF EXISTS set_updated_at CASCADE;

DROP TYPE IF EXISTS statistic_metric;
DROP TYPE IF EXISTS entry_status;
DROP TYPE IF EXISTS transaction_kind;
";
