//! Initial database migration.
//!
//! Creates the enums, tables, indexes and the trigger guarding settled
//! expenses.

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
        // PART 2: PEOPLE
        // ============================================================
        db.execute_unprepared(USERS_SQL).await?;
        db.execute_unprepared(COUPLES_SQL).await?;

        // ============================================================
        // PART 3: EXPENSES
        // ============================================================
        db.execute_unprepared(CATEGORIES_SQL).await?;
        db.execute_unprepared(EXPENSES_SQL).await?;

        // ============================================================
        // PART 4: SETTLEMENTS
        // ============================================================
        db.execute_unprepared(SETTLEMENTS_SQL).await?;
        db.execute_unprepared(SETTLEMENT_EXPENSES_SQL).await?;

        // ============================================================
        // PART 5: TRIGGERS
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
CREATE TYPE settlement_status AS ENUM ('pending', 'completed', 'cancelled');

CREATE TYPE settlement_direction AS ENUM (
    'user1_pays_user2',
    'user2_pays_user1',
    'none'
);
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    email VARCHAR(255) NOT NULL UNIQUE,
    display_name VARCHAR(100) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const COUPLES_SQL: &str = r"
CREATE TABLE couples (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user1_id UUID NOT NULL UNIQUE REFERENCES users(id),
    user2_id UUID NOT NULL UNIQUE REFERENCES users(id),
    name VARCHAR(100),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_distinct_partners CHECK (user1_id <> user2_id)
);

-- A user belongs to at most one couple, on either side.
CREATE OR REPLACE FUNCTION check_single_couple()
RETURNS TRIGGER AS $$
BEGIN
    IF EXISTS (
        SELECT 1 FROM couples
        WHERE id <> NEW.id
          AND (user1_id IN (NEW.user1_id, NEW.user2_id)
               OR user2_id IN (NEW.user1_id, NEW.user2_id))
    ) THEN
        RAISE EXCEPTION 'User already belongs to a couple';
    END IF;
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_check_single_couple
BEFORE INSERT OR UPDATE ON couples
FOR EACH ROW
EXECUTE FUNCTION check_single_couple();
";

const CATEGORIES_SQL: &str = r"
CREATE TABLE categories (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    couple_id UUID NOT NULL REFERENCES couples(id) ON DELETE CASCADE,
    name VARCHAR(50) NOT NULL,
    color CHAR(7),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT uq_categories_couple_name UNIQUE (couple_id, name),
    CONSTRAINT chk_category_color CHECK (color IS NULL OR color ~ '^#[0-9A-Fa-f]{6}$')
);
";

const EXPENSES_SQL: &str = r"
CREATE TABLE expenses (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    couple_id UUID NOT NULL REFERENCES couples(id) ON DELETE CASCADE,
    payer_id UUID NOT NULL REFERENCES users(id),
    category_id UUID REFERENCES categories(id) ON DELETE SET NULL,
    amount NUMERIC(14, 0) NOT NULL,
    split_ratio NUMERIC(5, 4) NOT NULL DEFAULT 0.5,
    description VARCHAR(200) NOT NULL DEFAULT '',
    expense_date DATE NOT NULL,
    settled BOOLEAN NOT NULL DEFAULT false,
    created_by UUID NOT NULL REFERENCES users(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_expense_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_expense_split_ratio CHECK (split_ratio BETWEEN 0 AND 1)
);

CREATE INDEX idx_expenses_couple_date ON expenses(couple_id, expense_date DESC);
CREATE INDEX idx_expenses_unsettled ON expenses(couple_id, expense_date) WHERE settled = false;
CREATE INDEX idx_expenses_category ON expenses(category_id) WHERE category_id IS NOT NULL;
";

const SETTLEMENTS_SQL: &str = r"
CREATE TABLE settlements (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    couple_id UUID NOT NULL REFERENCES couples(id) ON DELETE CASCADE,
    period_start DATE NOT NULL,
    period_end DATE NOT NULL,
    user1_paid_total NUMERIC(16, 0) NOT NULL,
    user2_paid_total NUMERIC(16, 0) NOT NULL,
    user1_should_pay NUMERIC(16, 0) NOT NULL,
    user2_should_pay NUMERIC(16, 0) NOT NULL,
    settlement_amount NUMERIC(16, 0) NOT NULL,
    direction settlement_direction NOT NULL,
    status settlement_status NOT NULL DEFAULT 'pending',
    created_by UUID NOT NULL REFERENCES users(id),
    completed_at TIMESTAMPTZ,
    cancelled_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_settlement_period CHECK (period_start <= period_end),
    CONSTRAINT chk_settlement_zero_sum CHECK (
        user1_paid_total + user2_paid_total = user1_should_pay + user2_should_pay
    ),
    CONSTRAINT chk_settlement_amount CHECK (
        settlement_amount > 0 AND direction <> 'none'
    ),
    CONSTRAINT chk_settlement_completed_at CHECK (
        (status = 'completed') = (completed_at IS NOT NULL)
    ),
    CONSTRAINT chk_settlement_cancelled_at CHECK (
        (status = 'cancelled') = (cancelled_at IS NOT NULL)
    )
);

CREATE INDEX idx_settlements_couple_created ON settlements(couple_id, created_at DESC);
CREATE INDEX idx_settlements_couple_status ON settlements(couple_id, status);
";

const SETTLEMENT_EXPENSES_SQL: &str = r"
CREATE TABLE settlement_expenses (
    settlement_id UUID NOT NULL REFERENCES settlements(id) ON DELETE CASCADE,
    expense_id UUID NOT NULL REFERENCES expenses(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    PRIMARY KEY (settlement_id, expense_id),
    CONSTRAINT uq_settlement_expenses_expense UNIQUE (expense_id)
);
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: prevent_settled_expense_modification
-- Settled expenses keep the amounts their settlement was computed from.
-- Only the category may change (ON DELETE SET NULL from categories).
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_settled_expense_modification()
RETURNS TRIGGER AS $$
BEGIN
    IF TG_OP = 'DELETE' THEN
        IF OLD.settled THEN
            RAISE EXCEPTION 'Cannot delete settled expense %', OLD.id;
        END IF;
        RETURN OLD;
    END IF;

    IF OLD.settled AND (
        NEW.settled IS DISTINCT FROM OLD.settled
        OR NEW.amount IS DISTINCT FROM OLD.amount
        OR NEW.split_ratio IS DISTINCT FROM OLD.split_ratio
        OR NEW.payer_id IS DISTINCT FROM OLD.payer_id
        OR NEW.expense_date IS DISTINCT FROM OLD.expense_date
        OR NEW.couple_id IS DISTINCT FROM OLD.couple_id
    ) THEN
        RAISE EXCEPTION 'Cannot modify settled expense %', OLD.id;
    END IF;

    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_settled_expense_mod
BEFORE UPDATE OR DELETE ON expenses
FOR EACH ROW
EXECUTE FUNCTION prevent_settled_expense_modification();

-- ============================================================
-- FUNCTION: prevent_terminal_settlement_modification
-- Completed and cancelled settlements are final.
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_terminal_settlement_modification()
RETURNS TRIGGER AS $$
BEGIN
    IF OLD.status IN ('completed', 'cancelled') THEN
        RAISE EXCEPTION 'Cannot modify % settlement %', OLD.status, OLD.id;
    END IF;
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_terminal_settlement_mod
BEFORE UPDATE ON settlements
FOR EACH ROW
EXECUTE FUNCTION prevent_terminal_settlement_modification();
";

const DROP_ALL_SQL: &str = r"
-- ============================================================
-- DROP ALL: Rollback migration
-- Order matters due to foreign key constraints
-- ============================================================

DROP TRIGGER IF EXISTS trg_prevent_terminal_settlement_mod ON settlements;
DROP TRIGGER IF EXISTS trg_prevent_settled_expense_mod ON expenses;
DROP TRIGGER IF EXISTS trg_check_single_couple ON couples;

DROP FUNCTION IF EXISTS prevent_terminal_settlement_modification();
DROP FUNCTION IF EXISTS prevent_settled_expense_modification();
DROP FUNCTION IF EXISTS check_single_couple();

DROP TABLE IF EXISTS settlement_expenses CASCADE;
DROP TABLE IF EXISTS settlements CASCADE;
DROP TABLE IF EXISTS expenses CASCADE;
DROP TABLE IF EXISTS categories CASCADE;
DROP TABLE IF EXISTS couples CASCADE;
DROP TABLE IF EXISTS users CASCADE;

DROP TYPE IF EXISTS settlement_direction;
DROP TYPE IF EXISTS settlement_status;
";
