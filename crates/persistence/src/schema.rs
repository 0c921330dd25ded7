//! Database schema definitions

/// SQL to create all tables
/// NOTE: trade history, survey answers, metrics, and profiles are JSON TEXT
/// documents — the pipeline reads and writes them whole, never field by field
pub const CREATE_TABLES: &str = r#"
-- Trader documents: one row per registered trader
CREATE TABLE IF NOT EXISTS traders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    trader_id TEXT NOT NULL UNIQUE,
    username TEXT NOT NULL,
    trade_history TEXT NOT NULL DEFAULT '[]',
    survey_responses TEXT NOT NULL DEFAULT '{}',
    derived_metrics TEXT,
    behavioral_profile TEXT,
    created_at INTEGER DEFAULT (strftime('%s', 'now'))
);

-- Login credentials, stored separately from the profile document
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    trader_id TEXT NOT NULL,
    created_at INTEGER DEFAULT (strftime('%s', 'now'))
);

-- ========== INDEXES ==========

CREATE INDEX IF NOT EXISTS idx_traders_trader_id ON traders(trader_id);
CREATE INDEX IF NOT EXISTS idx_users_trader_id ON users(trader_id)
"#;

/// ALTER TABLE migrations for columns added after the initial schema.
/// Each runs on startup; "duplicate column name" errors are tolerated.
pub const MIGRATIONS: &[&str] = &[];
