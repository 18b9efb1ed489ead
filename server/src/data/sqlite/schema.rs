//! SQLite schema definitions
//!
//! Initial schema with all tables. No migrations needed for first version.

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Complete schema SQL
pub const SCHEMA: &str = r#"
-- =============================================================================
-- Infrastructure: Schema version tracking
-- =============================================================================
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    version INTEGER NOT NULL,
    applied_at INTEGER NOT NULL,
    description TEXT
);

CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at INTEGER NOT NULL,
    checksum TEXT NOT NULL,
    execution_time_ms INTEGER,
    success INTEGER NOT NULL DEFAULT 1
);

-- =============================================================================
-- 1. Users
-- =============================================================================
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE CHECK(length(email) >= 3),
    first_name TEXT,
    last_name TEXT,
    profile_picture TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);

-- =============================================================================
-- 2. One-time passwords (one row per email, upserted on re-issue)
-- =============================================================================
CREATE TABLE IF NOT EXISTS otp_store (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    otp TEXT,
    otp_expiration INTEGER,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

-- =============================================================================
-- 3. Refresh tokens (several live rows per user: multi-device sessions)
-- =============================================================================
CREATE TABLE IF NOT EXISTS refresh_tokens (
    id TEXT PRIMARY KEY,
    token TEXT NOT NULL,
    user_email TEXT NOT NULL,
    expires_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_refresh_tokens_token ON refresh_tokens(token, user_email);

-- =============================================================================
-- 4. Companies (owned by exactly one user)
-- =============================================================================
CREATE TABLE IF NOT EXISTS companies (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    website TEXT,
    phone TEXT,
    mobile TEXT,
    email TEXT NOT NULL,
    image TEXT,
    industry TEXT NOT NULL DEFAULT 'none',
    registration_number TEXT,
    address TEXT NOT NULL,
    belongs_to TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_companies_belongs_to ON companies(belongs_to);
CREATE UNIQUE INDEX IF NOT EXISTS idx_companies_owner_name ON companies(belongs_to, name);

-- =============================================================================
-- 5. Customers (shared across companies via junction table)
-- =============================================================================
CREATE TABLE IF NOT EXISTS customers (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    mobile TEXT,
    phone TEXT,
    address TEXT
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_customers_identity ON customers(name, email);

CREATE TABLE IF NOT EXISTS company_customers (
    company_id TEXT NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    customer_id TEXT NOT NULL REFERENCES customers(id) ON DELETE CASCADE,
    PRIMARY KEY (company_id, customer_id)
);

CREATE INDEX IF NOT EXISTS idx_company_customers_customer ON company_customers(customer_id);

-- =============================================================================
-- 6. Invoices
-- =============================================================================
CREATE TABLE IF NOT EXISTS invoices (
    id TEXT PRIMARY KEY,
    invoice_number TEXT NOT NULL,
    date TEXT NOT NULL,
    sub_total REAL NOT NULL,
    total_amount REAL NOT NULL,
    vat REAL NOT NULL,
    currency TEXT NOT NULL,
    is_archived INTEGER NOT NULL DEFAULT 0,
    mark_as_draft INTEGER NOT NULL DEFAULT 0,
    company_id TEXT NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    customer_id TEXT REFERENCES customers(id) ON DELETE SET NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_invoices_company ON invoices(company_id);
CREATE INDEX IF NOT EXISTS idx_invoices_customer ON invoices(customer_id);

-- =============================================================================
-- 7. Invoice items (cascade on invoice delete)
-- =============================================================================
CREATE TABLE IF NOT EXISTS invoice_items (
    id TEXT PRIMARY KEY,
    description TEXT NOT NULL,
    unit_price REAL NOT NULL,
    quantity INTEGER NOT NULL,
    total_price REAL NOT NULL,
    archived INTEGER NOT NULL DEFAULT 0,
    invoice_id TEXT NOT NULL REFERENCES invoices(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_invoice_items_invoice ON invoice_items(invoice_id);
"#;
