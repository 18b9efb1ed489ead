// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "QuickBill";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "quickbill";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "QUICKBILL_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "QUICKBILL_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "QUICKBILL_LOG";

/// Environment variable for the allowed CORS origin
pub const ENV_CORS_ORIGIN: &str = "QUICKBILL_CORS_ORIGIN";

// =============================================================================
// Environment Variables - Storage
// =============================================================================

/// Environment variable for the SQLite database path (`:memory:` supported)
pub const ENV_DATABASE_PATH: &str = "QUICKBILL_DATABASE_PATH";

// =============================================================================
// Environment Variables - Auth
// =============================================================================

/// Secret used to sign access tokens
pub const ENV_ACCESS_TOKEN_SECRET: &str = "QUICKBILL_ACCESS_TOKEN_SECRET";

/// Access token lifetime in seconds
pub const ENV_ACCESS_TOKEN_TTL: &str = "QUICKBILL_ACCESS_TOKEN_TTL_SECS";

/// Secret used to sign refresh tokens (must differ from the access secret)
pub const ENV_REFRESH_TOKEN_SECRET: &str = "QUICKBILL_REFRESH_TOKEN_SECRET";

/// Refresh token lifetime in seconds
pub const ENV_REFRESH_TOKEN_TTL: &str = "QUICKBILL_REFRESH_TOKEN_TTL_SECS";

/// One-time password lifetime in minutes
pub const ENV_OTP_TTL: &str = "QUICKBILL_OTP_TTL_MINUTES";

// =============================================================================
// Environment Variables - Email
// =============================================================================

/// Mailer backend selector (`log` or `http`)
pub const ENV_MAILER_BACKEND: &str = "QUICKBILL_MAILER";

/// Delivery API endpoint for the HTTP mailer
pub const ENV_MAILER_API_URL: &str = "QUICKBILL_MAILER_API_URL";

/// Delivery API key for the HTTP mailer
pub const ENV_MAILER_API_KEY: &str = "QUICKBILL_MAILER_API_KEY";

/// Sender address for outgoing mail
pub const ENV_MAILER_FROM: &str = "QUICKBILL_MAILER_FROM";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 4280;

/// Default allowed CORS origin (local frontend dev server)
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

// =============================================================================
// Authentication
// =============================================================================

/// Cookie name for the access token
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

/// Cookie name for the refresh token
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Default access token TTL in seconds (1 hour)
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 3600;

/// Default refresh token TTL in seconds (1 day)
pub const DEFAULT_REFRESH_TOKEN_TTL_SECS: i64 = 86_400;

/// Default one-time password TTL in minutes
pub const DEFAULT_OTP_TTL_MINUTES: i64 = 5;

/// Inclusive lower bound for generated one-time passwords
pub const OTP_MIN: u32 = 100_000;

/// Inclusive upper bound for generated one-time passwords
pub const OTP_MAX: u32 = 999_999;

// =============================================================================
// SQLite Database
// =============================================================================

/// SQLite database filename
pub const SQLITE_DB_FILENAME: &str = "quickbill.db";

/// SQLite connection pool max connections
pub const SQLITE_MAX_CONNECTIONS: u32 = 5;

/// SQLite busy timeout in seconds
pub const SQLITE_BUSY_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Error Messages
//
// Closed message set for authorization failures. Guards and services use
// these verbatim; no ad-hoc string building for security-relevant errors.
// =============================================================================

pub const MSG_USER_NOT_FOUND: &str = "User not found";
pub const MSG_USER_MODIFICATION_FORBIDDEN: &str =
    "You don't have permission to modify this user";
pub const MSG_COMPANY_NOT_FOUND: &str = "Company not found";
pub const MSG_COMPANY_ID_REQUIRED: &str = "Company ID is required";
pub const MSG_COMPANY_MODIFICATION_FORBIDDEN: &str =
    "You don't have permission to modify this company";
pub const MSG_COMPANY_ALREADY_EXISTS: &str = "Company already exists";
pub const MSG_CUSTOMER_NOT_FOUND: &str = "Customer not found";
pub const MSG_CUSTOMER_ALREADY_EXISTS_FOR_COMPANY: &str =
    "Customer already exists for this company";
pub const MSG_INVOICE_NOT_FOUND: &str = "Invoice not found";
pub const MSG_INVOICE_ID_REQUIRED: &str = "Invoice ID is required";
pub const MSG_INVOICE_MODIFICATION_FORBIDDEN: &str =
    "You don't have permission to modify this invoice";
pub const MSG_INVOICE_ITEM_NOT_FOUND: &str = "Invoice item not found";
pub const MSG_INVALID_OTP: &str = "Invalid OTP";
