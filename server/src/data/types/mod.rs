//! Shared data types for the storage layer
//!
//! Row structs mirror table columns; the `New*`/`*Update` structs are the
//! typed inputs the repository trait accepts. Timestamps are unix seconds.

use serde::{Deserialize, Serialize};

// ============================================================================
// Address
// ============================================================================

/// Postal address, persisted as a JSON column
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub number: String,
    pub zip: String,
    pub city: String,
    #[serde(default)]
    pub state: Option<String>,
    pub country: String,
}

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_picture: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Partial update for a user; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_picture: Option<String>,
}

// ============================================================================
// One-time passwords
// ============================================================================

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OtpRow {
    pub id: String,
    pub email: String,
    pub otp: Option<String>,
    pub otp_expiration: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

// ============================================================================
// Refresh tokens
// ============================================================================

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshTokenRow {
    pub id: String,
    pub token: String,
    pub user_email: String,
    pub expires_at: i64,
}

// ============================================================================
// Companies
// ============================================================================

#[derive(Debug, Clone)]
pub struct CompanyRow {
    pub id: String,
    pub name: String,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    pub email: String,
    pub image: Option<String>,
    pub industry: String,
    pub registration_number: Option<String>,
    pub address: Address,
    /// Owning user id; the ownership guards compare against this
    pub belongs_to: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone)]
pub struct NewCompany {
    pub name: String,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    pub email: String,
    pub image: Option<String>,
    pub industry: Option<String>,
    pub registration_number: Option<String>,
    pub address: Address,
}

#[derive(Debug, Clone, Default)]
pub struct CompanyUpdate {
    pub name: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
    pub industry: Option<String>,
    pub registration_number: Option<String>,
    pub address: Option<Address>,
}

// ============================================================================
// Customers
// ============================================================================

#[derive(Debug, Clone)]
pub struct CustomerRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub mobile: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
}

#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub mobile: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
}

#[derive(Debug, Clone, Default)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
}

// ============================================================================
// Invoices
// ============================================================================

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InvoiceRow {
    pub id: String,
    pub invoice_number: String,
    /// Invoice date (ISO 8601 date string)
    pub date: String,
    pub sub_total: f64,
    pub total_amount: f64,
    pub vat: f64,
    pub currency: String,
    pub is_archived: bool,
    pub mark_as_draft: bool,
    pub company_id: String,
    pub customer_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub invoice_number: String,
    pub date: String,
    pub sub_total: f64,
    pub total_amount: f64,
    pub vat: f64,
    pub currency: String,
    pub mark_as_draft: bool,
    pub company_id: String,
    pub customer_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct InvoiceUpdate {
    pub invoice_number: Option<String>,
    pub date: Option<String>,
    pub sub_total: Option<f64>,
    pub total_amount: Option<f64>,
    pub vat: Option<f64>,
    pub currency: Option<String>,
    pub mark_as_draft: Option<bool>,
}

/// Sort key for invoice listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InvoiceSortBy {
    #[default]
    CreatedAt,
    TotalAmount,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Filters and pagination for invoice listings
///
/// `owner_user_id` is always set: listings never escape the caller's owned
/// company set, regardless of the other filters.
#[derive(Debug, Clone)]
pub struct ListInvoicesParams {
    pub owner_user_id: String,
    pub company_id: Option<String>,
    pub customer_id: Option<String>,
    pub archived: bool,
    pub draft: Option<bool>,
    pub currency: Option<String>,
    pub sort_by: InvoiceSortBy,
    pub order: SortOrder,
    pub page: u32,
    pub limit: u32,
}

// ============================================================================
// Invoice items
// ============================================================================

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InvoiceItemRow {
    pub id: String,
    pub description: String,
    pub unit_price: f64,
    pub quantity: i64,
    pub total_price: f64,
    pub archived: bool,
    pub invoice_id: String,
}

#[derive(Debug, Clone)]
pub struct NewInvoiceItem {
    pub description: String,
    pub unit_price: f64,
    pub quantity: i64,
    pub total_price: f64,
}

#[derive(Debug, Clone, Default)]
pub struct InvoiceItemUpdate {
    pub description: Option<String>,
    pub unit_price: Option<f64>,
    pub quantity: Option<i64>,
    pub total_price: Option<f64>,
}
