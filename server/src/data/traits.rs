//! Repository trait for the transactional store
//!
//! The trait is the capability surface the rest of the application programs
//! against: typed find/save/delete operations plus the few transactional
//! compounds the auth core needs. The SQLite backend implements it; another
//! relational backend could be slotted in without touching the services.

use async_trait::async_trait;

use crate::data::error::DataError;
use crate::data::types::{
    CompanyRow, CompanyUpdate, CustomerRow, CustomerUpdate, InvoiceItemRow, InvoiceItemUpdate,
    InvoiceRow, InvoiceUpdate, ListInvoicesParams, NewCompany, NewCustomer, NewInvoice,
    NewInvoiceItem, OtpRow, RefreshTokenRow, UserRow, UserUpdate,
};

/// Repository trait for transactional operations
#[async_trait]
pub trait TransactionalRepository: Send + Sync {
    // ==================== User Operations ====================

    /// Create-or-fetch a minimal user stub for an email (transactional;
    /// concurrent calls for the same new email converge on one row)
    async fn create_temporary_user(&self, email: &str) -> Result<UserRow, DataError>;

    /// Get a user by ID
    async fn get_user(&self, id: &str) -> Result<Option<UserRow>, DataError>;

    /// Get a user by email
    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>, DataError>;

    /// Ids of companies owned by a user (source of the derived onboarding flag)
    async fn owned_company_ids(&self, user_id: &str) -> Result<Vec<String>, DataError>;

    /// Apply a partial update to a user
    async fn update_user(
        &self,
        id: &str,
        update: &UserUpdate,
    ) -> Result<Option<UserRow>, DataError>;

    /// Delete a user
    async fn delete_user(&self, id: &str) -> Result<bool, DataError>;

    // ==================== OTP Operations ====================

    /// Store a one-time password, replacing any previous one for the email
    async fn upsert_otp(&self, email: &str, otp: &str, expires_at: i64)
    -> Result<(), DataError>;

    /// Get the stored OTP record for an email
    async fn get_otp(&self, email: &str) -> Result<Option<OtpRow>, DataError>;

    /// Null out the code and expiration for an email
    async fn clear_otp(&self, email: &str) -> Result<(), DataError>;

    // ==================== Refresh Token Operations ====================

    /// Persist a refresh token
    async fn insert_refresh_token(
        &self,
        token: &str,
        user_email: &str,
        expires_at: i64,
    ) -> Result<RefreshTokenRow, DataError>;

    /// Look up a persisted refresh token by (token, email)
    async fn get_refresh_token(
        &self,
        token: &str,
        user_email: &str,
    ) -> Result<Option<RefreshTokenRow>, DataError>;

    /// Delete a persisted refresh token
    async fn delete_refresh_token(
        &self,
        token: &str,
        user_email: &str,
    ) -> Result<bool, DataError>;

    // ==================== Company Operations ====================

    /// Create a company owned by a user
    async fn create_company(
        &self,
        data: &NewCompany,
        owner_user_id: &str,
    ) -> Result<CompanyRow, DataError>;

    /// Get a company by ID
    async fn get_company(&self, id: &str) -> Result<Option<CompanyRow>, DataError>;

    /// Whether the owner already has a company with this name
    async fn company_exists_for_owner(
        &self,
        name: &str,
        owner_user_id: &str,
    ) -> Result<bool, DataError>;

    /// List companies owned by a user with the total count
    async fn list_companies(
        &self,
        owner_user_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<CompanyRow>, u64), DataError>;

    /// Apply a partial update to a company
    async fn update_company(
        &self,
        id: &str,
        update: &CompanyUpdate,
    ) -> Result<Option<CompanyRow>, DataError>;

    /// Delete a company and its dependent records
    async fn delete_company(&self, id: &str) -> Result<bool, DataError>;

    // ==================== Customer Operations ====================

    /// Create a customer and link it to a company
    async fn create_customer_for_company(
        &self,
        data: &NewCustomer,
        company_id: &str,
    ) -> Result<CustomerRow, DataError>;

    /// Get a customer by ID
    async fn get_customer(&self, id: &str) -> Result<Option<CustomerRow>, DataError>;

    /// Find a customer by its unique (name, email) pair
    async fn find_customer_by_identity(
        &self,
        name: &str,
        email: &str,
    ) -> Result<Option<CustomerRow>, DataError>;

    /// Whether a customer is linked to a company
    async fn customer_belongs_to_company(
        &self,
        customer_id: &str,
        company_id: &str,
    ) -> Result<bool, DataError>;

    /// Link an existing customer to a company
    async fn link_customer_to_company(
        &self,
        customer_id: &str,
        company_id: &str,
    ) -> Result<(), DataError>;

    /// Remove a customer's association with a company
    async fn unlink_customer_from_company(
        &self,
        customer_id: &str,
        company_id: &str,
    ) -> Result<bool, DataError>;

    /// List customers linked to a company with the total count
    async fn list_customers_for_company(
        &self,
        company_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<CustomerRow>, u64), DataError>;

    /// Ids of companies a customer is linked to
    async fn customer_company_ids(&self, customer_id: &str) -> Result<Vec<String>, DataError>;

    /// Apply a partial update to a customer
    async fn update_customer(
        &self,
        id: &str,
        update: &CustomerUpdate,
    ) -> Result<Option<CustomerRow>, DataError>;

    // ==================== Invoice Operations ====================

    /// Create an invoice
    async fn create_invoice(&self, data: &NewInvoice) -> Result<InvoiceRow, DataError>;

    /// Get an invoice by ID
    async fn get_invoice(&self, id: &str) -> Result<Option<InvoiceRow>, DataError>;

    /// List invoices with filters and pagination
    async fn list_invoices(
        &self,
        params: &ListInvoicesParams,
    ) -> Result<(Vec<InvoiceRow>, u64), DataError>;

    /// Apply a partial update to an invoice
    async fn update_invoice(
        &self,
        id: &str,
        update: &InvoiceUpdate,
    ) -> Result<Option<InvoiceRow>, DataError>;

    /// Flip the invoice archive flag
    async fn set_invoice_archived(&self, id: &str, archived: bool) -> Result<bool, DataError>;

    // ==================== Invoice Item Operations ====================

    /// Create an item linked to an invoice
    async fn create_invoice_item(
        &self,
        invoice_id: &str,
        data: &NewInvoiceItem,
    ) -> Result<InvoiceItemRow, DataError>;

    /// Get an item by ID
    async fn get_invoice_item(&self, id: &str) -> Result<Option<InvoiceItemRow>, DataError>;

    /// List all items of an invoice
    async fn list_invoice_items(
        &self,
        invoice_id: &str,
    ) -> Result<Vec<InvoiceItemRow>, DataError>;

    /// Apply a partial update to an item
    async fn update_invoice_item(
        &self,
        id: &str,
        update: &InvoiceItemUpdate,
    ) -> Result<Option<InvoiceItemRow>, DataError>;

    /// Hard-delete an item
    async fn delete_invoice_item(&self, id: &str) -> Result<bool, DataError>;

    /// Mirror the invoice archive flag onto all items of an invoice
    async fn set_invoice_items_archived(
        &self,
        invoice_id: &str,
        archived: bool,
    ) -> Result<u64, DataError>;
}
