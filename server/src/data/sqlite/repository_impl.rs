//! TransactionalRepository trait implementation for SQLite
//!
//! Implements the trait for `Arc<SqliteService>`, delegating to the
//! per-entity repository modules.

use std::sync::Arc;

use async_trait::async_trait;

use crate::data::error::DataError;
use crate::data::traits::TransactionalRepository;
use crate::data::types::{
    CompanyRow, CompanyUpdate, CustomerRow, CustomerUpdate, InvoiceItemRow, InvoiceItemUpdate,
    InvoiceRow, InvoiceUpdate, ListInvoicesParams, NewCompany, NewCustomer, NewInvoice,
    NewInvoiceItem, OtpRow, RefreshTokenRow, UserRow, UserUpdate,
};

use super::SqliteService;
use super::repositories::{company, customer, invoice, invoice_item, otp, refresh_token, user};

#[async_trait]
impl TransactionalRepository for Arc<SqliteService> {
    // ==================== User Operations ====================

    async fn create_temporary_user(&self, email: &str) -> Result<UserRow, DataError> {
        user::create_temporary_user(self.pool(), email)
            .await
            .map_err(Into::into)
    }

    async fn get_user(&self, id: &str) -> Result<Option<UserRow>, DataError> {
        user::get_user(self.pool(), id).await.map_err(Into::into)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>, DataError> {
        user::get_by_email(self.pool(), email)
            .await
            .map_err(Into::into)
    }

    async fn owned_company_ids(&self, user_id: &str) -> Result<Vec<String>, DataError> {
        user::owned_company_ids(self.pool(), user_id)
            .await
            .map_err(Into::into)
    }

    async fn update_user(
        &self,
        id: &str,
        update: &UserUpdate,
    ) -> Result<Option<UserRow>, DataError> {
        user::update_user(self.pool(), id, update)
            .await
            .map_err(Into::into)
    }

    async fn delete_user(&self, id: &str) -> Result<bool, DataError> {
        user::delete_user(self.pool(), id).await.map_err(Into::into)
    }

    // ==================== OTP Operations ====================

    async fn upsert_otp(
        &self,
        email: &str,
        otp_code: &str,
        expires_at: i64,
    ) -> Result<(), DataError> {
        otp::upsert_otp(self.pool(), email, otp_code, expires_at)
            .await
            .map_err(Into::into)
    }

    async fn get_otp(&self, email: &str) -> Result<Option<OtpRow>, DataError> {
        otp::get_otp(self.pool(), email).await.map_err(Into::into)
    }

    async fn clear_otp(&self, email: &str) -> Result<(), DataError> {
        otp::clear_otp(self.pool(), email).await.map_err(Into::into)
    }

    // ==================== Refresh Token Operations ====================

    async fn insert_refresh_token(
        &self,
        token: &str,
        user_email: &str,
        expires_at: i64,
    ) -> Result<RefreshTokenRow, DataError> {
        refresh_token::insert_refresh_token(self.pool(), token, user_email, expires_at)
            .await
            .map_err(Into::into)
    }

    async fn get_refresh_token(
        &self,
        token: &str,
        user_email: &str,
    ) -> Result<Option<RefreshTokenRow>, DataError> {
        refresh_token::get_refresh_token(self.pool(), token, user_email)
            .await
            .map_err(Into::into)
    }

    async fn delete_refresh_token(
        &self,
        token: &str,
        user_email: &str,
    ) -> Result<bool, DataError> {
        refresh_token::delete_refresh_token(self.pool(), token, user_email)
            .await
            .map_err(Into::into)
    }

    // ==================== Company Operations ====================

    async fn create_company(
        &self,
        data: &NewCompany,
        owner_user_id: &str,
    ) -> Result<CompanyRow, DataError> {
        company::create_company(self.pool(), data, owner_user_id)
            .await
            .map_err(Into::into)
    }

    async fn get_company(&self, id: &str) -> Result<Option<CompanyRow>, DataError> {
        company::get_company(self.pool(), id)
            .await
            .map_err(Into::into)
    }

    async fn company_exists_for_owner(
        &self,
        name: &str,
        owner_user_id: &str,
    ) -> Result<bool, DataError> {
        company::exists_for_owner(self.pool(), name, owner_user_id)
            .await
            .map_err(Into::into)
    }

    async fn list_companies(
        &self,
        owner_user_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<CompanyRow>, u64), DataError> {
        company::list_companies(self.pool(), owner_user_id, page, limit)
            .await
            .map_err(Into::into)
    }

    async fn update_company(
        &self,
        id: &str,
        update: &CompanyUpdate,
    ) -> Result<Option<CompanyRow>, DataError> {
        company::update_company(self.pool(), id, update)
            .await
            .map_err(Into::into)
    }

    async fn delete_company(&self, id: &str) -> Result<bool, DataError> {
        company::delete_company(self.pool(), id)
            .await
            .map_err(Into::into)
    }

    // ==================== Customer Operations ====================

    async fn create_customer_for_company(
        &self,
        data: &NewCustomer,
        company_id: &str,
    ) -> Result<CustomerRow, DataError> {
        customer::create_customer_for_company(self.pool(), data, company_id)
            .await
            .map_err(Into::into)
    }

    async fn get_customer(&self, id: &str) -> Result<Option<CustomerRow>, DataError> {
        customer::get_customer(self.pool(), id)
            .await
            .map_err(Into::into)
    }

    async fn find_customer_by_identity(
        &self,
        name: &str,
        email: &str,
    ) -> Result<Option<CustomerRow>, DataError> {
        customer::find_by_identity(self.pool(), name, email)
            .await
            .map_err(Into::into)
    }

    async fn customer_belongs_to_company(
        &self,
        customer_id: &str,
        company_id: &str,
    ) -> Result<bool, DataError> {
        customer::belongs_to_company(self.pool(), customer_id, company_id)
            .await
            .map_err(Into::into)
    }

    async fn link_customer_to_company(
        &self,
        customer_id: &str,
        company_id: &str,
    ) -> Result<(), DataError> {
        customer::link_to_company(self.pool(), customer_id, company_id)
            .await
            .map_err(Into::into)
    }

    async fn unlink_customer_from_company(
        &self,
        customer_id: &str,
        company_id: &str,
    ) -> Result<bool, DataError> {
        customer::unlink_from_company(self.pool(), customer_id, company_id)
            .await
            .map_err(Into::into)
    }

    async fn list_customers_for_company(
        &self,
        company_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<CustomerRow>, u64), DataError> {
        customer::list_for_company(self.pool(), company_id, page, limit)
            .await
            .map_err(Into::into)
    }

    async fn customer_company_ids(&self, customer_id: &str) -> Result<Vec<String>, DataError> {
        customer::company_ids(self.pool(), customer_id)
            .await
            .map_err(Into::into)
    }

    async fn update_customer(
        &self,
        id: &str,
        update: &CustomerUpdate,
    ) -> Result<Option<CustomerRow>, DataError> {
        customer::update_customer(self.pool(), id, update)
            .await
            .map_err(Into::into)
    }

    // ==================== Invoice Operations ====================

    async fn create_invoice(&self, data: &NewInvoice) -> Result<InvoiceRow, DataError> {
        invoice::create_invoice(self.pool(), data)
            .await
            .map_err(Into::into)
    }

    async fn get_invoice(&self, id: &str) -> Result<Option<InvoiceRow>, DataError> {
        invoice::get_invoice(self.pool(), id)
            .await
            .map_err(Into::into)
    }

    async fn list_invoices(
        &self,
        params: &ListInvoicesParams,
    ) -> Result<(Vec<InvoiceRow>, u64), DataError> {
        invoice::list_invoices(self.pool(), params)
            .await
            .map_err(Into::into)
    }

    async fn update_invoice(
        &self,
        id: &str,
        update: &InvoiceUpdate,
    ) -> Result<Option<InvoiceRow>, DataError> {
        invoice::update_invoice(self.pool(), id, update)
            .await
            .map_err(Into::into)
    }

    async fn set_invoice_archived(&self, id: &str, archived: bool) -> Result<bool, DataError> {
        invoice::set_archived(self.pool(), id, archived)
            .await
            .map_err(Into::into)
    }

    // ==================== Invoice Item Operations ====================

    async fn create_invoice_item(
        &self,
        invoice_id: &str,
        data: &NewInvoiceItem,
    ) -> Result<InvoiceItemRow, DataError> {
        invoice_item::create_item(self.pool(), invoice_id, data)
            .await
            .map_err(Into::into)
    }

    async fn get_invoice_item(&self, id: &str) -> Result<Option<InvoiceItemRow>, DataError> {
        invoice_item::get_item(self.pool(), id)
            .await
            .map_err(Into::into)
    }

    async fn list_invoice_items(
        &self,
        invoice_id: &str,
    ) -> Result<Vec<InvoiceItemRow>, DataError> {
        invoice_item::list_for_invoice(self.pool(), invoice_id)
            .await
            .map_err(Into::into)
    }

    async fn update_invoice_item(
        &self,
        id: &str,
        update: &InvoiceItemUpdate,
    ) -> Result<Option<InvoiceItemRow>, DataError> {
        invoice_item::update_item(self.pool(), id, update)
            .await
            .map_err(Into::into)
    }

    async fn delete_invoice_item(&self, id: &str) -> Result<bool, DataError> {
        invoice_item::delete_item(self.pool(), id)
            .await
            .map_err(Into::into)
    }

    async fn set_invoice_items_archived(
        &self,
        invoice_id: &str,
        archived: bool,
    ) -> Result<u64, DataError> {
        invoice_item::set_archived_for_invoice(self.pool(), invoice_id, archived)
            .await
            .map_err(Into::into)
    }
}
