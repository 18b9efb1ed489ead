//! Token principal and ownership resolution
//!
//! `OwnershipService` is the single module that answers every cross-entity
//! authorization question: it resolves the token principal to a durable user
//! record, then walks the tenancy chain (user -> company -> {customer,
//! invoice} -> invoice item). Checks run strictly in order; ownership is
//! always compared against the resolved user's id, never the token email.

use std::sync::Arc;

use crate::api::types::ApiError;
use crate::core::constants::{
    MSG_COMPANY_MODIFICATION_FORBIDDEN, MSG_COMPANY_NOT_FOUND, MSG_CUSTOMER_NOT_FOUND,
    MSG_INVOICE_ITEM_NOT_FOUND, MSG_INVOICE_MODIFICATION_FORBIDDEN, MSG_INVOICE_NOT_FOUND,
    MSG_USER_NOT_FOUND,
};
use crate::data::TransactionalService;
use crate::data::types::{CompanyRow, CustomerRow, InvoiceItemRow, InvoiceRow, UserRow};

/// Claims attached to the request by the auth middleware
#[derive(Debug, Clone)]
pub struct TokenPrincipal {
    pub email: String,
    pub user_id: String,
}

/// Ownership resolution service
#[derive(Clone)]
pub struct OwnershipService {
    database: Arc<TransactionalService>,
}

impl OwnershipService {
    pub fn new(database: Arc<TransactionalService>) -> Self {
        Self { database }
    }

    /// Resolve the token principal to a full user record.
    ///
    /// Token claims may be stale or partial; every guarded request re-reads
    /// the durable record by email before any ownership comparison.
    pub async fn resolve_user(&self, principal: &TokenPrincipal) -> Result<UserRow, ApiError> {
        self.database
            .repository()
            .get_user_by_email(&principal.email)
            .await
            .map_err(ApiError::from_data)?
            .ok_or_else(|| ApiError::unauthorized("USER_NOT_FOUND", MSG_USER_NOT_FOUND))
    }

    /// Verify the user owns a company and return it.
    ///
    /// A company that exists but belongs to someone else is Forbidden, not
    /// NotFound; the two outcomes are deliberately distinct.
    pub async fn verify_company_owner(
        &self,
        user: &UserRow,
        company_id: &str,
    ) -> Result<CompanyRow, ApiError> {
        let company = self
            .database
            .repository()
            .get_company(company_id)
            .await
            .map_err(ApiError::from_data)?
            .ok_or_else(|| ApiError::forbidden("COMPANY_NOT_FOUND", MSG_COMPANY_NOT_FOUND))?;

        if company.belongs_to != user.id {
            return Err(ApiError::forbidden(
                "COMPANY_MODIFICATION_FORBIDDEN",
                MSG_COMPANY_MODIFICATION_FORBIDDEN,
            ));
        }

        Ok(company)
    }

    /// Verify a customer is reachable through an owned company.
    ///
    /// The customer must be linked to the named company; a customer that
    /// exists but hangs off a different company reads as not found.
    pub async fn verify_customer_in_company(
        &self,
        user: &UserRow,
        customer_id: &str,
        company_id: &str,
    ) -> Result<(CompanyRow, CustomerRow), ApiError> {
        let company = self.verify_company_owner(user, company_id).await?;

        let repo = self.database.repository();
        let linked = repo
            .customer_belongs_to_company(customer_id, company_id)
            .await
            .map_err(ApiError::from_data)?;
        if !linked {
            return Err(ApiError::forbidden(
                "CUSTOMER_NOT_FOUND",
                MSG_CUSTOMER_NOT_FOUND,
            ));
        }

        let customer = repo
            .get_customer(customer_id)
            .await
            .map_err(ApiError::from_data)?
            .ok_or_else(|| ApiError::forbidden("CUSTOMER_NOT_FOUND", MSG_CUSTOMER_NOT_FOUND))?;

        Ok((company, customer))
    }

    /// Verify an invoice is reachable through an owned company named in the
    /// request path.
    pub async fn verify_invoice_in_company(
        &self,
        user: &UserRow,
        invoice_id: &str,
        company_id: &str,
    ) -> Result<InvoiceRow, ApiError> {
        let repo = self.database.repository();

        let company = repo
            .get_company(company_id)
            .await
            .map_err(ApiError::from_data)?
            .ok_or_else(|| ApiError::forbidden("COMPANY_NOT_FOUND", MSG_COMPANY_NOT_FOUND))?;

        let invoice = repo
            .get_invoice(invoice_id)
            .await
            .map_err(ApiError::from_data)?
            .ok_or_else(|| ApiError::forbidden("INVOICE_NOT_FOUND", MSG_INVOICE_NOT_FOUND))?;

        if company.belongs_to != user.id {
            return Err(ApiError::forbidden(
                "COMPANY_MODIFICATION_FORBIDDEN",
                MSG_COMPANY_MODIFICATION_FORBIDDEN,
            ));
        }

        // Invoice exists but is not linked to the named company
        if invoice.company_id != company_id {
            return Err(ApiError::forbidden(
                "INVOICE_MODIFICATION_FORBIDDEN",
                MSG_INVOICE_MODIFICATION_FORBIDDEN,
            ));
        }

        Ok(invoice)
    }

    /// Verify an invoice through its own company (routes without an explicit
    /// company path parameter).
    pub async fn verify_invoice_owner(
        &self,
        user: &UserRow,
        invoice_id: &str,
    ) -> Result<InvoiceRow, ApiError> {
        let repo = self.database.repository();

        let invoice = repo
            .get_invoice(invoice_id)
            .await
            .map_err(ApiError::from_data)?
            .ok_or_else(|| ApiError::forbidden("INVOICE_NOT_FOUND", MSG_INVOICE_NOT_FOUND))?;

        let company = repo
            .get_company(&invoice.company_id)
            .await
            .map_err(ApiError::from_data)?
            .ok_or_else(|| ApiError::forbidden("COMPANY_NOT_FOUND", MSG_COMPANY_NOT_FOUND))?;

        if company.belongs_to != user.id {
            return Err(ApiError::forbidden(
                "COMPANY_MODIFICATION_FORBIDDEN",
                MSG_COMPANY_MODIFICATION_FORBIDDEN,
            ));
        }

        Ok(invoice)
    }

    /// Verify an invoice item hangs off an owned invoice.
    pub async fn verify_item_in_invoice(
        &self,
        user: &UserRow,
        invoice_id: &str,
        item_id: &str,
    ) -> Result<(InvoiceRow, InvoiceItemRow), ApiError> {
        let invoice = self.verify_invoice_owner(user, invoice_id).await?;

        let item = self
            .database
            .repository()
            .get_invoice_item(item_id)
            .await
            .map_err(ApiError::from_data)?
            .ok_or_else(|| {
                ApiError::forbidden("INVOICE_ITEM_NOT_FOUND", MSG_INVOICE_ITEM_NOT_FOUND)
            })?;

        // Item exists but belongs to a different invoice
        if item.invoice_id != invoice_id {
            return Err(ApiError::forbidden(
                "INVOICE_ITEM_NOT_FOUND",
                MSG_INVOICE_ITEM_NOT_FOUND,
            ));
        }

        Ok((invoice, item))
    }
}
