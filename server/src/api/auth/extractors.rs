//! Authorization extractors for axum handlers
//!
//! Each extractor is one link of the ownership guard chain: it resolves the
//! authenticated principal to a full user record, then walks the resource
//! hierarchy for its path shape. Evaluation short-circuits on the first
//! failure, and handlers only run once the whole chain has passed.
//!
//! ```no_run
//! # use quickbill_server::api::auth::CompanyAccess;
//! # use quickbill_server::api::types::ApiError;
//! pub async fn update_company(access: CompanyAccess) -> Result<(), ApiError> {
//!     // access.company is owned by access.user; nothing else reaches here
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use serde::Deserialize;

use super::context::{OwnershipService, TokenPrincipal};
use crate::api::extractors::is_valid_id;
use crate::api::types::ApiError;
use crate::core::constants::{
    MSG_COMPANY_ID_REQUIRED, MSG_COMPANY_NOT_FOUND, MSG_CUSTOMER_NOT_FOUND,
    MSG_INVOICE_ID_REQUIRED, MSG_INVOICE_ITEM_NOT_FOUND, MSG_INVOICE_NOT_FOUND,
};
use crate::data::types::{CompanyRow, CustomerRow, InvoiceItemRow, InvoiceRow, UserRow};

/// Rejection type for auth extractors
pub enum AuthRejection {
    /// Authorization failed
    Auth(ApiError),
    /// Auth context not available (middleware not applied)
    MissingContext,
}

impl From<ApiError> for AuthRejection {
    fn from(e: ApiError) -> Self {
        Self::Auth(e)
    }
}

impl axum::response::IntoResponse for AuthRejection {
    fn into_response(self) -> axum::response::Response {
        match self {
            Self::Auth(e) => e.into_response(),
            Self::MissingContext => {
                ApiError::internal("Auth context not available").into_response()
            }
        }
    }
}

/// Extract the token principal and ownership service from request extensions
fn extract_auth(parts: &Parts) -> Result<(TokenPrincipal, Arc<OwnershipService>), AuthRejection> {
    let principal = parts
        .extensions
        .get::<TokenPrincipal>()
        .cloned()
        .ok_or(AuthRejection::MissingContext)?;

    let ownership = parts
        .extensions
        .get::<Arc<OwnershipService>>()
        .cloned()
        .ok_or(AuthRejection::MissingContext)?;

    Ok((principal, ownership))
}

// ============================================================================
// Identity Guard
// ============================================================================

/// Authenticated user, re-resolved from storage.
///
/// The identity guard: token claims alone are never trusted for ownership
/// decisions, so the principal is resolved to its durable record here.
pub struct CurrentUser {
    pub user: UserRow,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let (principal, ownership) = extract_auth(parts)?;
        let user = ownership.resolve_user(&principal).await?;
        Ok(Self { user })
    }
}

// ============================================================================
// Company Access (path `{id}`)
// ============================================================================

#[derive(Deserialize)]
struct CompanyParams {
    id: String,
}

/// Verified company access for `/companies/{id}` routes
pub struct CompanyAccess {
    pub company: CompanyRow,
    pub user: UserRow,
}

impl<S> FromRequestParts<S> for CompanyAccess
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<CompanyParams>::from_request_parts(parts, state)
            .await
            .map_err(|_| {
                AuthRejection::Auth(ApiError::forbidden(
                    "COMPANY_ID_REQUIRED",
                    MSG_COMPANY_ID_REQUIRED,
                ))
            })?;

        if !is_valid_id(&params.id) {
            return Err(AuthRejection::Auth(ApiError::forbidden(
                "COMPANY_NOT_FOUND",
                MSG_COMPANY_NOT_FOUND,
            )));
        }

        let (principal, ownership) = extract_auth(parts)?;
        let user = ownership.resolve_user(&principal).await?;
        let company = ownership.verify_company_owner(&user, &params.id).await?;

        Ok(Self { company, user })
    }
}

// ============================================================================
// Customer Access (path `{customer_id}` + `{company_id}`)
// ============================================================================

#[derive(Deserialize)]
struct CustomerParams {
    customer_id: String,
    company_id: String,
}

/// Verified customer-under-company access
pub struct CustomerAccess {
    pub customer: CustomerRow,
    pub company: CompanyRow,
    pub user: UserRow,
}

impl<S> FromRequestParts<S> for CustomerAccess
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<CustomerParams>::from_request_parts(parts, state)
            .await
            .map_err(|_| {
                AuthRejection::Auth(ApiError::forbidden(
                    "COMPANY_ID_REQUIRED",
                    MSG_COMPANY_ID_REQUIRED,
                ))
            })?;

        if !is_valid_id(&params.company_id) {
            return Err(AuthRejection::Auth(ApiError::forbidden(
                "COMPANY_NOT_FOUND",
                MSG_COMPANY_NOT_FOUND,
            )));
        }
        if !is_valid_id(&params.customer_id) {
            return Err(AuthRejection::Auth(ApiError::forbidden(
                "CUSTOMER_NOT_FOUND",
                MSG_CUSTOMER_NOT_FOUND,
            )));
        }

        let (principal, ownership) = extract_auth(parts)?;
        let user = ownership.resolve_user(&principal).await?;
        let (company, customer) = ownership
            .verify_customer_in_company(&user, &params.customer_id, &params.company_id)
            .await?;

        Ok(Self {
            customer,
            company,
            user,
        })
    }
}

// ============================================================================
// Invoice Access (path `{invoice_id}` + `{company_id}`)
// ============================================================================

#[derive(Deserialize)]
struct InvoiceParams {
    invoice_id: String,
    company_id: String,
}

/// Verified invoice-under-company access
pub struct InvoiceAccess {
    pub invoice: InvoiceRow,
    pub user: UserRow,
}

impl<S> FromRequestParts<S> for InvoiceAccess
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<InvoiceParams>::from_request_parts(parts, state)
            .await
            .map_err(|_| {
                AuthRejection::Auth(ApiError::forbidden(
                    "COMPANY_ID_REQUIRED",
                    MSG_COMPANY_ID_REQUIRED,
                ))
            })?;

        if !is_valid_id(&params.company_id) {
            return Err(AuthRejection::Auth(ApiError::forbidden(
                "COMPANY_NOT_FOUND",
                MSG_COMPANY_NOT_FOUND,
            )));
        }
        if !is_valid_id(&params.invoice_id) {
            return Err(AuthRejection::Auth(ApiError::forbidden(
                "INVOICE_NOT_FOUND",
                MSG_INVOICE_NOT_FOUND,
            )));
        }

        let (principal, ownership) = extract_auth(parts)?;
        let user = ownership.resolve_user(&principal).await?;
        let invoice = ownership
            .verify_invoice_in_company(&user, &params.invoice_id, &params.company_id)
            .await?;

        Ok(Self { invoice, user })
    }
}

// ============================================================================
// Invoice Owned (path `{invoice_id}` only)
// ============================================================================

#[derive(Deserialize)]
struct InvoiceIdParams {
    invoice_id: String,
}

/// Verified invoice access resolved through the invoice's own company
pub struct InvoiceOwned {
    pub invoice: InvoiceRow,
    pub user: UserRow,
}

impl<S> FromRequestParts<S> for InvoiceOwned
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<InvoiceIdParams>::from_request_parts(parts, state)
            .await
            .map_err(|_| {
                AuthRejection::Auth(ApiError::forbidden(
                    "INVOICE_ID_REQUIRED",
                    MSG_INVOICE_ID_REQUIRED,
                ))
            })?;

        if !is_valid_id(&params.invoice_id) {
            return Err(AuthRejection::Auth(ApiError::forbidden(
                "INVOICE_NOT_FOUND",
                MSG_INVOICE_NOT_FOUND,
            )));
        }

        let (principal, ownership) = extract_auth(parts)?;
        let user = ownership.resolve_user(&principal).await?;
        let invoice = ownership
            .verify_invoice_owner(&user, &params.invoice_id)
            .await?;

        Ok(Self { invoice, user })
    }
}

// ============================================================================
// Invoice Item Access (path `{invoice_id}` + `{item_id}`)
// ============================================================================

#[derive(Deserialize)]
struct InvoiceItemParams {
    invoice_id: String,
    item_id: String,
}

/// Verified item-under-invoice access
pub struct InvoiceItemAccess {
    pub item: InvoiceItemRow,
    pub invoice: InvoiceRow,
    pub user: UserRow,
}

impl<S> FromRequestParts<S> for InvoiceItemAccess
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<InvoiceItemParams>::from_request_parts(parts, state)
            .await
            .map_err(|_| {
                AuthRejection::Auth(ApiError::forbidden(
                    "INVOICE_ID_REQUIRED",
                    MSG_INVOICE_ID_REQUIRED,
                ))
            })?;

        if !is_valid_id(&params.invoice_id) {
            return Err(AuthRejection::Auth(ApiError::forbidden(
                "INVOICE_NOT_FOUND",
                MSG_INVOICE_NOT_FOUND,
            )));
        }
        if !is_valid_id(&params.item_id) {
            return Err(AuthRejection::Auth(ApiError::forbidden(
                "INVOICE_ITEM_NOT_FOUND",
                MSG_INVOICE_ITEM_NOT_FOUND,
            )));
        }

        let (principal, ownership) = extract_auth(parts)?;
        let user = ownership.resolve_user(&principal).await?;
        let (invoice, item) = ownership
            .verify_item_in_invoice(&user, &params.invoice_id, &params.item_id)
            .await?;

        Ok(Self {
            item,
            invoice,
            user,
        })
    }
}
