//! Invoice API endpoints
//!
//! Invoices belong to exactly one company and one customer. Deleting an
//! invoice archives it (items included); restore reverses the archive.
//! Listings are scoped to the caller's owned companies.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use validator::Validate;

use super::invoice_items::{CreateInvoiceItemRequest, InvoiceItemDto};
use crate::api::auth::{CurrentUser, InvoiceAccess, InvoiceOwned};
use crate::api::extractors::{ValidatedJson, ValidatedQuery};
use crate::api::types::{ApiError, PaginatedResponse, default_limit, default_page};
use crate::core::constants::{
    MSG_COMPANY_MODIFICATION_FORBIDDEN, MSG_COMPANY_NOT_FOUND, MSG_CUSTOMER_NOT_FOUND,
    MSG_INVOICE_NOT_FOUND,
};
use crate::data::TransactionalService;
use crate::data::traits::TransactionalRepository;
use crate::data::types::{
    InvoiceItemUpdate, InvoiceRow, InvoiceSortBy, InvoiceUpdate, ListInvoicesParams, NewInvoice,
    NewInvoiceItem, SortOrder,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDto {
    pub id: String,
    pub invoice_number: String,
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<InvoiceItemDto>>,
}

impl InvoiceDto {
    fn new(row: InvoiceRow, items: Option<Vec<InvoiceItemDto>>) -> Self {
        Self {
            id: row.id,
            invoice_number: row.invoice_number,
            date: row.date,
            sub_total: row.sub_total,
            total_amount: row.total_amount,
            vat: row.vat,
            currency: row.currency,
            is_archived: row.is_archived,
            mark_as_draft: row.mark_as_draft,
            company_id: row.company_id,
            customer_id: row.customer_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            items,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    #[validate(length(min = 1, message = "Invoice number cannot be empty"))]
    pub invoice_number: String,
    #[validate(length(min = 1, message = "Date is required"))]
    pub date: String,
    pub sub_total: f64,
    pub total_amount: f64,
    pub vat: f64,
    #[validate(length(min = 1, message = "Currency is required"))]
    pub currency: String,
    #[serde(default)]
    pub mark_as_draft: bool,
    #[validate(length(min = 1, message = "Company ID is required"))]
    pub company_id: String,
    #[validate(length(min = 1, message = "Customer ID is required"))]
    pub customer_id: String,
    #[validate(nested)]
    pub items: Vec<CreateInvoiceItemRequest>,
}

/// Item entry inside an invoice update: with an id it updates the existing
/// item, without one it creates a new item. Items absent from the list are
/// deleted.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoiceItemEntry {
    pub id: Option<String>,
    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: String,
    pub unit_price: f64,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i64,
    pub total_price: f64,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoiceRequest {
    #[validate(length(min = 1, message = "Invoice number cannot be empty"))]
    pub invoice_number: Option<String>,
    #[validate(length(min = 1, message = "Date is required"))]
    pub date: Option<String>,
    pub sub_total: Option<f64>,
    pub total_amount: Option<f64>,
    pub vat: Option<f64>,
    #[validate(length(min = 1, message = "Currency is required"))]
    pub currency: Option<String>,
    pub mark_as_draft: Option<bool>,
    #[validate(nested)]
    pub items: Option<Vec<UpdateInvoiceItemEntry>>,
}

impl UpdateInvoiceRequest {
    fn ensure_has_updates(&self) -> Result<(), ApiError> {
        let has_any = self.invoice_number.is_some()
            || self.date.is_some()
            || self.sub_total.is_some()
            || self.total_amount.is_some()
            || self.vat.is_some()
            || self.currency.is_some()
            || self.mark_as_draft.is_some()
            || self.items.is_some();
        if !has_any {
            return Err(ApiError::bad_request(
                "EMPTY_UPDATE",
                "No properties provided for update.",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListInvoicesQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, max = 10_000))]
    pub page: u32,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: u32,
    pub company_id: Option<String>,
    pub customer_id: Option<String>,
    pub archived: Option<bool>,
    pub draft: Option<bool>,
    pub currency: Option<String>,
    #[serde(default)]
    pub sort_by: InvoiceSortBy,
    #[serde(default)]
    pub order: SortOrder,
}

/// Build invoice routes (behind the auth middleware)
pub fn routes(database: Arc<TransactionalService>) -> Router {
    Router::new()
        .route("/invoices", get(list_invoices).post(create_invoice))
        .route("/invoices/{invoice_id}", get(get_invoice).delete(delete_invoice))
        .route(
            "/invoices/{invoice_id}/companies/{company_id}",
            axum::routing::patch(update_invoice),
        )
        .route("/invoices/{invoice_id}/restore", post(restore_invoice))
        .with_state(database)
}

/// Create an invoice (with its items) for an owned company.
///
/// The named customer must exist and be linked to the company.
pub async fn create_invoice(
    State(database): State<Arc<TransactionalService>>,
    current: CurrentUser,
    ValidatedJson(request): ValidatedJson<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let repo = database.repository();

    let company = repo
        .get_company(&request.company_id)
        .await
        .map_err(ApiError::from_data)?
        .ok_or_else(|| ApiError::bad_request("COMPANY_NOT_FOUND", MSG_COMPANY_NOT_FOUND))?;
    if company.belongs_to != current.user.id {
        return Err(ApiError::forbidden(
            "COMPANY_MODIFICATION_FORBIDDEN",
            MSG_COMPANY_MODIFICATION_FORBIDDEN,
        ));
    }

    let customer_linked = repo
        .customer_belongs_to_company(&request.customer_id, &request.company_id)
        .await
        .map_err(ApiError::from_data)?;
    if !customer_linked {
        return Err(ApiError::bad_request(
            "CUSTOMER_NOT_FOUND",
            MSG_CUSTOMER_NOT_FOUND,
        ));
    }

    let data = NewInvoice {
        invoice_number: request.invoice_number,
        date: request.date,
        sub_total: request.sub_total,
        total_amount: request.total_amount,
        vat: request.vat,
        currency: request.currency,
        mark_as_draft: request.mark_as_draft,
        company_id: request.company_id,
        customer_id: request.customer_id,
    };

    let invoice = repo
        .create_invoice(&data)
        .await
        .map_err(ApiError::from_data)?;

    for item in request.items {
        repo.create_invoice_item(&invoice.id, &item.into_new_item())
            .await
            .map_err(ApiError::from_data)?;
    }

    Ok((StatusCode::CREATED, Json(json!({ "id": invoice.id }))))
}

/// Paginated invoice listing with filters, scoped to owned companies
pub async fn list_invoices(
    State(database): State<Arc<TransactionalService>>,
    current: CurrentUser,
    ValidatedQuery(query): ValidatedQuery<ListInvoicesQuery>,
) -> Result<Json<PaginatedResponse<InvoiceDto>>, ApiError> {
    let repo = database.repository();

    // An explicit company filter must still name an owned company
    if let Some(company_id) = &query.company_id {
        let company = repo
            .get_company(company_id)
            .await
            .map_err(ApiError::from_data)?
            .ok_or_else(|| ApiError::forbidden("COMPANY_NOT_FOUND", MSG_COMPANY_NOT_FOUND))?;
        if company.belongs_to != current.user.id {
            return Err(ApiError::forbidden(
                "COMPANY_MODIFICATION_FORBIDDEN",
                MSG_COMPANY_MODIFICATION_FORBIDDEN,
            ));
        }
    }

    let params = ListInvoicesParams {
        owner_user_id: current.user.id.clone(),
        company_id: query.company_id,
        customer_id: query.customer_id,
        archived: query.archived.unwrap_or(false),
        draft: query.draft,
        currency: query.currency,
        sort_by: query.sort_by,
        order: query.order,
        page: query.page,
        limit: query.limit,
    };

    let (invoices, total) = repo
        .list_invoices(&params)
        .await
        .map_err(ApiError::from_data)?;

    let items = invoices
        .into_iter()
        .map(|row| InvoiceDto::new(row, None))
        .collect();
    Ok(Json(PaginatedResponse::new(
        items,
        params.page,
        params.limit,
        total,
    )))
}

/// Invoice details with items
pub async fn get_invoice(
    State(database): State<Arc<TransactionalService>>,
    access: InvoiceOwned,
) -> Result<Json<InvoiceDto>, ApiError> {
    let items = database
        .repository()
        .list_invoice_items(&access.invoice.id)
        .await
        .map_err(ApiError::from_data)?;

    let items = items.into_iter().map(InvoiceItemDto::from).collect();
    Ok(Json(InvoiceDto::new(access.invoice, Some(items))))
}

/// Reconcile the invoice's item set against the submitted entries
async fn reconcile_items(
    repo: &dyn TransactionalRepository,
    invoice_id: &str,
    entries: Vec<UpdateInvoiceItemEntry>,
) -> Result<(), ApiError> {
    let existing = repo
        .list_invoice_items(invoice_id)
        .await
        .map_err(ApiError::from_data)?;

    let mut kept_ids: Vec<String> = Vec::with_capacity(entries.len());

    for entry in entries {
        match entry.id {
            Some(id) => {
                // Ignore ids that do not belong to this invoice
                if !existing.iter().any(|item| item.id == id) {
                    continue;
                }
                let update = InvoiceItemUpdate {
                    description: Some(entry.description),
                    unit_price: Some(entry.unit_price),
                    quantity: Some(entry.quantity),
                    total_price: Some(entry.total_price),
                };
                repo.update_invoice_item(&id, &update)
                    .await
                    .map_err(ApiError::from_data)?;
                kept_ids.push(id);
            }
            None => {
                let created = repo
                    .create_invoice_item(
                        invoice_id,
                        &NewInvoiceItem {
                            description: entry.description,
                            unit_price: entry.unit_price,
                            quantity: entry.quantity,
                            total_price: entry.total_price,
                        },
                    )
                    .await
                    .map_err(ApiError::from_data)?;
                kept_ids.push(created.id);
            }
        }
    }

    for item in existing {
        if !kept_ids.contains(&item.id) {
            repo.delete_invoice_item(&item.id)
                .await
                .map_err(ApiError::from_data)?;
        }
    }

    Ok(())
}

/// Update an invoice and, when submitted, its item set
pub async fn update_invoice(
    State(database): State<Arc<TransactionalService>>,
    access: InvoiceAccess,
    ValidatedJson(request): ValidatedJson<UpdateInvoiceRequest>,
) -> Result<Json<Value>, ApiError> {
    request.ensure_has_updates()?;
    let repo = database.repository();

    let update = InvoiceUpdate {
        invoice_number: request.invoice_number,
        date: request.date,
        sub_total: request.sub_total,
        total_amount: request.total_amount,
        vat: request.vat,
        currency: request.currency,
        mark_as_draft: request.mark_as_draft,
    };

    let invoice = repo
        .update_invoice(&access.invoice.id, &update)
        .await
        .map_err(ApiError::from_data)?
        .ok_or_else(|| ApiError::not_found("INVOICE_NOT_FOUND", MSG_INVOICE_NOT_FOUND))?;

    if let Some(entries) = request.items {
        if !entries.is_empty() {
            reconcile_items(repo, &invoice.id, entries).await?;
        }
    }

    Ok(Json(json!({ "id": invoice.id })))
}

/// Soft-archive an invoice and its items
pub async fn delete_invoice(
    State(database): State<Arc<TransactionalService>>,
    access: InvoiceOwned,
) -> Result<Json<Value>, ApiError> {
    let repo = database.repository();

    repo.set_invoice_items_archived(&access.invoice.id, true)
        .await
        .map_err(ApiError::from_data)?;
    repo.set_invoice_archived(&access.invoice.id, true)
        .await
        .map_err(ApiError::from_data)?;

    Ok(Json(json!({ "id": access.invoice.id })))
}

/// Reverse a soft-archive
pub async fn restore_invoice(
    State(database): State<Arc<TransactionalService>>,
    access: InvoiceOwned,
) -> Result<Json<Value>, ApiError> {
    let repo = database.repository();

    repo.set_invoice_items_archived(&access.invoice.id, false)
        .await
        .map_err(ApiError::from_data)?;
    repo.set_invoice_archived(&access.invoice.id, false)
        .await
        .map_err(ApiError::from_data)?;

    Ok(Json(json!({ "id": access.invoice.id })))
}
