//! Invoice item API endpoints
//!
//! Items are always addressed through their invoice; the item guard walks
//! invoice -> company -> owner before any handler runs.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::auth::{InvoiceItemAccess, InvoiceOwned};
use crate::api::extractors::ValidatedJson;
use crate::api::types::ApiError;
use crate::data::TransactionalService;
use crate::data::types::{InvoiceItemRow, InvoiceItemUpdate, NewInvoiceItem};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItemDto {
    pub id: String,
    pub description: String,
    pub unit_price: f64,
    pub quantity: i64,
    pub total_price: f64,
    pub archived: bool,
    pub invoice_id: String,
}

impl From<InvoiceItemRow> for InvoiceItemDto {
    fn from(row: InvoiceItemRow) -> Self {
        Self {
            id: row.id,
            description: row.description,
            unit_price: row.unit_price,
            quantity: row.quantity,
            total_price: row.total_price,
            archived: row.archived,
            invoice_id: row.invoice_id,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceItemRequest {
    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: String,
    pub unit_price: f64,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i64,
    pub total_price: f64,
}

impl CreateInvoiceItemRequest {
    pub fn into_new_item(self) -> NewInvoiceItem {
        NewInvoiceItem {
            description: self.description,
            unit_price: self.unit_price,
            quantity: self.quantity,
            total_price: self.total_price,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoiceItemRequest {
    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: Option<String>,
    pub unit_price: Option<f64>,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: Option<i64>,
    pub total_price: Option<f64>,
}

impl UpdateInvoiceItemRequest {
    fn ensure_has_updates(&self) -> Result<(), ApiError> {
        let has_any = self.description.is_some()
            || self.unit_price.is_some()
            || self.quantity.is_some()
            || self.total_price.is_some();
        if !has_any {
            return Err(ApiError::bad_request(
                "EMPTY_UPDATE",
                "No properties provided for update.",
            ));
        }
        Ok(())
    }
}

/// Build invoice item routes (behind the auth middleware)
pub fn routes(database: Arc<TransactionalService>) -> Router {
    Router::new()
        .route(
            "/invoices/{invoice_id}/items",
            get(list_items).post(create_item),
        )
        .route(
            "/invoices/{invoice_id}/items/{item_id}",
            get(get_item).patch(update_item).delete(delete_item),
        )
        .with_state(database)
}

/// All items of an invoice
pub async fn list_items(
    State(database): State<Arc<TransactionalService>>,
    access: InvoiceOwned,
) -> Result<Json<Vec<InvoiceItemDto>>, ApiError> {
    let items = database
        .repository()
        .list_invoice_items(&access.invoice.id)
        .await
        .map_err(ApiError::from_data)?;

    Ok(Json(items.into_iter().map(InvoiceItemDto::from).collect()))
}

/// Add an item to an invoice
pub async fn create_item(
    State(database): State<Arc<TransactionalService>>,
    access: InvoiceOwned,
    ValidatedJson(request): ValidatedJson<CreateInvoiceItemRequest>,
) -> Result<(StatusCode, Json<InvoiceItemDto>), ApiError> {
    let item = database
        .repository()
        .create_invoice_item(&access.invoice.id, &request.into_new_item())
        .await
        .map_err(ApiError::from_data)?;

    Ok((StatusCode::CREATED, Json(InvoiceItemDto::from(item))))
}

/// Item details
pub async fn get_item(access: InvoiceItemAccess) -> Json<InvoiceItemDto> {
    Json(InvoiceItemDto::from(access.item))
}

/// Update an item
pub async fn update_item(
    State(database): State<Arc<TransactionalService>>,
    access: InvoiceItemAccess,
    ValidatedJson(request): ValidatedJson<UpdateInvoiceItemRequest>,
) -> Result<Json<InvoiceItemDto>, ApiError> {
    request.ensure_has_updates()?;

    let update = InvoiceItemUpdate {
        description: request.description,
        unit_price: request.unit_price,
        quantity: request.quantity,
        total_price: request.total_price,
    };

    let item = database
        .repository()
        .update_invoice_item(&access.item.id, &update)
        .await
        .map_err(ApiError::from_data)?
        .ok_or_else(|| {
            ApiError::not_found(
                "INVOICE_ITEM_NOT_FOUND",
                crate::core::constants::MSG_INVOICE_ITEM_NOT_FOUND,
            )
        })?;

    Ok(Json(InvoiceItemDto::from(item)))
}

/// Hard-delete an item
pub async fn delete_item(
    State(database): State<Arc<TransactionalService>>,
    access: InvoiceItemAccess,
) -> Result<StatusCode, ApiError> {
    database
        .repository()
        .delete_invoice_item(&access.item.id)
        .await
        .map_err(ApiError::from_data)?;

    Ok(StatusCode::NO_CONTENT)
}
