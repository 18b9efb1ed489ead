//! Customer API endpoints
//!
//! Customers hang off companies; every route here names the company scope
//! and runs through the customer ownership guard. Removing a customer from
//! a company only severs the association.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use validator::Validate;

use crate::api::auth::{CompanyAccess, CurrentUser, CustomerAccess};
use crate::api::extractors::{ValidatedJson, ValidatedQuery};
use crate::api::types::{ApiError, PageQuery, PaginatedResponse};
use crate::core::constants::{
    MSG_COMPANY_MODIFICATION_FORBIDDEN, MSG_COMPANY_NOT_FOUND,
    MSG_CUSTOMER_ALREADY_EXISTS_FOR_COMPANY,
};
use crate::data::TransactionalService;
use crate::data::types::{Address, CustomerRow, CustomerUpdate, NewCustomer};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDto {
    pub id: String,
    pub name: String,
    pub email: String,
    pub mobile: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_ids: Option<Vec<String>>,
}

impl CustomerDto {
    fn new(row: CustomerRow, company_ids: Option<Vec<String>>) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            mobile: row.mobile,
            phone: row.phone,
            address: row.address,
            company_ids,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    /// Company the customer is created for
    #[validate(length(min = 1, message = "Company ID is required"))]
    pub customer_of: String,
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    pub mobile: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "A valid email is required"))]
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
}

impl UpdateCustomerRequest {
    fn ensure_has_updates(&self) -> Result<(), ApiError> {
        let has_any = self.name.is_some()
            || self.email.is_some()
            || self.mobile.is_some()
            || self.phone.is_some()
            || self.address.is_some();
        if !has_any {
            return Err(ApiError::bad_request(
                "EMPTY_UPDATE",
                "No properties provided for update.",
            ));
        }
        Ok(())
    }
}

/// Build customer routes (behind the auth middleware)
pub fn routes(database: Arc<TransactionalService>) -> Router {
    Router::new()
        .route("/customers", post(create_customer))
        .route("/companies/{id}/customers", get(list_customers))
        .route(
            "/customers/{customer_id}/companies/{company_id}",
            get(get_customer)
                .patch(update_customer)
                .delete(remove_customer),
        )
        .with_state(database)
}

/// Paginated list of a company's customers
pub async fn list_customers(
    State(database): State<Arc<TransactionalService>>,
    access: CompanyAccess,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> Result<Json<PaginatedResponse<CustomerDto>>, ApiError> {
    let (customers, total) = database
        .repository()
        .list_customers_for_company(&access.company.id, query.page, query.limit)
        .await
        .map_err(ApiError::from_data)?;

    let items = customers
        .into_iter()
        .map(|row| CustomerDto::new(row, None))
        .collect();
    Ok(Json(PaginatedResponse::new(
        items,
        query.page,
        query.limit,
        total,
    )))
}

/// Customer details, including the companies it is linked to
pub async fn get_customer(
    State(database): State<Arc<TransactionalService>>,
    access: CustomerAccess,
) -> Result<Json<CustomerDto>, ApiError> {
    let company_ids = database
        .repository()
        .customer_company_ids(&access.customer.id)
        .await
        .map_err(ApiError::from_data)?;

    Ok(Json(CustomerDto::new(access.customer, Some(company_ids))))
}

/// Create a customer for a company the caller owns.
///
/// A (name, email) pair identifies a customer. If that customer already
/// exists it is linked to the named company instead of duplicated; already
/// linked is a conflict.
pub async fn create_customer(
    State(database): State<Arc<TransactionalService>>,
    current: CurrentUser,
    ValidatedJson(request): ValidatedJson<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let repo = database.repository();

    let company = repo
        .get_company(&request.customer_of)
        .await
        .map_err(ApiError::from_data)?
        .ok_or_else(|| ApiError::not_found("COMPANY_NOT_FOUND", MSG_COMPANY_NOT_FOUND))?;

    if company.belongs_to != current.user.id {
        return Err(ApiError::forbidden(
            "COMPANY_MODIFICATION_FORBIDDEN",
            MSG_COMPANY_MODIFICATION_FORBIDDEN,
        ));
    }

    if let Some(existing) = repo
        .find_customer_by_identity(&request.name, &request.email)
        .await
        .map_err(ApiError::from_data)?
    {
        let already_linked = repo
            .customer_belongs_to_company(&existing.id, &company.id)
            .await
            .map_err(ApiError::from_data)?;
        if already_linked {
            return Err(ApiError::conflict(
                "CUSTOMER_ALREADY_EXISTS_FOR_COMPANY",
                MSG_CUSTOMER_ALREADY_EXISTS_FOR_COMPANY,
            ));
        }

        repo.link_customer_to_company(&existing.id, &company.id)
            .await
            .map_err(ApiError::from_data)?;
        return Ok((StatusCode::CREATED, Json(json!({ "id": existing.id }))));
    }

    let data = NewCustomer {
        name: request.name,
        email: request.email,
        mobile: request.mobile,
        phone: request.phone,
        address: request.address,
    };

    let customer = repo
        .create_customer_for_company(&data, &company.id)
        .await
        .map_err(|e| {
            if e.is_conflict() {
                ApiError::conflict(
                    "CUSTOMER_ALREADY_EXISTS_FOR_COMPANY",
                    MSG_CUSTOMER_ALREADY_EXISTS_FOR_COMPANY,
                )
            } else {
                ApiError::from_data(e)
            }
        })?;

    Ok((StatusCode::CREATED, Json(json!({ "id": customer.id }))))
}

/// Update a customer
pub async fn update_customer(
    State(database): State<Arc<TransactionalService>>,
    access: CustomerAccess,
    ValidatedJson(request): ValidatedJson<UpdateCustomerRequest>,
) -> Result<Json<Value>, ApiError> {
    request.ensure_has_updates()?;

    let update = CustomerUpdate {
        name: request.name,
        email: request.email,
        mobile: request.mobile,
        phone: request.phone,
        address: request.address,
    };

    let customer = database
        .repository()
        .update_customer(&access.customer.id, &update)
        .await
        .map_err(ApiError::from_data)?
        .ok_or_else(|| {
            ApiError::not_found(
                "CUSTOMER_NOT_FOUND",
                crate::core::constants::MSG_CUSTOMER_NOT_FOUND,
            )
        })?;

    Ok(Json(json!({ "id": customer.id })))
}

/// Remove a customer from a company (the customer row survives)
pub async fn remove_customer(
    State(database): State<Arc<TransactionalService>>,
    access: CustomerAccess,
) -> Result<Json<Value>, ApiError> {
    database
        .repository()
        .unlink_customer_from_company(&access.customer.id, &access.company.id)
        .await
        .map_err(ApiError::from_data)?;

    Ok(Json(json!({
        "message": "Customer removed from company successfully"
    })))
}
