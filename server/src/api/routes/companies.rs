//! Company API endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use validator::Validate;

use crate::api::auth::{CompanyAccess, CurrentUser};
use crate::api::extractors::{ValidatedJson, ValidatedQuery};
use crate::api::types::{ApiError, PageQuery, PaginatedResponse};
use crate::core::constants::MSG_COMPANY_ALREADY_EXISTS;
use crate::data::TransactionalService;
use crate::data::types::{Address, CompanyRow, CompanyUpdate, NewCompany};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDto {
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
    pub belongs_to: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<CompanyRow> for CompanyDto {
    fn from(row: CompanyRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            website: row.website,
            phone: row.phone,
            mobile: row.mobile,
            email: row.email,
            image: row.image,
            industry: row.industry,
            registration_number: row.registration_number,
            address: row.address,
            belongs_to: row.belongs_to,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCompanyRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    pub image: Option<String>,
    pub industry: Option<String>,
    pub registration_number: Option<String>,
    pub address: Address,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCompanyRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    #[validate(email(message = "A valid email is required"))]
    pub email: Option<String>,
    pub image: Option<String>,
    pub industry: Option<String>,
    pub registration_number: Option<String>,
    pub address: Option<Address>,
}

impl UpdateCompanyRequest {
    fn ensure_has_updates(&self) -> Result<(), ApiError> {
        let has_any = self.name.is_some()
            || self.website.is_some()
            || self.phone.is_some()
            || self.mobile.is_some()
            || self.email.is_some()
            || self.image.is_some()
            || self.industry.is_some()
            || self.registration_number.is_some()
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

/// Build company routes (behind the auth middleware)
pub fn routes(database: Arc<TransactionalService>) -> Router {
    Router::new()
        .route("/companies", get(list_companies).post(create_company))
        .route(
            "/companies/{id}",
            get(get_company)
                .patch(update_company)
                .delete(delete_company),
        )
        .with_state(database)
}

/// Paginated list of the authenticated user's companies
pub async fn list_companies(
    State(database): State<Arc<TransactionalService>>,
    current: CurrentUser,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> Result<Json<PaginatedResponse<CompanyDto>>, ApiError> {
    let (companies, total) = database
        .repository()
        .list_companies(&current.user.id, query.page, query.limit)
        .await
        .map_err(ApiError::from_data)?;

    let items = companies.into_iter().map(CompanyDto::from).collect();
    Ok(Json(PaginatedResponse::new(
        items,
        query.page,
        query.limit,
        total,
    )))
}

/// Create a company owned by the authenticated user
pub async fn create_company(
    State(database): State<Arc<TransactionalService>>,
    current: CurrentUser,
    ValidatedJson(request): ValidatedJson<CreateCompanyRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let repo = database.repository();

    let duplicate = repo
        .company_exists_for_owner(&request.name, &current.user.id)
        .await
        .map_err(ApiError::from_data)?;
    if duplicate {
        return Err(ApiError::conflict(
            "COMPANY_ALREADY_EXISTS",
            MSG_COMPANY_ALREADY_EXISTS,
        ));
    }

    let data = NewCompany {
        name: request.name,
        website: request.website,
        phone: request.phone,
        mobile: request.mobile,
        email: request.email,
        image: request.image,
        industry: request.industry,
        registration_number: request.registration_number,
        address: request.address,
    };

    let company = repo
        .create_company(&data, &current.user.id)
        .await
        .map_err(|e| {
            // A concurrent create can still trip the unique (owner, name) index
            if e.is_conflict() {
                ApiError::conflict("COMPANY_ALREADY_EXISTS", MSG_COMPANY_ALREADY_EXISTS)
            } else {
                ApiError::from_data(e)
            }
        })?;

    Ok((StatusCode::CREATED, Json(json!({ "id": company.id }))))
}

/// Company details (ownership enforced by the guard)
pub async fn get_company(access: CompanyAccess) -> Json<CompanyDto> {
    Json(CompanyDto::from(access.company))
}

/// Update a company
pub async fn update_company(
    State(database): State<Arc<TransactionalService>>,
    access: CompanyAccess,
    ValidatedJson(request): ValidatedJson<UpdateCompanyRequest>,
) -> Result<Json<Value>, ApiError> {
    request.ensure_has_updates()?;

    let update = CompanyUpdate {
        name: request.name,
        website: request.website,
        phone: request.phone,
        mobile: request.mobile,
        email: request.email,
        image: request.image,
        industry: request.industry,
        registration_number: request.registration_number,
        address: request.address,
    };

    let company = database
        .repository()
        .update_company(&access.company.id, &update)
        .await
        .map_err(ApiError::from_data)?
        .ok_or_else(|| {
            ApiError::not_found("COMPANY_NOT_FOUND", crate::core::constants::MSG_COMPANY_NOT_FOUND)
        })?;

    Ok(Json(json!({ "id": company.id })))
}

/// Delete a company and its dependent records
pub async fn delete_company(
    State(database): State<Arc<TransactionalService>>,
    access: CompanyAccess,
) -> Result<StatusCode, ApiError> {
    database
        .repository()
        .delete_company(&access.company.id)
        .await
        .map_err(ApiError::from_data)?;

    Ok(StatusCode::NO_CONTENT)
}
