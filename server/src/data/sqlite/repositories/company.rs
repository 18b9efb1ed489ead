//! Company repository for SQLite operations

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::data::sqlite::SqliteError;
use crate::data::types::{Address, CompanyRow, CompanyUpdate, NewCompany};

const COMPANY_COLUMNS: &str = "id, name, website, phone, mobile, email, image, industry, \
     registration_number, address, belongs_to, created_at, updated_at";

type CompanyTuple = (
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    String,
    Option<String>,
    String,
    Option<String>,
    String,
    String,
    i64,
    i64,
);

fn decode_address(raw: &str) -> Result<Address, SqliteError> {
    serde_json::from_str(raw).map_err(|e| SqliteError::Decode(format!("company address: {}", e)))
}

fn map_row(row: CompanyTuple) -> Result<CompanyRow, SqliteError> {
    let (
        id,
        name,
        website,
        phone,
        mobile,
        email,
        image,
        industry,
        registration_number,
        address,
        belongs_to,
        created_at,
        updated_at,
    ) = row;

    Ok(CompanyRow {
        id,
        name,
        website,
        phone,
        mobile,
        email,
        image,
        industry,
        registration_number,
        address: decode_address(&address)?,
        belongs_to,
        created_at,
        updated_at,
    })
}

/// Create a company owned by a user
pub async fn create_company(
    pool: &SqlitePool,
    data: &NewCompany,
    owner_user_id: &str,
) -> Result<CompanyRow, SqliteError> {
    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().timestamp();
    let industry = data.industry.clone().unwrap_or_else(|| "none".to_string());
    let address = serde_json::to_string(&data.address)
        .map_err(|e| SqliteError::Decode(format!("company address: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO companies
            (id, name, website, phone, mobile, email, image, industry,
             registration_number, address, belongs_to, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&data.name)
    .bind(&data.website)
    .bind(&data.phone)
    .bind(&data.mobile)
    .bind(&data.email)
    .bind(&data.image)
    .bind(&industry)
    .bind(&data.registration_number)
    .bind(&address)
    .bind(owner_user_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(CompanyRow {
        id,
        name: data.name.clone(),
        website: data.website.clone(),
        phone: data.phone.clone(),
        mobile: data.mobile.clone(),
        email: data.email.clone(),
        image: data.image.clone(),
        industry,
        registration_number: data.registration_number.clone(),
        address: data.address.clone(),
        belongs_to: owner_user_id.to_string(),
        created_at: now,
        updated_at: now,
    })
}

/// Get a company by ID
pub async fn get_company(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<CompanyRow>, SqliteError> {
    let row = sqlx::query_as::<_, CompanyTuple>(&format!(
        "SELECT {COMPANY_COLUMNS} FROM companies WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(map_row).transpose()
}

/// Whether the owner already has a company with this name
pub async fn exists_for_owner(
    pool: &SqlitePool,
    name: &str,
    owner_user_id: &str,
) -> Result<bool, SqliteError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM companies WHERE name = ? AND belongs_to = ?")
            .bind(name)
            .bind(owner_user_id)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

/// List companies owned by a user, newest first, with the total count
pub async fn list_companies(
    pool: &SqlitePool,
    owner_user_id: &str,
    page: u32,
    limit: u32,
) -> Result<(Vec<CompanyRow>, u64), SqliteError> {
    let offset = (page.saturating_sub(1) as i64) * limit as i64;

    let rows = sqlx::query_as::<_, CompanyTuple>(&format!(
        "SELECT {COMPANY_COLUMNS} FROM companies WHERE belongs_to = ? \
         ORDER BY created_at DESC LIMIT ? OFFSET ?"
    ))
    .bind(owner_user_id)
    .bind(limit as i64)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM companies WHERE belongs_to = ?")
        .bind(owner_user_id)
        .fetch_one(pool)
        .await?;

    let companies = rows
        .into_iter()
        .map(map_row)
        .collect::<Result<Vec<_>, _>>()?;

    Ok((companies, total as u64))
}

/// Apply a partial update and return the updated row
pub async fn update_company(
    pool: &SqlitePool,
    id: &str,
    update: &CompanyUpdate,
) -> Result<Option<CompanyRow>, SqliteError> {
    let Some(existing) = get_company(pool, id).await? else {
        return Ok(None);
    };

    let merged = CompanyRow {
        id: existing.id,
        name: update.name.clone().unwrap_or(existing.name),
        website: update.website.clone().or(existing.website),
        phone: update.phone.clone().or(existing.phone),
        mobile: update.mobile.clone().or(existing.mobile),
        email: update.email.clone().unwrap_or(existing.email),
        image: update.image.clone().or(existing.image),
        industry: update.industry.clone().unwrap_or(existing.industry),
        registration_number: update
            .registration_number
            .clone()
            .or(existing.registration_number),
        address: update.address.clone().unwrap_or(existing.address),
        belongs_to: existing.belongs_to,
        created_at: existing.created_at,
        updated_at: chrono::Utc::now().timestamp(),
    };

    let address = serde_json::to_string(&merged.address)
        .map_err(|e| SqliteError::Decode(format!("company address: {}", e)))?;

    sqlx::query(
        r#"
        UPDATE companies SET
            name = ?, website = ?, phone = ?, mobile = ?, email = ?, image = ?,
            industry = ?, registration_number = ?, address = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&merged.name)
    .bind(&merged.website)
    .bind(&merged.phone)
    .bind(&merged.mobile)
    .bind(&merged.email)
    .bind(&merged.image)
    .bind(&merged.industry)
    .bind(&merged.registration_number)
    .bind(&address)
    .bind(merged.updated_at)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(Some(merged))
}

/// Delete a company together with its dependent records.
///
/// Customers linked to the company are removed as well (matching the
/// storage-layer cascade rules); invoices and their items follow. Explicit
/// statements rather than FK cascades so behavior does not depend on the
/// connection's foreign-key pragma.
pub async fn delete_company(pool: &SqlitePool, id: &str) -> Result<bool, SqliteError> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "DELETE FROM invoice_items WHERE invoice_id IN (SELECT id FROM invoices WHERE company_id = ?)",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM invoices WHERE company_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "DELETE FROM customers WHERE id IN (SELECT customer_id FROM company_customers WHERE company_id = ?)",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM company_customers WHERE company_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM companies WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}
