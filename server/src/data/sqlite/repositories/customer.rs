//! Customer repository for SQLite operations
//!
//! Customers are identified by their (name, email) pair and may be linked to
//! several companies through the junction table. Association, not the row
//! itself, is what the ownership guards check.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::data::sqlite::SqliteError;
use crate::data::types::{Address, CustomerRow, CustomerUpdate, NewCustomer};

const CUSTOMER_COLUMNS: &str = "id, name, email, mobile, phone, address";

type CustomerTuple = (
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
);

fn decode_address(raw: Option<String>) -> Result<Option<Address>, SqliteError> {
    raw.map(|json| {
        serde_json::from_str(&json)
            .map_err(|e| SqliteError::Decode(format!("customer address: {}", e)))
    })
    .transpose()
}

fn map_row(row: CustomerTuple) -> Result<CustomerRow, SqliteError> {
    let (id, name, email, mobile, phone, address) = row;
    Ok(CustomerRow {
        id,
        name,
        email,
        mobile,
        phone,
        address: decode_address(address)?,
    })
}

fn encode_address(address: &Option<Address>) -> Result<Option<String>, SqliteError> {
    address
        .as_ref()
        .map(|a| {
            serde_json::to_string(a)
                .map_err(|e| SqliteError::Decode(format!("customer address: {}", e)))
        })
        .transpose()
}

/// Create a customer and link it to a company atomically
pub async fn create_customer_for_company(
    pool: &SqlitePool,
    data: &NewCustomer,
    company_id: &str,
) -> Result<CustomerRow, SqliteError> {
    let id = Uuid::new_v4().to_string();
    let address = encode_address(&data.address)?;

    let mut tx = pool.begin().await?;

    sqlx::query("INSERT INTO customers (id, name, email, mobile, phone, address) VALUES (?, ?, ?, ?, ?, ?)")
        .bind(&id)
        .bind(&data.name)
        .bind(&data.email)
        .bind(&data.mobile)
        .bind(&data.phone)
        .bind(&address)
        .execute(&mut *tx)
        .await?;

    sqlx::query("INSERT INTO company_customers (company_id, customer_id) VALUES (?, ?)")
        .bind(company_id)
        .bind(&id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(CustomerRow {
        id,
        name: data.name.clone(),
        email: data.email.clone(),
        mobile: data.mobile.clone(),
        phone: data.phone.clone(),
        address: data.address.clone(),
    })
}

/// Get a customer by ID
pub async fn get_customer(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<CustomerRow>, SqliteError> {
    let row = sqlx::query_as::<_, CustomerTuple>(&format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(map_row).transpose()
}

/// Find a customer by its unique (name, email) pair
pub async fn find_by_identity(
    pool: &SqlitePool,
    name: &str,
    email: &str,
) -> Result<Option<CustomerRow>, SqliteError> {
    let row = sqlx::query_as::<_, CustomerTuple>(&format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE name = ? AND email = ?"
    ))
    .bind(name)
    .bind(email)
    .fetch_optional(pool)
    .await?;

    row.map(map_row).transpose()
}

/// Whether a customer is linked to a company
pub async fn belongs_to_company(
    pool: &SqlitePool,
    customer_id: &str,
    company_id: &str,
) -> Result<bool, SqliteError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM company_customers WHERE customer_id = ? AND company_id = ?",
    )
    .bind(customer_id)
    .bind(company_id)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

/// Link an existing customer to a company (no-op when already linked)
pub async fn link_to_company(
    pool: &SqlitePool,
    customer_id: &str,
    company_id: &str,
) -> Result<(), SqliteError> {
    sqlx::query("INSERT OR IGNORE INTO company_customers (company_id, customer_id) VALUES (?, ?)")
        .bind(company_id)
        .bind(customer_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Remove a customer's association with a company; the row itself survives
pub async fn unlink_from_company(
    pool: &SqlitePool,
    customer_id: &str,
    company_id: &str,
) -> Result<bool, SqliteError> {
    let result =
        sqlx::query("DELETE FROM company_customers WHERE customer_id = ? AND company_id = ?")
            .bind(customer_id)
            .bind(company_id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}

/// List customers linked to a company, with the total count
pub async fn list_for_company(
    pool: &SqlitePool,
    company_id: &str,
    page: u32,
    limit: u32,
) -> Result<(Vec<CustomerRow>, u64), SqliteError> {
    let offset = (page.saturating_sub(1) as i64) * limit as i64;

    let rows = sqlx::query_as::<_, CustomerTuple>(
        "SELECT c.id, c.name, c.email, c.mobile, c.phone, c.address \
         FROM customers c \
         JOIN company_customers cc ON cc.customer_id = c.id \
         WHERE cc.company_id = ? \
         ORDER BY c.name LIMIT ? OFFSET ?",
    )
    .bind(company_id)
    .bind(limit as i64)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM company_customers WHERE company_id = ?")
            .bind(company_id)
            .fetch_one(pool)
            .await?;

    let customers = rows
        .into_iter()
        .map(map_row)
        .collect::<Result<Vec<_>, _>>()?;

    Ok((customers, total as u64))
}

/// Ids of companies a customer is linked to
pub async fn company_ids(
    pool: &SqlitePool,
    customer_id: &str,
) -> Result<Vec<String>, SqliteError> {
    let rows = sqlx::query_as::<_, (String,)>(
        "SELECT company_id FROM company_customers WHERE customer_id = ?",
    )
    .bind(customer_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Apply a partial update and return the updated row
pub async fn update_customer(
    pool: &SqlitePool,
    id: &str,
    update: &CustomerUpdate,
) -> Result<Option<CustomerRow>, SqliteError> {
    let Some(existing) = get_customer(pool, id).await? else {
        return Ok(None);
    };

    let merged = CustomerRow {
        id: existing.id,
        name: update.name.clone().unwrap_or(existing.name),
        email: update.email.clone().unwrap_or(existing.email),
        mobile: update.mobile.clone().or(existing.mobile),
        phone: update.phone.clone().or(existing.phone),
        address: update.address.clone().or(existing.address),
    };

    let address = encode_address(&merged.address)?;

    sqlx::query(
        "UPDATE customers SET name = ?, email = ?, mobile = ?, phone = ?, address = ? WHERE id = ?",
    )
    .bind(&merged.name)
    .bind(&merged.email)
    .bind(&merged.mobile)
    .bind(&merged.phone)
    .bind(&address)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(Some(merged))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::repositories::{company, user};
    use crate::data::types::NewCompany;

    async fn setup_test_pool() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        sqlx::query(crate::data::sqlite::schema::SCHEMA)
            .execute(&pool)
            .await
            .unwrap();
        pool
    }

    async fn seed_company(pool: &SqlitePool, name: &str) -> String {
        let owner = user::create_temporary_user(pool, &format!("{}@x.com", name.to_lowercase()))
            .await
            .unwrap();
        company::create_company(
            pool,
            &NewCompany {
                name: name.to_string(),
                website: None,
                phone: None,
                mobile: None,
                email: format!("info@{}.test", name.to_lowercase()),
                image: None,
                industry: None,
                registration_number: None,
                address: Address::default(),
            },
            &owner.id,
        )
        .await
        .unwrap()
        .id
    }

    fn sample_customer(name: &str) -> NewCustomer {
        NewCustomer {
            name: name.to_string(),
            email: format!("{}@customers.test", name.to_lowercase()),
            mobile: None,
            phone: None,
            address: None,
        }
    }

    #[tokio::test]
    async fn test_create_links_to_company() {
        let pool = setup_test_pool().await;
        let company_id = seed_company(&pool, "Acme").await;

        let customer = create_customer_for_company(&pool, &sample_customer("Anna"), &company_id)
            .await
            .unwrap();

        assert!(belongs_to_company(&pool, &customer.id, &company_id)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_association_is_per_company() {
        let pool = setup_test_pool().await;
        let first = seed_company(&pool, "First").await;
        let second = seed_company(&pool, "Second").await;

        let customer = create_customer_for_company(&pool, &sample_customer("Anna"), &first)
            .await
            .unwrap();

        assert!(belongs_to_company(&pool, &customer.id, &first).await.unwrap());
        assert!(!belongs_to_company(&pool, &customer.id, &second).await.unwrap());

        link_to_company(&pool, &customer.id, &second).await.unwrap();
        assert!(belongs_to_company(&pool, &customer.id, &second).await.unwrap());
        assert_eq!(company_ids(&pool, &customer.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_find_by_identity() {
        let pool = setup_test_pool().await;
        let company_id = seed_company(&pool, "Acme").await;
        create_customer_for_company(&pool, &sample_customer("Anna"), &company_id)
            .await
            .unwrap();

        let found = find_by_identity(&pool, "Anna", "anna@customers.test")
            .await
            .unwrap();
        assert!(found.is_some());

        let missing = find_by_identity(&pool, "Anna", "other@customers.test")
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_identity_is_rejected() {
        let pool = setup_test_pool().await;
        let company_id = seed_company(&pool, "Acme").await;
        create_customer_for_company(&pool, &sample_customer("Anna"), &company_id)
            .await
            .unwrap();

        let err = create_customer_for_company(&pool, &sample_customer("Anna"), &company_id)
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_unlink_keeps_customer_row() {
        let pool = setup_test_pool().await;
        let company_id = seed_company(&pool, "Acme").await;
        let customer = create_customer_for_company(&pool, &sample_customer("Anna"), &company_id)
            .await
            .unwrap();

        assert!(unlink_from_company(&pool, &customer.id, &company_id)
            .await
            .unwrap());
        assert!(!belongs_to_company(&pool, &customer.id, &company_id)
            .await
            .unwrap());
        assert!(get_customer(&pool, &customer.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_list_for_company() {
        let pool = setup_test_pool().await;
        let company_id = seed_company(&pool, "Acme").await;
        create_customer_for_company(&pool, &sample_customer("Anna"), &company_id)
            .await
            .unwrap();
        create_customer_for_company(&pool, &sample_customer("Bert"), &company_id)
            .await
            .unwrap();

        let (customers, total) = list_for_company(&pool, &company_id, 1, 10).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(customers[0].name, "Anna");
        assert_eq!(customers[1].name, "Bert");
    }
}
