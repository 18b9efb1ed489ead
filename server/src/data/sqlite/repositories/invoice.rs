//! Invoice repository for SQLite operations
//!
//! "Delete" is a soft archive; `set_archived` flips the flag both ways.
//! Listings are always scoped to the companies owned by the requesting user.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::data::sqlite::SqliteError;
use crate::data::types::{
    InvoiceRow, InvoiceSortBy, InvoiceUpdate, ListInvoicesParams, NewInvoice, SortOrder,
};

const INVOICE_COLUMNS: &str = "id, invoice_number, date, sub_total, total_amount, vat, currency, \
     is_archived, mark_as_draft, company_id, customer_id, created_at, updated_at";

/// Create an invoice
pub async fn create_invoice(
    pool: &SqlitePool,
    data: &NewInvoice,
) -> Result<InvoiceRow, SqliteError> {
    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        r#"
        INSERT INTO invoices
            (id, invoice_number, date, sub_total, total_amount, vat, currency,
             is_archived, mark_as_draft, company_id, customer_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&data.invoice_number)
    .bind(&data.date)
    .bind(data.sub_total)
    .bind(data.total_amount)
    .bind(data.vat)
    .bind(&data.currency)
    .bind(data.mark_as_draft)
    .bind(&data.company_id)
    .bind(&data.customer_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(InvoiceRow {
        id,
        invoice_number: data.invoice_number.clone(),
        date: data.date.clone(),
        sub_total: data.sub_total,
        total_amount: data.total_amount,
        vat: data.vat,
        currency: data.currency.clone(),
        is_archived: false,
        mark_as_draft: data.mark_as_draft,
        company_id: data.company_id.clone(),
        customer_id: Some(data.customer_id.clone()),
        created_at: now,
        updated_at: now,
    })
}

/// Get an invoice by ID
pub async fn get_invoice(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<InvoiceRow>, SqliteError> {
    sqlx::query_as::<_, InvoiceRow>(&format!(
        "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(Into::into)
}

fn push_filters<'a>(qb: &mut QueryBuilder<'a, Sqlite>, params: &'a ListInvoicesParams) {
    qb.push(" WHERE company_id IN (SELECT id FROM companies WHERE belongs_to = ");
    qb.push_bind(&params.owner_user_id);
    qb.push(")");

    if let Some(company_id) = &params.company_id {
        qb.push(" AND company_id = ");
        qb.push_bind(company_id);
    }
    if let Some(customer_id) = &params.customer_id {
        qb.push(" AND customer_id = ");
        qb.push_bind(customer_id);
    }

    qb.push(" AND is_archived = ");
    qb.push_bind(params.archived);

    if let Some(draft) = params.draft {
        qb.push(" AND mark_as_draft = ");
        qb.push_bind(draft);
    }
    if let Some(currency) = &params.currency {
        qb.push(" AND LOWER(currency) = LOWER(");
        qb.push_bind(currency);
        qb.push(")");
    }
}

/// List invoices with filters and pagination, newest first by default
pub async fn list_invoices(
    pool: &SqlitePool,
    params: &ListInvoicesParams,
) -> Result<(Vec<InvoiceRow>, u64), SqliteError> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {INVOICE_COLUMNS} FROM invoices"
    ));
    push_filters(&mut qb, params);

    let sort_column = match params.sort_by {
        InvoiceSortBy::CreatedAt => "created_at",
        InvoiceSortBy::TotalAmount => "total_amount",
    };
    let direction = match params.order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };
    qb.push(format!(" ORDER BY {} {}", sort_column, direction));

    let offset = (params.page.saturating_sub(1) as i64) * params.limit as i64;
    qb.push(" LIMIT ");
    qb.push_bind(params.limit as i64);
    qb.push(" OFFSET ");
    qb.push_bind(offset);

    let rows = qb
        .build_query_as::<InvoiceRow>()
        .fetch_all(pool)
        .await?;

    let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM invoices");
    push_filters(&mut count_qb, params);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    Ok((rows, total as u64))
}

/// Apply a partial update and return the updated row
pub async fn update_invoice(
    pool: &SqlitePool,
    id: &str,
    update: &InvoiceUpdate,
) -> Result<Option<InvoiceRow>, SqliteError> {
    let Some(existing) = get_invoice(pool, id).await? else {
        return Ok(None);
    };

    let merged = InvoiceRow {
        id: existing.id,
        invoice_number: update
            .invoice_number
            .clone()
            .unwrap_or(existing.invoice_number),
        date: update.date.clone().unwrap_or(existing.date),
        sub_total: update.sub_total.unwrap_or(existing.sub_total),
        total_amount: update.total_amount.unwrap_or(existing.total_amount),
        vat: update.vat.unwrap_or(existing.vat),
        currency: update.currency.clone().unwrap_or(existing.currency),
        is_archived: existing.is_archived,
        mark_as_draft: update.mark_as_draft.unwrap_or(existing.mark_as_draft),
        company_id: existing.company_id,
        customer_id: existing.customer_id,
        created_at: existing.created_at,
        updated_at: chrono::Utc::now().timestamp(),
    };

    sqlx::query(
        r#"
        UPDATE invoices SET
            invoice_number = ?, date = ?, sub_total = ?, total_amount = ?,
            vat = ?, currency = ?, mark_as_draft = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&merged.invoice_number)
    .bind(&merged.date)
    .bind(merged.sub_total)
    .bind(merged.total_amount)
    .bind(merged.vat)
    .bind(&merged.currency)
    .bind(merged.mark_as_draft)
    .bind(merged.updated_at)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(Some(merged))
}

/// Flip the archive flag; returns whether the invoice existed
pub async fn set_archived(
    pool: &SqlitePool,
    id: &str,
    archived: bool,
) -> Result<bool, SqliteError> {
    let now = chrono::Utc::now().timestamp();
    let result = sqlx::query("UPDATE invoices SET is_archived = ?, updated_at = ? WHERE id = ?")
        .bind(archived)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::repositories::{company, customer, user};
    use crate::data::types::{Address, NewCompany, NewCustomer};

    async fn setup_test_pool() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        sqlx::query(crate::data::sqlite::schema::SCHEMA)
            .execute(&pool)
            .await
            .unwrap();
        pool
    }

    struct Fixture {
        owner_id: String,
        company_id: String,
        customer_id: String,
    }

    async fn seed(pool: &SqlitePool, tag: &str) -> Fixture {
        let owner = user::create_temporary_user(pool, &format!("{}@x.com", tag))
            .await
            .unwrap();
        let company = company::create_company(
            pool,
            &NewCompany {
                name: format!("Company {}", tag),
                website: None,
                phone: None,
                mobile: None,
                email: format!("info@{}.test", tag),
                image: None,
                industry: None,
                registration_number: None,
                address: Address::default(),
            },
            &owner.id,
        )
        .await
        .unwrap();
        let cust = customer::create_customer_for_company(
            pool,
            &NewCustomer {
                name: format!("Customer {}", tag),
                email: format!("{}@customers.test", tag),
                mobile: None,
                phone: None,
                address: None,
            },
            &company.id,
        )
        .await
        .unwrap();

        Fixture {
            owner_id: owner.id,
            company_id: company.id,
            customer_id: cust.id,
        }
    }

    fn sample_invoice(fx: &Fixture, number: &str, total: f64) -> NewInvoice {
        NewInvoice {
            invoice_number: number.to_string(),
            date: "2024-06-01".to_string(),
            sub_total: total / 1.19,
            total_amount: total,
            vat: 19.0,
            currency: "EUR".to_string(),
            mark_as_draft: false,
            company_id: fx.company_id.clone(),
            customer_id: fx.customer_id.clone(),
        }
    }

    fn list_params(fx: &Fixture) -> ListInvoicesParams {
        ListInvoicesParams {
            owner_user_id: fx.owner_id.clone(),
            company_id: None,
            customer_id: None,
            archived: false,
            draft: None,
            currency: None,
            sort_by: InvoiceSortBy::CreatedAt,
            order: SortOrder::Desc,
            page: 1,
            limit: 10,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let pool = setup_test_pool().await;
        let fx = seed(&pool, "a").await;

        let created = create_invoice(&pool, &sample_invoice(&fx, "INV-1", 119.0))
            .await
            .unwrap();
        let fetched = get_invoice(&pool, &created.id).await.unwrap().unwrap();

        assert_eq!(fetched.invoice_number, "INV-1");
        assert!(!fetched.is_archived);
        assert_eq!(fetched.company_id, fx.company_id);
        assert_eq!(fetched.customer_id.as_deref(), Some(fx.customer_id.as_str()));
    }

    #[tokio::test]
    async fn test_list_scoped_to_owner() {
        let pool = setup_test_pool().await;
        let mine = seed(&pool, "mine").await;
        let theirs = seed(&pool, "theirs").await;

        create_invoice(&pool, &sample_invoice(&mine, "INV-1", 100.0))
            .await
            .unwrap();
        create_invoice(&pool, &sample_invoice(&theirs, "INV-2", 200.0))
            .await
            .unwrap();

        let (rows, total) = list_invoices(&pool, &list_params(&mine)).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].invoice_number, "INV-1");
    }

    #[tokio::test]
    async fn test_list_excludes_archived_by_default() {
        let pool = setup_test_pool().await;
        let fx = seed(&pool, "a").await;

        let inv = create_invoice(&pool, &sample_invoice(&fx, "INV-1", 100.0))
            .await
            .unwrap();
        create_invoice(&pool, &sample_invoice(&fx, "INV-2", 200.0))
            .await
            .unwrap();
        set_archived(&pool, &inv.id, true).await.unwrap();

        let (rows, total) = list_invoices(&pool, &list_params(&fx)).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].invoice_number, "INV-2");

        let mut archived = list_params(&fx);
        archived.archived = true;
        let (rows, _) = list_invoices(&pool, &archived).await.unwrap();
        assert_eq!(rows[0].invoice_number, "INV-1");
    }

    #[tokio::test]
    async fn test_list_sort_by_total_amount() {
        let pool = setup_test_pool().await;
        let fx = seed(&pool, "a").await;
        create_invoice(&pool, &sample_invoice(&fx, "INV-1", 300.0))
            .await
            .unwrap();
        create_invoice(&pool, &sample_invoice(&fx, "INV-2", 100.0))
            .await
            .unwrap();

        let mut params = list_params(&fx);
        params.sort_by = InvoiceSortBy::TotalAmount;
        params.order = SortOrder::Asc;

        let (rows, _) = list_invoices(&pool, &params).await.unwrap();
        assert_eq!(rows[0].invoice_number, "INV-2");
        assert_eq!(rows[1].invoice_number, "INV-1");
    }

    #[tokio::test]
    async fn test_currency_filter_is_case_insensitive() {
        let pool = setup_test_pool().await;
        let fx = seed(&pool, "a").await;
        create_invoice(&pool, &sample_invoice(&fx, "INV-1", 100.0))
            .await
            .unwrap();

        let mut params = list_params(&fx);
        params.currency = Some("eur".to_string());
        let (_, total) = list_invoices(&pool, &params).await.unwrap();
        assert_eq!(total, 1);

        params.currency = Some("usd".to_string());
        let (_, total) = list_invoices(&pool, &params).await.unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let pool = setup_test_pool().await;
        let fx = seed(&pool, "a").await;
        let inv = create_invoice(&pool, &sample_invoice(&fx, "INV-1", 100.0))
            .await
            .unwrap();

        let updated = update_invoice(
            &pool,
            &inv.id,
            &InvoiceUpdate {
                currency: Some("USD".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(updated.currency, "USD");
        assert_eq!(updated.invoice_number, "INV-1");
    }

    #[tokio::test]
    async fn test_archive_roundtrip() {
        let pool = setup_test_pool().await;
        let fx = seed(&pool, "a").await;
        let inv = create_invoice(&pool, &sample_invoice(&fx, "INV-1", 100.0))
            .await
            .unwrap();

        assert!(set_archived(&pool, &inv.id, true).await.unwrap());
        assert!(get_invoice(&pool, &inv.id).await.unwrap().unwrap().is_archived);

        assert!(set_archived(&pool, &inv.id, false).await.unwrap());
        assert!(!get_invoice(&pool, &inv.id).await.unwrap().unwrap().is_archived);

        assert!(!set_archived(&pool, "missing", true).await.unwrap());
    }
}
