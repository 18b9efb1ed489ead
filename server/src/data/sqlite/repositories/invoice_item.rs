//! Invoice item repository for SQLite operations
//!
//! Items carry their own archived flag, mirrored from the invoice-level
//! archive for audit-friendly soft deletes.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::data::sqlite::SqliteError;
use crate::data::types::{InvoiceItemRow, InvoiceItemUpdate, NewInvoiceItem};

const ITEM_COLUMNS: &str =
    "id, description, unit_price, quantity, total_price, archived, invoice_id";

/// Create an item linked to an invoice
pub async fn create_item(
    pool: &SqlitePool,
    invoice_id: &str,
    data: &NewInvoiceItem,
) -> Result<InvoiceItemRow, SqliteError> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO invoice_items (id, description, unit_price, quantity, total_price, archived, invoice_id)
        VALUES (?, ?, ?, ?, ?, 0, ?)
        "#,
    )
    .bind(&id)
    .bind(&data.description)
    .bind(data.unit_price)
    .bind(data.quantity)
    .bind(data.total_price)
    .bind(invoice_id)
    .execute(pool)
    .await?;

    Ok(InvoiceItemRow {
        id,
        description: data.description.clone(),
        unit_price: data.unit_price,
        quantity: data.quantity,
        total_price: data.total_price,
        archived: false,
        invoice_id: invoice_id.to_string(),
    })
}

/// Get an item by ID
pub async fn get_item(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<InvoiceItemRow>, SqliteError> {
    sqlx::query_as::<_, InvoiceItemRow>(&format!(
        "SELECT {ITEM_COLUMNS} FROM invoice_items WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(Into::into)
}

/// List all items of an invoice in insertion order
pub async fn list_for_invoice(
    pool: &SqlitePool,
    invoice_id: &str,
) -> Result<Vec<InvoiceItemRow>, SqliteError> {
    sqlx::query_as::<_, InvoiceItemRow>(&format!(
        "SELECT {ITEM_COLUMNS} FROM invoice_items WHERE invoice_id = ? ORDER BY rowid"
    ))
    .bind(invoice_id)
    .fetch_all(pool)
    .await
    .map_err(Into::into)
}

/// Apply a partial update and return the updated row
pub async fn update_item(
    pool: &SqlitePool,
    id: &str,
    update: &InvoiceItemUpdate,
) -> Result<Option<InvoiceItemRow>, SqliteError> {
    let Some(existing) = get_item(pool, id).await? else {
        return Ok(None);
    };

    let merged = InvoiceItemRow {
        id: existing.id,
        description: update.description.clone().unwrap_or(existing.description),
        unit_price: update.unit_price.unwrap_or(existing.unit_price),
        quantity: update.quantity.unwrap_or(existing.quantity),
        total_price: update.total_price.unwrap_or(existing.total_price),
        archived: existing.archived,
        invoice_id: existing.invoice_id,
    };

    sqlx::query(
        "UPDATE invoice_items SET description = ?, unit_price = ?, quantity = ?, total_price = ? WHERE id = ?",
    )
    .bind(&merged.description)
    .bind(merged.unit_price)
    .bind(merged.quantity)
    .bind(merged.total_price)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(Some(merged))
}

/// Hard-delete an item
pub async fn delete_item(pool: &SqlitePool, id: &str) -> Result<bool, SqliteError> {
    let result = sqlx::query("DELETE FROM invoice_items WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Mirror the invoice-level archive flag onto all items of an invoice
pub async fn set_archived_for_invoice(
    pool: &SqlitePool,
    invoice_id: &str,
    archived: bool,
) -> Result<u64, SqliteError> {
    let result = sqlx::query("UPDATE invoice_items SET archived = ? WHERE invoice_id = ?")
        .bind(archived)
        .bind(invoice_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_test_pool() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        sqlx::query(crate::data::sqlite::schema::SCHEMA)
            .execute(&pool)
            .await
            .unwrap();
        pool
    }

    fn sample_item(description: &str) -> NewInvoiceItem {
        NewInvoiceItem {
            description: description.to_string(),
            unit_price: 25.0,
            quantity: 2,
            total_price: 50.0,
        }
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let pool = setup_test_pool().await;
        create_item(&pool, "inv-1", &sample_item("Design")).await.unwrap();
        create_item(&pool, "inv-1", &sample_item("Development")).await.unwrap();
        create_item(&pool, "inv-2", &sample_item("Hosting")).await.unwrap();

        let items = list_for_invoice(&pool, "inv-1").await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].description, "Design");
        assert_eq!(items[1].description, "Development");
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let pool = setup_test_pool().await;
        let item = create_item(&pool, "inv-1", &sample_item("Design")).await.unwrap();

        let updated = update_item(
            &pool,
            &item.id,
            &InvoiceItemUpdate {
                quantity: Some(3),
                total_price: Some(75.0),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(updated.description, "Design");
        assert_eq!(updated.quantity, 3);
        assert_eq!(updated.total_price, 75.0);
    }

    #[tokio::test]
    async fn test_delete() {
        let pool = setup_test_pool().await;
        let item = create_item(&pool, "inv-1", &sample_item("Design")).await.unwrap();

        assert!(delete_item(&pool, &item.id).await.unwrap());
        assert!(get_item(&pool, &item.id).await.unwrap().is_none());
        assert!(!delete_item(&pool, &item.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_archive_mirrors_invoice() {
        let pool = setup_test_pool().await;
        create_item(&pool, "inv-1", &sample_item("Design")).await.unwrap();
        create_item(&pool, "inv-1", &sample_item("Development")).await.unwrap();

        let changed = set_archived_for_invoice(&pool, "inv-1", true).await.unwrap();
        assert_eq!(changed, 2);

        let items = list_for_invoice(&pool, "inv-1").await.unwrap();
        assert!(items.iter().all(|i| i.archived));

        set_archived_for_invoice(&pool, "inv-1", false).await.unwrap();
        let items = list_for_invoice(&pool, "inv-1").await.unwrap();
        assert!(items.iter().all(|i| !i.archived));
    }
}
