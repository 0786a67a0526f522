use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use bloomery_core::domain::order::{Order, OrderId, OrderItem, OrderStatus};
use bloomery_core::domain::product::ProductId;

use super::{OrderRepository, RepositoryError};
use crate::DbPool;

const PICKUP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub struct SqlOrderRepository {
    pool: DbPool,
}

impl SqlOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn item_from_row(row: &SqliteRow) -> Result<OrderItem, RepositoryError> {
    let pickup_raw: String = row.try_get("pickup_at")?;
    let pickup_at = NaiveDateTime::parse_from_str(&pickup_raw, PICKUP_FORMAT).map_err(|error| {
        RepositoryError::Decode(format!("invalid pickup_at `{pickup_raw}`: {error}"))
    })?;

    Ok(OrderItem {
        product_id: ProductId(row.try_get("product_id")?),
        quantity: row.try_get::<i64, _>("quantity")? as u32,
        sender: row.try_get("sender")?,
        recipient: row.try_get("recipient")?,
        message: row.try_get("message")?,
        pickup_at,
    })
}

#[async_trait::async_trait]
impl OrderRepository for SqlOrderRepository {
    /// Persists the order header and every line in one transaction, so a
    /// failure partway through leaves nothing behind.
    async fn save(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO customer_order (id, status, created_at) VALUES (?, ?, ?)")
            .bind(&order.id.0)
            .bind(order.status.as_str())
            .bind(order.created_at.to_rfc3339())
            .execute(&mut *tx)
            .await?;

        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO order_item
                    (order_id, position, product_id, quantity, sender, recipient, message, pickup_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&order.id.0)
            .bind(position as i64)
            .bind(&item.product_id.0)
            .bind(item.quantity as i64)
            .bind(&item.sender)
            .bind(&item.recipient)
            .bind(&item.message)
            .bind(item.pickup_at.format(PICKUP_FORMAT).to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        let header =
            sqlx::query("SELECT id, status, created_at FROM customer_order WHERE id = ?")
                .bind(&id.0)
                .fetch_optional(&self.pool)
                .await?;
        let header = match header {
            Some(row) => row,
            None => return Ok(None),
        };

        let status_raw: String = header.try_get("status")?;
        let status = OrderStatus::parse(&status_raw).ok_or_else(|| {
            RepositoryError::Decode(format!("unknown order status `{status_raw}`"))
        })?;

        let created_raw: String = header.try_get("created_at")?;
        let created_at = created_raw.parse::<DateTime<Utc>>().map_err(|error| {
            RepositoryError::Decode(format!("invalid created_at `{created_raw}`: {error}"))
        })?;

        let rows = sqlx::query(
            "SELECT product_id, quantity, sender, recipient, message, pickup_at
             FROM order_item WHERE order_id = ? ORDER BY position",
        )
        .bind(&id.0)
        .fetch_all(&self.pool)
        .await?;
        let items = rows.iter().map(item_from_row).collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Order { id: OrderId(header.try_get("id")?), items, status, created_at }))
    }
}
