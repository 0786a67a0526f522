use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row};

use bloomery_core::domain::product::{Color, FlowerType, Product, ProductId, ProductPatch};
use bloomery_core::filter::{escape_like, FilterRequest, PriceBucket};

use super::{CatalogRepository, RepositoryError};
use crate::DbPool;

const PRODUCT_COLUMNS: &str =
    "id, name, price, description, flower_type, color, image_path, created_at";

pub struct SqlCatalogRepository {
    pool: DbPool,
}

impl SqlCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn price_to_storage(price: Decimal) -> Result<f64, RepositoryError> {
    price
        .to_f64()
        .ok_or_else(|| RepositoryError::Decode(format!("price `{price}` is not storable")))
}

fn price_from_storage(value: f64) -> Result<Decimal, RepositoryError> {
    Decimal::from_f64_retain(value)
        .ok_or_else(|| RepositoryError::Decode(format!("stored price `{value}` is not a decimal")))
}

fn product_from_row(row: &SqliteRow) -> Result<Product, RepositoryError> {
    let flower_type = row
        .try_get::<Option<String>, _>("flower_type")?
        .map(|raw| {
            FlowerType::parse(&raw)
                .ok_or_else(|| RepositoryError::Decode(format!("unknown flower type `{raw}`")))
        })
        .transpose()?;

    let color = row
        .try_get::<Option<String>, _>("color")?
        .map(|raw| {
            Color::parse(&raw)
                .ok_or_else(|| RepositoryError::Decode(format!("unknown color `{raw}`")))
        })
        .transpose()?;

    let created_raw: String = row.try_get("created_at")?;
    let created_at = created_raw.parse::<DateTime<Utc>>().map_err(|error| {
        RepositoryError::Decode(format!("invalid created_at `{created_raw}`: {error}"))
    })?;

    Ok(Product {
        id: ProductId(row.try_get("id")?),
        name: row.try_get("name")?,
        price: price_from_storage(row.try_get("price")?)?,
        description: row.try_get("description")?,
        flower_type,
        color,
        image_path: row.try_get("image_path")?,
        created_at,
    })
}

/// Fold a filter request into one SELECT. Groups are AND-ed together;
/// values within a group OR together. The rendering must agree with
/// `FilterRequest::matches`.
fn push_filter(builder: &mut QueryBuilder<'_, sqlx::Sqlite>, filter: &FilterRequest) {
    if let Some(search) = &filter.search {
        // to_ascii_lowercase matches SQLite's LOWER(), which is ASCII-only.
        let pattern = format!("%{}%", escape_like(&search.to_ascii_lowercase()));
        builder.push(" AND (LOWER(name) LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" ESCAPE '\\' OR LOWER(COALESCE(description, '')) LIKE ");
        builder.push_bind(pattern);
        builder.push(" ESCAPE '\\')");
    }

    if !filter.flower_types.is_empty() {
        builder.push(" AND flower_type IN (");
        let mut separated = builder.separated(", ");
        for value in &filter.flower_types {
            separated.push_bind(value.clone());
        }
        builder.push(")");
    }

    if !filter.colors.is_empty() {
        builder.push(" AND color IN (");
        let mut separated = builder.separated(", ");
        for value in &filter.colors {
            separated.push_bind(value.clone());
        }
        builder.push(")");
    }

    if !filter.price_buckets.is_empty() {
        match filter.parsed_buckets() {
            // Any unrecognized token collapses the whole price group:
            // malformed input surfaces as "no results", never a wider query.
            None => {
                builder.push(" AND 1 = 0");
            }
            Some(buckets) => {
                builder.push(" AND (");
                for (index, bucket) in buckets.iter().enumerate() {
                    if index > 0 {
                        builder.push(" OR ");
                    }
                    match bucket {
                        PriceBucket::UpTo500 => {
                            builder.push("(price >= 0 AND price <= 500)");
                        }
                        PriceBucket::From500To1000 => {
                            builder.push("(price > 500 AND price <= 1000)");
                        }
                        PriceBucket::From1000To1500 => {
                            builder.push("(price > 1000 AND price <= 1500)");
                        }
                        PriceBucket::Above1500 => {
                            builder.push("(price > 1500)");
                        }
                    }
                }
                builder.push(")");
            }
        }
    }
}

#[async_trait::async_trait]
impl CatalogRepository for SqlCatalogRepository {
    async fn insert(&self, product: &Product) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO product
                (id, name, price, description, flower_type, color, image_path, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&product.id.0)
        .bind(&product.name)
        .bind(price_to_storage(product.price)?)
        .bind(&product.description)
        .bind(product.flower_type.map(|flower_type| flower_type.as_str()))
        .bind(product.color.map(|color| color.as_str()))
        .bind(&product.image_path)
        .bind(product.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(
        &self,
        id: &ProductId,
        patch: ProductPatch,
    ) -> Result<Option<Product>, RepositoryError> {
        let existing = self.find_by_id(id).await?;
        let mut product = match existing {
            Some(product) => product,
            None => return Ok(None),
        };

        product.apply(patch);

        sqlx::query(
            "UPDATE product
             SET name = ?, price = ?, description = ?, flower_type = ?, color = ?, image_path = ?
             WHERE id = ?",
        )
        .bind(&product.name)
        .bind(price_to_storage(product.price)?)
        .bind(&product.description)
        .bind(product.flower_type.map(|flower_type| flower_type.as_str()))
        .bind(product.color.map(|color| color.as_str()))
        .bind(&product.image_path)
        .bind(&product.id.0)
        .execute(&self.pool)
        .await?;

        Ok(Some(product))
    }

    async fn delete(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let existing = self.find_by_id(id).await?;
        let product = match existing {
            Some(product) => product,
            None => return Ok(None),
        };

        sqlx::query("DELETE FROM product WHERE id = ?")
            .bind(&product.id.0)
            .execute(&self.pool)
            .await?;

        Ok(Some(product))
    }

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let row =
            sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM product WHERE id = ?"))
                .bind(&id.0)
                .fetch_optional(&self.pool)
                .await?;

        row.as_ref().map(product_from_row).transpose()
    }

    async fn search(&self, filter: &FilterRequest) -> Result<Vec<Product>, RepositoryError> {
        let mut builder = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE 1 = 1"
        ));
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY created_at DESC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(product_from_row).collect()
    }
}
