use async_trait::async_trait;
use thiserror::Error;

use bloomery_core::domain::order::{Order, OrderId};
use bloomery_core::domain::product::{Product, ProductId, ProductPatch};
use bloomery_core::filter::FilterRequest;

pub mod catalog;
pub mod memory;
pub mod order;

pub use catalog::SqlCatalogRepository;
pub use memory::{InMemoryCatalogRepository, InMemoryOrderRepository};
pub use order::SqlOrderRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// The catalog store: the only shared mutable resource in the system.
/// Individual record writes are atomic; there is no cross-record locking.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn insert(&self, product: &Product) -> Result<(), RepositoryError>;

    /// Overwrite the supplied fields of an existing product. Returns the
    /// updated record, or `None` when the id does not resolve.
    async fn update(
        &self,
        id: &ProductId,
        patch: ProductPatch,
    ) -> Result<Option<Product>, RepositoryError>;

    /// Remove a product, returning the deleted record so callers can clean
    /// up its stored image. `None` when the id does not resolve.
    async fn delete(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError>;

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Evaluate a filter request; results come back newest-created-first.
    async fn search(&self, filter: &FilterRequest) -> Result<Vec<Product>, RepositoryError>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist the whole order as one atomic unit: either the order row and
    /// every item land, or nothing does.
    async fn save(&self, order: &Order) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError>;
}
