use std::collections::HashMap;

use tokio::sync::RwLock;

use bloomery_core::domain::order::{Order, OrderId};
use bloomery_core::domain::product::{Product, ProductId, ProductPatch};
use bloomery_core::filter::FilterRequest;

use super::{CatalogRepository, OrderRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryCatalogRepository {
    products: RwLock<HashMap<String, Product>>,
}

#[async_trait::async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn insert(&self, product: &Product) -> Result<(), RepositoryError> {
        let mut products = self.products.write().await;
        products.insert(product.id.0.clone(), product.clone());
        Ok(())
    }

    async fn update(
        &self,
        id: &ProductId,
        patch: ProductPatch,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut products = self.products.write().await;
        match products.get_mut(&id.0) {
            Some(product) => {
                product.apply(patch);
                Ok(Some(product.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let mut products = self.products.write().await;
        Ok(products.remove(&id.0))
    }

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.get(&id.0).cloned())
    }

    async fn search(&self, filter: &FilterRequest) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().await;
        let mut hits: Vec<Product> =
            products.values().filter(|product| filter.matches(product)).cloned().collect();
        hits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(hits)
    }
}

#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<String, Order>>,
}

#[async_trait::async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn save(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut orders = self.orders.write().await;
        orders.insert(order.id.0.clone(), order.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        let orders = self.orders.read().await;
        Ok(orders.get(&id.0).cloned())
    }
}
