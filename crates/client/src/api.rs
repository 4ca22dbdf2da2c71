//! Typed inventory API over the query cache.
//!
//! Each read is a cached query with its declared tags; each write is a
//! mutation that invalidates the tags it affects once the server has
//! acknowledged it.

use std::time::Duration;

use stockroom_cache::{Mutation, QueryCache, QueryDef, QueryPolicy, Subscription};
use stockroom_core::cache::{decode, encode, tag_set, Result, Transport};
use stockroom_core::inventory::endpoints::{
    self, create_product_invalidates, product_invalidates, product_path_args, products_args,
    products_provides,
};
use stockroom_core::inventory::{
    DashboardMetrics, DeleteResponse, ExpenseByCategorySummary, NewProduct, Product, ProductPatch,
    User,
};

/// Dashboard metrics query.
pub fn dashboard_query() -> QueryDef {
    QueryDef::new(endpoints::DASHBOARD, None).provides(tag_set([endpoints::DASHBOARD_METRICS_TAG]))
}

/// Product list query, optionally filtered by name.
pub fn products_query(search: Option<&str>) -> QueryDef {
    QueryDef::new(endpoints::PRODUCTS, products_args(search)).provides_with(products_provides)
}

pub fn users_query() -> QueryDef {
    QueryDef::new(endpoints::USERS, None).provides(tag_set([endpoints::USERS_TAG]))
}

pub fn expenses_query() -> QueryDef {
    QueryDef::new(endpoints::EXPENSES, None).provides(tag_set([endpoints::EXPENSES_TAG]))
}

/// Typed access to the inventory endpoints.
pub struct InventoryApi<T: ?Sized> {
    cache: QueryCache<T>,
}

impl<T> InventoryApi<T>
where
    T: Transport + ?Sized + 'static,
{
    pub fn new(cache: QueryCache<T>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &QueryCache<T> {
        &self.cache
    }

    fn products_policy(&self) -> QueryPolicy {
        self.cache
            .default_policy()
            .with_retention(Duration::from_secs(endpoints::PRODUCTS_RETENTION_SECS))
    }

    pub async fn dashboard_metrics(&self) -> Result<DashboardMetrics> {
        let value = self
            .cache
            .query(&dashboard_query(), self.cache.default_policy())
            .await?;
        decode(&value)
    }

    pub async fn products(&self, search: Option<&str>) -> Result<Vec<Product>> {
        let value = self
            .cache
            .query(&products_query(search), self.products_policy())
            .await?;
        decode(&value)
    }

    /// Subscribes to a product list; every transition of the entry is yielded.
    pub fn watch_products(&self, search: Option<&str>) -> Result<Subscription> {
        self.cache
            .subscribe(products_query(search), self.products_policy())
    }

    pub async fn create_product(&self, product: &NewProduct) -> Result<Product> {
        let mutation = Mutation::new(endpoints::CREATE_PRODUCT)
            .with_body(encode(product)?)
            .invalidates(create_product_invalidates());
        let value = self.cache.mutate(&mutation).await?;
        decode(&value)
    }

    pub async fn update_product(&self, id: &str, patch: &ProductPatch) -> Result<Product> {
        let mutation = Mutation::new(endpoints::UPDATE_PRODUCT)
            .with_args(product_path_args(id))
            .with_body(encode(patch)?)
            .invalidates(product_invalidates(id));
        let value = self.cache.mutate(&mutation).await?;
        decode(&value)
    }

    pub async fn delete_product(&self, id: &str) -> Result<DeleteResponse> {
        let mutation = Mutation::new(endpoints::DELETE_PRODUCT)
            .with_args(product_path_args(id))
            .invalidates(product_invalidates(id));
        let value = self.cache.mutate(&mutation).await?;
        decode(&value)
    }

    pub async fn users(&self) -> Result<Vec<User>> {
        let value = self
            .cache
            .query(&users_query(), self.cache.default_policy())
            .await?;
        decode(&value)
    }

    pub async fn expenses_by_category(&self) -> Result<Vec<ExpenseByCategorySummary>> {
        let value = self
            .cache
            .query(&expenses_query(), self.cache.default_policy())
            .await?;
        decode(&value)
    }
}
