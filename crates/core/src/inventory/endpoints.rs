//! Inventory REST endpoints and the tags each one provides or invalidates.

use serde_json::{json, Value};

use crate::cache::{Tag, TagSet};

pub const DASHBOARD: &str = "/dashboard";
pub const PRODUCTS: &str = "/products";
pub const USERS: &str = "/users";
pub const EXPENSES: &str = "/expenses";

pub const CREATE_PRODUCT: &str = "POST /products";
pub const UPDATE_PRODUCT: &str = "PUT /products/{id}";
pub const DELETE_PRODUCT: &str = "DELETE /products/{id}";

pub const DASHBOARD_METRICS_TAG: &str = "DashboardMetrics";
pub const PRODUCTS_TAG: &str = "Products";
pub const USERS_TAG: &str = "Users";
pub const EXPENSES_TAG: &str = "Expenses";

/// Id of the tag covering the product list as a whole.
pub const LIST_ID: &str = "LIST";

/// Retention for unobserved product queries, in seconds.
pub const PRODUCTS_RETENTION_SECS: u64 = 60;

/// Arguments for the product list query. A blank search is no search.
pub fn products_args(search: Option<&str>) -> Option<Value> {
    let search = search.map(str::trim).filter(|s| !s.is_empty())?;
    Some(json!({ "search": search }))
}

/// Tag of the product list.
pub fn products_list_tag() -> Tag {
    Tag::with_id(PRODUCTS_TAG, LIST_ID)
}

/// Tags provided by a product list result: one per product plus the list tag.
///
/// A result that is not an array provides only the list tag.
pub fn products_provides(result: &Value) -> TagSet {
    let mut tags = TagSet::new();
    if let Some(items) = result.as_array() {
        for id in items.iter().filter_map(product_id) {
            tags.insert(Tag::with_id(PRODUCTS_TAG, id));
        }
    }
    tags.insert(products_list_tag());
    tags
}

/// Tags invalidated by creating a product.
pub fn create_product_invalidates() -> TagSet {
    TagSet::from([products_list_tag()])
}

/// Tags invalidated by updating or deleting product `id`.
pub fn product_invalidates(id: &str) -> TagSet {
    TagSet::from([Tag::with_id(PRODUCTS_TAG, id), products_list_tag()])
}

/// Arguments addressing a single product in a mutation path.
pub fn product_path_args(id: &str) -> Value {
    json!({ "id": id })
}

fn product_id(item: &Value) -> Option<String> {
    match item.get("productId")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_products_args_blank_search() {
        assert_eq!(products_args(None), None);
        assert_eq!(products_args(Some("")), None);
        assert_eq!(products_args(Some("   ")), None);
        assert_eq!(
            products_args(Some(" shoe ")),
            Some(json!({ "search": "shoe" }))
        );
    }

    #[test]
    fn test_products_provides_per_item_and_list() {
        let result = json!([
            { "productId": "1", "name": "Shoe A" },
            { "productId": 2, "name": "Shoe B" },
            { "name": "no id" }
        ]);

        let tags = products_provides(&result);

        assert_eq!(
            tags,
            TagSet::from([
                Tag::with_id("Products", "1"),
                Tag::with_id("Products", "2"),
                Tag::with_id("Products", "LIST"),
            ])
        );
    }

    #[test]
    fn test_products_provides_non_list_result() {
        let tags = products_provides(&json!({ "message": "oops" }));
        assert_eq!(tags, TagSet::from([products_list_tag()]));
    }

    #[test]
    fn test_mutation_invalidations() {
        assert_eq!(
            create_product_invalidates(),
            TagSet::from([Tag::parse("Products:LIST")])
        );
        assert_eq!(
            product_invalidates("42"),
            TagSet::from([Tag::parse("Products:42"), Tag::parse("Products:LIST")])
        );
    }
}
