use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A product in the inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub product_id: String,
    pub name: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    pub stock_quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body for creating a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    pub stock_quantity: i64,
}

/// Partial update of a product. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<i64>,
}

impl ProductPatch {
    /// Returns true if the patch would not change anything.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.rating.is_none()
            && self.stock_quantity.is_none()
    }
}

/// Acknowledgement returned by product deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub sales_summary_id: String,
    pub total_value: f64,
    #[serde(default)]
    pub change_percentage: Option<f64>,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseSummary {
    pub purchase_summary_id: String,
    pub total_purchased: f64,
    #[serde(default)]
    pub change_percentage: Option<f64>,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseSummary {
    /// Field name follows the REST payload, typo included.
    #[serde(rename = "expenseSummarId")]
    pub expense_summary_id: String,
    pub total_expenses: f64,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseByCategorySummary {
    pub expense_by_category_summary_id: String,
    pub category: String,
    /// Decimal amount, sent as a string by the API.
    pub amount: String,
    pub date: DateTime<Utc>,
}

/// Everything the dashboard page renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub popular_products: Vec<Product>,
    pub sales_summary: Vec<SalesSummary>,
    pub purchase_summary: Vec<PurchaseSummary>,
    pub expense_summary: Vec<ExpenseSummary>,
    pub expense_by_category_summary: Vec<ExpenseByCategorySummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub name: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_product_timestamps_parse() {
        let product: Product = serde_json::from_value(json!({
            "productId": "p-1",
            "name": "Shoe A",
            "price": 12.5,
            "rating": null,
            "stockQuantity": 7,
            "createdAt": "2024-06-15T10:30:00.000Z"
        }))
        .unwrap();

        assert_eq!(product.rating, None);
        assert!(product.created_at.is_some());
        assert!(product.updated_at.is_none());
    }

    #[test]
    fn test_expense_summary_keeps_payload_field_name() {
        let summary: ExpenseSummary = serde_json::from_value(json!({
            "expenseSummarId": "e-1",
            "totalExpenses": 100.0,
            "date": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(summary.expense_summary_id, "e-1");
        let back = serde_json::to_value(&summary).unwrap();
        assert!(back.get("expenseSummarId").is_some());
    }

    #[test]
    fn test_patch_skips_absent_fields() {
        let patch = ProductPatch {
            price: Some(9.99),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({ "price": 9.99 }));
        assert!(!patch.is_empty());
        assert!(ProductPatch::default().is_empty());
    }

    #[test]
    fn test_dashboard_metrics_parse() {
        let metrics: DashboardMetrics = serde_json::from_value(json!({
            "popularProducts": [],
            "salesSummary": [{
                "salesSummaryId": "s-1",
                "totalValue": 10.0,
                "changePercentage": 2.5,
                "date": "2024-01-01T00:00:00Z"
            }],
            "purchaseSummary": [],
            "expenseSummary": [],
            "expenseByCategorySummary": [{
                "expenseByCategorySummaryId": "c-1",
                "category": "Office",
                "amount": "120",
                "date": "2024-01-01T00:00:00Z"
            }]
        }))
        .unwrap();

        assert_eq!(metrics.sales_summary[0].change_percentage, Some(2.5));
        assert_eq!(metrics.expense_by_category_summary[0].amount, "120");
    }
}
