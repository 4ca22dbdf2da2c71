pub mod endpoints;
mod types;

pub use types::{
    DashboardMetrics, DeleteResponse, ExpenseByCategorySummary, ExpenseSummary, NewProduct,
    Product, ProductPatch, PurchaseSummary, SalesSummary, User,
};
