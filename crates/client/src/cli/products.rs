//! Product CLI commands.

use clap::{Parser, Subcommand};
use stockroom_core::inventory::{NewProduct, ProductPatch};

/// Product management commands.
#[derive(Debug, Parser)]
pub struct ProductsCommand {
    #[command(subcommand)]
    pub action: ProductsAction,
}

/// Available product actions.
#[derive(Debug, Subcommand)]
pub enum ProductsAction {
    /// List products.
    List {
        /// Filter by name.
        #[arg(long)]
        search: Option<String>,
    },
    /// Create a new product.
    Create {
        /// Product name.
        #[arg(long)]
        name: String,
        /// Unit price.
        #[arg(long)]
        price: f64,
        /// Units in stock.
        #[arg(long)]
        stock_quantity: i64,
        /// Optional rating.
        #[arg(long)]
        rating: Option<f64>,
    },
    /// Update a product.
    Update {
        /// Product ID.
        id: String,
        /// New name.
        #[arg(long)]
        name: Option<String>,
        /// New price.
        #[arg(long)]
        price: Option<f64>,
        /// New stock quantity.
        #[arg(long)]
        stock_quantity: Option<i64>,
        /// New rating.
        #[arg(long)]
        rating: Option<f64>,
    },
    /// Delete a product.
    Delete {
        /// Product ID.
        id: String,
    },
}

pub fn new_product(name: String, price: f64, stock_quantity: i64, rating: Option<f64>) -> NewProduct {
    NewProduct {
        name,
        price,
        rating,
        stock_quantity,
    }
}

pub fn product_patch(
    name: Option<String>,
    price: Option<f64>,
    stock_quantity: Option<i64>,
    rating: Option<f64>,
) -> ProductPatch {
    ProductPatch {
        name,
        price,
        rating,
        stock_quantity,
    }
}
