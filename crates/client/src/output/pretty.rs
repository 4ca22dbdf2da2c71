//! Pretty output formatting.

use stockroom_cache::Snapshot;
use stockroom_core::inventory::{DashboardMetrics, ExpenseByCategorySummary, Product, User};

/// Format a product for display.
pub fn format_product(product: &Product) -> String {
    let mut output = format!(
        "{} (${:.2})\n  ID: {}\n  Stock: {}",
        product.name, product.price, product.product_id, product.stock_quantity
    );
    if let Some(rating) = product.rating {
        output.push_str(&format!("\n  Rating: {:.1}", rating));
    }
    output
}

/// Format products for display.
pub fn format_products(products: &[Product]) -> String {
    if products.is_empty() {
        return "No products found.".to_string();
    }
    let mut output = format!("PRODUCTS ({})\n", products.len());
    output.push_str(&"-".repeat(40));
    for product in products {
        output.push_str(&format!("\n{}", format_product(product)));
        output.push('\n');
    }
    output
}

/// Format a user for display.
pub fn format_user(user: &User) -> String {
    format!("{}\n  ID: {}\n  Email: {}", user.name, user.user_id, user.email)
}

/// Format users for display.
pub fn format_users(users: &[User]) -> String {
    if users.is_empty() {
        return "No users found.".to_string();
    }
    let mut output = format!("USERS ({})\n", users.len());
    output.push_str(&"-".repeat(40));
    for user in users {
        output.push_str(&format!("\n{}", format_user(user)));
        output.push('\n');
    }
    output
}

/// Format expenses by category for display.
pub fn format_expenses(expenses: &[ExpenseByCategorySummary]) -> String {
    if expenses.is_empty() {
        return "No expenses found.".to_string();
    }
    let mut output = format!("EXPENSES ({})\n", expenses.len());
    output.push_str(&"-".repeat(40));
    for expense in expenses {
        output.push_str(&format!(
            "\n{}: {} ({})",
            expense.category,
            expense.amount,
            expense.date.format("%Y-%m-%d")
        ));
    }
    output
}

/// Format dashboard metrics for display.
pub fn format_dashboard(metrics: &DashboardMetrics) -> String {
    let mut output = String::from("DASHBOARD\n");
    output.push_str(&"-".repeat(40));

    output.push_str(&format!(
        "\nPopular products: {}",
        metrics.popular_products.len()
    ));
    for product in metrics.popular_products.iter().take(5) {
        output.push_str(&format!("\n  {} (stock {})", product.name, product.stock_quantity));
    }
    if let Some(latest) = metrics.sales_summary.last() {
        output.push_str(&format!(
            "\nLatest sales: {:.2} on {}",
            latest.total_value,
            latest.date.format("%Y-%m-%d")
        ));
    }
    if let Some(latest) = metrics.purchase_summary.last() {
        output.push_str(&format!(
            "\nLatest purchases: {:.2} on {}",
            latest.total_purchased,
            latest.date.format("%Y-%m-%d")
        ));
    }
    if let Some(latest) = metrics.expense_summary.last() {
        output.push_str(&format!(
            "\nLatest expenses: {:.2} on {}",
            latest.total_expenses,
            latest.date.format("%Y-%m-%d")
        ));
    }
    output
}

/// One line per subscription snapshot.
pub fn format_snapshot(snapshot: &Snapshot) -> String {
    let mut output = format!("[{}]", snapshot.status);
    if let Some(error) = &snapshot.error {
        match error.status {
            Some(status) => output.push_str(&format!(" {} {}", status, error.message)),
            None => output.push_str(&format!(" {}", error.message)),
        }
    }
    if let Some(value) = &snapshot.value {
        match value.as_array() {
            Some(items) => output.push_str(&format!(" {} item(s)", items.len())),
            None => output.push_str(&format!(" {}", value)),
        }
    }
    output
}
