//! Customer and order creation
//!
//! Customers and orders are immutable once created; identifiers are assigned by
//! SQLite AUTOINCREMENT and never reused.

use curtain_common::db::{Customer, Order};
use curtain_common::{Error, Result};
use sqlx::SqlitePool;

use super::require_field;

/// Register a customer (Marketing)
pub async fn create_customer(pool: &SqlitePool, name: &str, phone: &str) -> Result<Customer> {
    let name = require_field("customer_name", name)?;
    let phone = require_field("phone_no", phone)?;

    let customer_id = sqlx::query("INSERT INTO customer (customer_name, phone_no) VALUES (?, ?)")
        .bind(name)
        .bind(phone)
        .execute(pool)
        .await?
        .last_insert_rowid();

    Ok(Customer {
        customer_id,
        customer_name: name.to_string(),
        phone_no: phone.to_string(),
    })
}

/// Place an order for an existing customer (Salesperson)
///
/// Fails with `NotFound` before inserting anything when the customer is unknown.
pub async fn create_order(
    pool: &SqlitePool,
    customer_id: i64,
    order_type: &str,
    quantity: i64,
    address: &str,
) -> Result<Order> {
    let order_type = require_field("type", order_type)?;
    let address = require_field("address", address)?;
    if quantity <= 0 {
        return Err(Error::ValidationFailed(format!(
            "quantity must be a positive integer, got {}",
            quantity
        )));
    }

    let mut tx = pool.begin().await?;

    let customer_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM customer WHERE customer_id = ?)")
            .bind(customer_id)
            .fetch_one(&mut *tx)
            .await?;
    if !customer_exists {
        return Err(Error::NotFound(format!("customer {}", customer_id)));
    }

    let order_id = sqlx::query(
        "INSERT INTO orders (customer_id, type, quantity, address) VALUES (?, ?, ?, ?)",
    )
    .bind(customer_id)
    .bind(order_type)
    .bind(quantity)
    .bind(address)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    tx.commit().await?;

    Ok(Order {
        order_id,
        customer_id,
        order_type: order_type.to_string(),
        quantity,
        address: address.to_string(),
    })
}

/// Load an order by id
pub async fn get_order(pool: &SqlitePool, order_id: i64) -> Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(
        "SELECT order_id, customer_id, type, quantity, address FROM orders WHERE order_id = ?",
    )
    .bind(order_id)
    .fetch_optional(pool)
    .await?;

    Ok(order)
}
