//! Stage upserts
//!
//! Each stage table is keyed by `order_id`, so at most one record exists per order.
//! Writes use a single `INSERT ... ON CONFLICT(order_id) DO UPDATE` statement, which
//! makes insert-or-replace atomic: two writers racing on the same order leave one
//! row holding whichever write committed last. The order is checked inside the
//! same transaction so a missing order is reported as `NotFound` rather than a
//! foreign key failure.

use chrono::NaiveDate;
use curtain_common::db::{
    DeliveryRecord, ManufacturingStatus, Measurement, ReadyState, DELIVERED_STATUS,
};
use curtain_common::Result;
use sqlx::SqlitePool;

use super::{ensure_order_exists, require_field};

/// Record (or replace) the measurement for an order
pub async fn upsert_measurement(
    pool: &SqlitePool,
    order_id: i64,
    shade: &str,
    dimensions: &str,
) -> Result<Measurement> {
    let shade = require_field("shade", shade)?;
    let dimensions = require_field("dimensions", dimensions)?;

    let mut tx = pool.begin().await?;
    ensure_order_exists(&mut tx, order_id).await?;

    sqlx::query(
        r#"
        INSERT INTO measurement (order_id, shade, dimensions, updated_at)
        VALUES (?, ?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(order_id) DO UPDATE SET
            shade = excluded.shade,
            dimensions = excluded.dimensions,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(order_id)
    .bind(shade)
    .bind(dimensions)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Measurement {
        order_id,
        shade: shade.to_string(),
        dimensions: dimensions.to_string(),
    })
}

/// Record (or replace) manufacturing readiness for an order
pub async fn upsert_manufacturing_status(
    pool: &SqlitePool,
    order_id: i64,
    ready: ReadyState,
) -> Result<ManufacturingStatus> {
    let mut tx = pool.begin().await?;
    ensure_order_exists(&mut tx, order_id).await?;

    sqlx::query(
        r#"
        INSERT INTO manufacturing_status (order_id, ready, updated_at)
        VALUES (?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(order_id) DO UPDATE SET
            ready = excluded.ready,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(order_id)
    .bind(ready.as_str())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(ManufacturingStatus {
        order_id,
        ready: ready.as_str().to_string(),
    })
}

/// Record (or replace) the delivery status for an order
///
/// The date is derived: `today` is stamped when the status is "Delivered", any
/// other status clears it.
pub async fn upsert_delivery(
    pool: &SqlitePool,
    order_id: i64,
    status: &str,
    today: NaiveDate,
) -> Result<DeliveryRecord> {
    let status = require_field("status", status)?;
    let date = delivery_date(status, today);

    let mut tx = pool.begin().await?;
    ensure_order_exists(&mut tx, order_id).await?;

    sqlx::query(
        r#"
        INSERT INTO delivery (order_id, status, date, updated_at)
        VALUES (?, ?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(order_id) DO UPDATE SET
            status = excluded.status,
            date = excluded.date,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(order_id)
    .bind(status)
    .bind(&date)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(DeliveryRecord {
        order_id,
        status: status.to_string(),
        date,
    })
}

fn delivery_date(status: &str, today: NaiveDate) -> Option<String> {
    if status == DELIVERED_STATUS {
        Some(today.format("%Y-%m-%d").to_string())
    } else {
        None
    }
}

pub async fn get_measurement(pool: &SqlitePool, order_id: i64) -> Result<Option<Measurement>> {
    let row = sqlx::query_as::<_, Measurement>(
        "SELECT order_id, shade, dimensions FROM measurement WHERE order_id = ?",
    )
    .bind(order_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn get_manufacturing_status(
    pool: &SqlitePool,
    order_id: i64,
) -> Result<Option<ManufacturingStatus>> {
    let row = sqlx::query_as::<_, ManufacturingStatus>(
        "SELECT order_id, ready FROM manufacturing_status WHERE order_id = ?",
    )
    .bind(order_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn get_delivery(pool: &SqlitePool, order_id: i64) -> Result<Option<DeliveryRecord>> {
    let row = sqlx::query_as::<_, DeliveryRecord>(
        "SELECT order_id, status, date FROM delivery WHERE order_id = ?",
    )
    .bind(order_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}
