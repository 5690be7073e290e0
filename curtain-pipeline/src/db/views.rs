//! Pipeline read views
//!
//! Every view joins Order -> Customer and left-joins whichever stage tables the role
//! needs, ordered by `order_id` descending. A missing stage record surfaces as
//! `None` fields; the order row is never dropped, except by the Delivery view,
//! which only lists orders marked ready.

use chrono::NaiveDate;
use curtain_common::api::Role;
use curtain_common::db::Customer;
use curtain_common::Result;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

// ========================================
// Row types
// ========================================

/// Salesperson row: order with its customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SalesRow {
    pub order_id: i64,
    pub customer_name: String,
    pub phone_no: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub order_type: String,
    pub quantity: i64,
    pub address: String,
}

/// Order picker entry used when recording a measurement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderPick {
    pub order_id: i64,
    pub customer_name: String,
    pub phone_no: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MeasurementRow {
    pub order_id: i64,
    pub customer_name: String,
    pub phone_no: String,
    pub address: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub order_type: String,
    pub quantity: i64,
    pub shade: Option<String>,
    pub dimensions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ManufacturerRow {
    pub order_id: i64,
    pub customer_name: String,
    pub phone_no: String,
    pub address: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub order_type: String,
    pub quantity: i64,
    pub shade: Option<String>,
    pub dimensions: Option<String>,
    pub ready: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeliveryRow {
    pub order_id: i64,
    pub customer_name: String,
    pub phone_no: String,
    pub address: String,
    pub ready: Option<String>,
    pub status: Option<String>,
    pub date: Option<String>,
}

/// Owner row: a customer, optionally with one of their orders and its stages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OwnerRow {
    pub customer_name: String,
    pub phone_no: String,
    pub order_id: Option<i64>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub order_type: Option<String>,
    pub quantity: Option<i64>,
    pub address: Option<String>,
    pub shade: Option<String>,
    pub dimensions: Option<String>,
    pub ready: Option<String>,
    pub delivery_status: Option<String>,
    pub delivery_date: Option<String>,
}

// ========================================
// Views
// ========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketingView {
    pub customers: Vec<Customer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalespersonView {
    pub orders: Vec<SalesRow>,
    pub customers: Vec<Customer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementView {
    pub records: Vec<MeasurementRow>,
    pub orders: Vec<OrderPick>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManufacturerView {
    pub records: Vec<ManufacturerRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryView {
    pub records: Vec<DeliveryRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerView {
    pub records: Vec<OwnerRow>,
}

/// A role's view, tagged with the role on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum PipelineView {
    Marketing(MarketingView),
    Salesperson(SalespersonView),
    Measurement(MeasurementView),
    Manufacturer(ManufacturerView),
    Delivery(DeliveryView),
    Owner(OwnerView),
}

impl PipelineView {
    /// Number of primary rows (customers for Marketing, orders/records otherwise)
    pub fn row_count(&self) -> usize {
        match self {
            PipelineView::Marketing(v) => v.customers.len(),
            PipelineView::Salesperson(v) => v.orders.len(),
            PipelineView::Measurement(v) => v.records.len(),
            PipelineView::Manufacturer(v) => v.records.len(),
            PipelineView::Delivery(v) => v.records.len(),
            PipelineView::Owner(v) => v.records.len(),
        }
    }
}

/// Owner dashboard narrowing; the default filter returns everything
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerFilter {
    /// Case-insensitive substring of customer name, phone, order type or address
    pub search: Option<String>,
    /// Inclusive lower bound on the delivery date
    pub delivered_from: Option<NaiveDate>,
    /// Inclusive upper bound on the delivery date
    pub delivered_to: Option<NaiveDate>,
}

impl OwnerFilter {
    fn like_pattern(&self) -> Option<String> {
        let term = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty())?;
        let escaped = term
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        Some(format!("%{}%", escaped))
    }
}

/// Load the view a role works from
pub async fn load_view(pool: &SqlitePool, role: Role, filter: &OwnerFilter) -> Result<PipelineView> {
    let view = match role {
        Role::Marketing => PipelineView::Marketing(marketing_view(pool).await?),
        Role::Salesperson => PipelineView::Salesperson(salesperson_view(pool).await?),
        Role::Measurement => PipelineView::Measurement(measurement_view(pool).await?),
        Role::Manufacturer => PipelineView::Manufacturer(manufacturer_view(pool).await?),
        Role::Delivery => PipelineView::Delivery(delivery_view(pool).await?),
        Role::Owner => PipelineView::Owner(owner_view(pool, filter).await?),
    };
    Ok(view)
}

async fn list_customers(pool: &SqlitePool) -> Result<Vec<Customer>> {
    let customers = sqlx::query_as::<_, Customer>(
        "SELECT customer_id, customer_name, phone_no FROM customer ORDER BY customer_id DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(customers)
}

pub async fn marketing_view(pool: &SqlitePool) -> Result<MarketingView> {
    Ok(MarketingView {
        customers: list_customers(pool).await?,
    })
}

pub async fn salesperson_view(pool: &SqlitePool) -> Result<SalespersonView> {
    let orders = sqlx::query_as::<_, SalesRow>(
        r#"
        SELECT o.order_id, c.customer_name, c.phone_no, o.type, o.quantity, o.address
        FROM orders o
        JOIN customer c ON o.customer_id = c.customer_id
        ORDER BY o.order_id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(SalespersonView {
        orders,
        customers: list_customers(pool).await?,
    })
}

pub async fn measurement_view(pool: &SqlitePool) -> Result<MeasurementView> {
    let records = sqlx::query_as::<_, MeasurementRow>(
        r#"
        SELECT o.order_id, c.customer_name, c.phone_no, o.address, o.type, o.quantity,
               m.shade, m.dimensions
        FROM orders o
        JOIN customer c ON o.customer_id = c.customer_id
        LEFT JOIN measurement m ON o.order_id = m.order_id
        ORDER BY o.order_id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let orders = sqlx::query_as::<_, OrderPick>(
        r#"
        SELECT o.order_id, c.customer_name, c.phone_no
        FROM orders o
        JOIN customer c ON o.customer_id = c.customer_id
        ORDER BY o.order_id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(MeasurementView { records, orders })
}

pub async fn manufacturer_view(pool: &SqlitePool) -> Result<ManufacturerView> {
    let records = sqlx::query_as::<_, ManufacturerRow>(
        r#"
        SELECT o.order_id, c.customer_name, c.phone_no, o.address, o.type, o.quantity,
               m.shade, m.dimensions, mf.ready
        FROM orders o
        JOIN customer c ON o.customer_id = c.customer_id
        LEFT JOIN measurement m ON o.order_id = m.order_id
        LEFT JOIN manufacturing_status mf ON o.order_id = mf.order_id
        ORDER BY o.order_id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(ManufacturerView { records })
}

/// Orders ready for delivery (manufacturing marked "Yes")
pub async fn delivery_view(pool: &SqlitePool) -> Result<DeliveryView> {
    let records = sqlx::query_as::<_, DeliveryRow>(
        r#"
        SELECT o.order_id, c.customer_name, c.phone_no, o.address,
               mf.ready, d.status, d.date
        FROM orders o
        JOIN customer c ON o.customer_id = c.customer_id
        LEFT JOIN manufacturing_status mf ON o.order_id = mf.order_id
        LEFT JOIN delivery d ON o.order_id = d.order_id
        WHERE mf.ready = 'Yes'
        ORDER BY o.order_id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(DeliveryView { records })
}

/// Superset view across all five record kinds
///
/// Customers without orders are included with empty order fields and sort after
/// every order (NULL order_id sorts last under DESC).
pub async fn owner_view(pool: &SqlitePool, filter: &OwnerFilter) -> Result<OwnerView> {
    let records = sqlx::query_as::<_, OwnerRow>(
        r#"
        SELECT c.customer_name, c.phone_no,
               o.order_id, o.type, o.quantity, o.address,
               m.shade, m.dimensions,
               mf.ready,
               d.status AS delivery_status,
               d.date AS delivery_date
        FROM customer c
        LEFT JOIN orders o ON c.customer_id = o.customer_id
        LEFT JOIN measurement m ON o.order_id = m.order_id
        LEFT JOIN manufacturing_status mf ON o.order_id = mf.order_id
        LEFT JOIN delivery d ON o.order_id = d.order_id
        WHERE (?1 IS NULL
               OR c.customer_name LIKE ?1 ESCAPE '\'
               OR c.phone_no LIKE ?1 ESCAPE '\'
               OR o.type LIKE ?1 ESCAPE '\'
               OR o.address LIKE ?1 ESCAPE '\')
          AND (?2 IS NULL OR d.date >= ?2)
          AND (?3 IS NULL OR d.date <= ?3)
        ORDER BY o.order_id DESC, c.customer_id DESC
        "#,
    )
    .bind(filter.like_pattern())
    .bind(filter.delivered_from.map(|d| d.format("%Y-%m-%d").to_string()))
    .bind(filter.delivered_to.map(|d| d.format("%Y-%m-%d").to_string()))
    .fetch_all(pool)
    .await?;

    Ok(OwnerView { records })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::intake::{create_customer, create_order};
    use crate::db::stages::{upsert_delivery, upsert_manufacturing_status, upsert_measurement};
    use crate::db::test_support::temp_pool;
    use curtain_common::db::ReadyState;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Two customers, three orders; only the newest order has any stage data
    async fn seed(pool: &SqlitePool) -> (i64, i64, i64) {
        let asha = create_customer(pool, "Asha", "555-0100").await.unwrap();
        let ravi = create_customer(pool, "Ravi", "555-0101").await.unwrap();
        let o1 = create_order(pool, asha.customer_id, "blackout", 2, "12 Oak St")
            .await
            .unwrap();
        let o2 = create_order(pool, ravi.customer_id, "sheer", 4, "9 Elm Rd")
            .await
            .unwrap();
        let o3 = create_order(pool, asha.customer_id, "roman", 1, "12 Oak St")
            .await
            .unwrap();
        upsert_measurement(pool, o3.order_id, "charcoal", "120x200").await.unwrap();
        (o1.order_id, o2.order_id, o3.order_id)
    }

    #[tokio::test]
    async fn test_marketing_view_newest_first() {
        let (_dir, pool) = temp_pool().await;
        create_customer(&pool, "Asha", "555-0100").await.unwrap();
        create_customer(&pool, "Ravi", "555-0101").await.unwrap();

        let view = marketing_view(&pool).await.unwrap();

        let names: Vec<_> = view.customers.iter().map(|c| c.customer_name.as_str()).collect();
        assert_eq!(names, vec!["Ravi", "Asha"]);
    }

    #[tokio::test]
    async fn test_salesperson_view_lists_orders_and_customers() {
        let (_dir, pool) = temp_pool().await;
        let (o1, o2, o3) = seed(&pool).await;

        let view = salesperson_view(&pool).await.unwrap();

        let ids: Vec<_> = view.orders.iter().map(|r| r.order_id).collect();
        assert_eq!(ids, vec![o3, o2, o1]);
        assert_eq!(view.orders[1].customer_name, "Ravi");
        assert_eq!(view.orders[1].order_type, "sheer");
        assert_eq!(view.customers.len(), 2);
    }

    #[tokio::test]
    async fn test_measurement_view_keeps_orders_without_measurement() {
        let (_dir, pool) = temp_pool().await;
        let (o1, _o2, o3) = seed(&pool).await;

        let view = measurement_view(&pool).await.unwrap();

        assert_eq!(view.records.len(), 3);
        assert_eq!(view.orders.len(), 3);
        let newest = &view.records[0];
        assert_eq!(newest.order_id, o3);
        assert_eq!(newest.shade.as_deref(), Some("charcoal"));
        let oldest = view.records.iter().find(|r| r.order_id == o1).unwrap();
        assert_eq!(oldest.shade, None);
        assert_eq!(oldest.dimensions, None);
    }

    #[tokio::test]
    async fn test_manufacturer_view_shows_absent_ready() {
        let (_dir, pool) = temp_pool().await;
        let (o1, _o2, _o3) = seed(&pool).await;
        upsert_manufacturing_status(&pool, o1, ReadyState::No).await.unwrap();

        let view = manufacturer_view(&pool).await.unwrap();

        assert_eq!(view.records.len(), 3);
        let first = view.records.iter().find(|r| r.order_id == o1).unwrap();
        assert_eq!(first.ready.as_deref(), Some("No"));
        assert!(view.records.iter().filter(|r| r.ready.is_none()).count() == 2);
    }

    #[tokio::test]
    async fn test_delivery_view_only_ready_orders() {
        let (_dir, pool) = temp_pool().await;
        let (o1, o2, o3) = seed(&pool).await;
        upsert_manufacturing_status(&pool, o1, ReadyState::No).await.unwrap();
        upsert_manufacturing_status(&pool, o2, ReadyState::Yes).await.unwrap();

        let view = delivery_view(&pool).await.unwrap();
        let ids: Vec<_> = view.records.iter().map(|r| r.order_id).collect();
        assert_eq!(ids, vec![o2]);

        upsert_manufacturing_status(&pool, o3, ReadyState::Yes).await.unwrap();
        let view = delivery_view(&pool).await.unwrap();
        let ids: Vec<_> = view.records.iter().map(|r| r.order_id).collect();
        assert_eq!(ids, vec![o3, o2]);
    }

    #[tokio::test]
    async fn test_owner_view_includes_customers_without_orders_last() {
        let (_dir, pool) = temp_pool().await;
        let (_o1, _o2, o3) = seed(&pool).await;
        create_customer(&pool, "Meera", "555-0102").await.unwrap();

        let view = owner_view(&pool, &OwnerFilter::default()).await.unwrap();

        assert_eq!(view.records.len(), 4);
        assert_eq!(view.records[0].order_id, Some(o3));
        let last = view.records.last().unwrap();
        assert_eq!(last.customer_name, "Meera");
        assert_eq!(last.order_id, None);
    }

    #[tokio::test]
    async fn test_owner_view_search_filter() {
        let (_dir, pool) = temp_pool().await;
        let (_o1, o2, _o3) = seed(&pool).await;

        let by_name = OwnerFilter {
            search: Some("ravi".to_string()),
            ..Default::default()
        };
        let view = owner_view(&pool, &by_name).await.unwrap();
        assert_eq!(view.records.len(), 1);
        assert_eq!(view.records[0].order_id, Some(o2));

        let by_address = OwnerFilter {
            search: Some("Oak".to_string()),
            ..Default::default()
        };
        assert_eq!(owner_view(&pool, &by_address).await.unwrap().records.len(), 2);

        // LIKE wildcards in the search text are literal
        let wildcard = OwnerFilter {
            search: Some("%".to_string()),
            ..Default::default()
        };
        assert!(owner_view(&pool, &wildcard).await.unwrap().records.is_empty());

        let blank = OwnerFilter {
            search: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(owner_view(&pool, &blank).await.unwrap().records.len(), 3);
    }

    #[tokio::test]
    async fn test_owner_view_delivery_date_range() {
        let (_dir, pool) = temp_pool().await;
        let (o1, o2, _o3) = seed(&pool).await;
        upsert_delivery(&pool, o1, "Delivered", day(2026, 10, 1)).await.unwrap();
        upsert_delivery(&pool, o2, "Delivered", day(2026, 10, 15)).await.unwrap();

        let filter = OwnerFilter {
            delivered_from: Some(day(2026, 10, 10)),
            delivered_to: Some(day(2026, 10, 31)),
            ..Default::default()
        };
        let view = owner_view(&pool, &filter).await.unwrap();

        assert_eq!(view.records.len(), 1);
        assert_eq!(view.records[0].order_id, Some(o2));
        assert_eq!(view.records[0].delivery_date.as_deref(), Some("2026-10-15"));
    }

    #[tokio::test]
    async fn test_owner_view_is_superset_of_delivery_view() {
        let (_dir, pool) = temp_pool().await;
        let (o1, o2, _o3) = seed(&pool).await;
        upsert_manufacturing_status(&pool, o1, ReadyState::Yes).await.unwrap();
        upsert_manufacturing_status(&pool, o2, ReadyState::Yes).await.unwrap();

        let owner = load_view(&pool, Role::Owner, &OwnerFilter::default()).await.unwrap();
        let delivery = load_view(&pool, Role::Delivery, &OwnerFilter::default()).await.unwrap();

        assert!(owner.row_count() >= delivery.row_count());
        assert_eq!(delivery.row_count(), 2);
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        let filter = OwnerFilter {
            search: Some(" 50%_off ".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.like_pattern().as_deref(), Some("%50\\%\\_off%"));
    }
}
