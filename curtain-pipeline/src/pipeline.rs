//! Pipeline service
//!
//! Every operation runs the same sequence: ask the Role Gate, perform the store
//! write (retried while the store is busy), then recompute the acting role's view.
//! Nothing touches the store before the gate has answered.

use std::sync::Arc;

use chrono::Local;
use curtain_common::api::{Role, RoleGate};
use curtain_common::db::{Customer, DeliveryRecord, ManufacturingStatus, Measurement, Order, ReadyState};
use curtain_common::retry::retry_on_busy;
use curtain_common::{Error, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::db::views::{
    self, DeliveryView, ManufacturerView, MarketingView, MeasurementView, OwnerFilter,
    OwnerView, PipelineView, SalespersonView,
};
use crate::db::{intake, stages};

/// A write result together with the acting role's refreshed view
#[derive(Debug, Clone, Serialize)]
pub struct Submitted<R, V> {
    pub record: R,
    pub view: V,
}

/// Gated access to the order pipeline
#[derive(Clone)]
pub struct Pipeline {
    db: SqlitePool,
    gate: Arc<dyn RoleGate>,
    max_lock_wait_ms: u64,
}

impl Pipeline {
    pub fn new(db: SqlitePool, gate: Arc<dyn RoleGate>, max_lock_wait_ms: u64) -> Self {
        Self {
            db,
            gate,
            max_lock_wait_ms,
        }
    }

    pub fn db(&self) -> &SqlitePool {
        &self.db
    }

    /// `Denied` unless the gate allows `role` with `credential`
    pub fn authorize(&self, role: Role, credential: &str) -> Result<()> {
        if self.gate.authorize(role, credential).is_allowed() {
            debug!(%role, "Role gate allowed request");
            Ok(())
        } else {
            warn!(%role, "Role gate denied request");
            Err(Error::Denied(format!("access denied for role '{}'", role)))
        }
    }

    // ========================================
    // Writes
    // ========================================

    pub async fn create_customer(
        &self,
        credential: &str,
        name: &str,
        phone: &str,
    ) -> Result<Submitted<Customer, MarketingView>> {
        self.authorize(Role::Marketing, credential)?;

        let db = &self.db;
        let customer = self
            .with_retry("create_customer", move || {
                intake::create_customer(db, name, phone)
            })
            .await?;
        info!(customer_id = customer.customer_id, "Customer created");

        let view = self
            .with_retry("marketing_view", move || views::marketing_view(db))
            .await?;
        Ok(Submitted {
            record: customer,
            view,
        })
    }

    pub async fn create_order(
        &self,
        credential: &str,
        customer_id: i64,
        order_type: &str,
        quantity: i64,
        address: &str,
    ) -> Result<Submitted<Order, SalespersonView>> {
        self.authorize(Role::Salesperson, credential)?;

        let db = &self.db;
        let order = self
            .with_retry("create_order", move || {
                intake::create_order(db, customer_id, order_type, quantity, address)
            })
            .await?;
        info!(order_id = order.order_id, customer_id, "Order created");

        let view = self
            .with_retry("salesperson_view", move || views::salesperson_view(db))
            .await?;
        Ok(Submitted {
            record: order,
            view,
        })
    }

    pub async fn upsert_measurement(
        &self,
        credential: &str,
        order_id: i64,
        shade: &str,
        dimensions: &str,
    ) -> Result<Submitted<Measurement, MeasurementView>> {
        self.authorize(Role::Measurement, credential)?;

        let db = &self.db;
        let record = self
            .with_retry("upsert_measurement", move || {
                stages::upsert_measurement(db, order_id, shade, dimensions)
            })
            .await?;
        info!(order_id, "Measurement recorded");

        let view = self
            .with_retry("measurement_view", move || views::measurement_view(db))
            .await?;
        Ok(Submitted { record, view })
    }

    /// `ready` must be exactly "Yes" or "No"
    pub async fn upsert_manufacturing_status(
        &self,
        credential: &str,
        order_id: i64,
        ready: &str,
    ) -> Result<Submitted<ManufacturingStatus, ManufacturerView>> {
        self.authorize(Role::Manufacturer, credential)?;
        let ready: ReadyState = ready.parse()?;

        let db = &self.db;
        let record = self
            .with_retry("upsert_manufacturing_status", move || {
                stages::upsert_manufacturing_status(db, order_id, ready)
            })
            .await?;
        info!(order_id, %ready, "Manufacturing status recorded");

        let view = self
            .with_retry("manufacturer_view", move || views::manufacturer_view(db))
            .await?;
        Ok(Submitted { record, view })
    }

    /// Stamps today's local date when `status` is "Delivered"
    pub async fn upsert_delivery(
        &self,
        credential: &str,
        order_id: i64,
        status: &str,
    ) -> Result<Submitted<DeliveryRecord, DeliveryView>> {
        self.authorize(Role::Delivery, credential)?;
        let today = Local::now().date_naive();

        let db = &self.db;
        let record = self
            .with_retry("upsert_delivery", move || {
                stages::upsert_delivery(db, order_id, status, today)
            })
            .await?;
        info!(order_id, status = %record.status, date = ?record.date, "Delivery recorded");

        let view = self
            .with_retry("delivery_view", move || views::delivery_view(db))
            .await?;
        Ok(Submitted { record, view })
    }

    // ========================================
    // Reads
    // ========================================

    /// The view `role` works from; the Owner view is unfiltered
    pub async fn view(&self, role: Role, credential: &str) -> Result<PipelineView> {
        self.authorize(role, credential)?;

        let db = &self.db;
        let filter = OwnerFilter::default();
        let filter = &filter;
        self.with_retry("load_view", move || views::load_view(db, role, filter))
            .await
    }

    pub async fn owner_view(&self, credential: &str, filter: &OwnerFilter) -> Result<OwnerView> {
        self.authorize(Role::Owner, credential)?;

        let db = &self.db;
        self.with_retry("owner_view", move || views::owner_view(db, filter))
            .await
    }

    async fn with_retry<F, Fut, T>(&self, operation_name: &str, operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        retry_on_busy(operation_name, self.max_lock_wait_ms, operation).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curtain_common::api::{CredentialGate, OpenGate};
    use curtain_common::config::DatabaseConfig;
    use curtain_common::db::init_database;
    use tempfile::TempDir;

    async fn pipeline_with(gate: Arc<dyn RoleGate>) -> (TempDir, Pipeline) {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_database(&temp_dir.path().join("curtain.db"), &DatabaseConfig::default())
            .await
            .unwrap();
        (temp_dir, Pipeline::new(pool, gate, 1000))
    }

    #[tokio::test]
    async fn test_denied_write_leaves_store_untouched() {
        let gate = CredentialGate::new().with_credential(Role::Marketing, "MKT123");
        let (_dir, pipeline) = pipeline_with(Arc::new(gate)).await;

        let result = pipeline.create_customer("wrong", "Asha", "555-0100").await;

        assert!(matches!(result, Err(Error::Denied(_))));
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customer")
            .fetch_one(pipeline.db())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_gate_checked_before_validation() {
        let gate = CredentialGate::new().with_credential(Role::Manufacturer, "MFG123");
        let (_dir, pipeline) = pipeline_with(Arc::new(gate)).await;

        // Bad credential and bad input: the gate answers first
        let result = pipeline.upsert_manufacturing_status("nope", 1, "maybe").await;
        assert!(matches!(result, Err(Error::Denied(_))));

        let result = pipeline.upsert_manufacturing_status("MFG123", 1, "maybe").await;
        assert!(matches!(result, Err(Error::ValidationFailed(_))));
    }

    #[tokio::test]
    async fn test_write_returns_refreshed_view() {
        let (_dir, pipeline) = pipeline_with(Arc::new(OpenGate)).await;

        let first = pipeline.create_customer("", "Asha", "555-0100").await.unwrap();
        let second = pipeline.create_customer("", "Ravi", "555-0101").await.unwrap();

        assert_eq!(first.view.customers.len(), 1);
        assert_eq!(second.view.customers.len(), 2);
        assert_eq!(second.view.customers[0], second.record);
    }

    #[tokio::test]
    async fn test_view_is_gated_per_role() {
        let gate = CredentialGate::new()
            .with_credential(Role::Delivery, "DLV123")
            .with_credential(Role::Owner, "OWN123");
        let (_dir, pipeline) = pipeline_with(Arc::new(gate)).await;

        assert!(pipeline.view(Role::Delivery, "DLV123").await.is_ok());
        assert!(matches!(
            pipeline.view(Role::Owner, "DLV123").await,
            Err(Error::Denied(_))
        ));
        let owner = pipeline
            .owner_view("OWN123", &OwnerFilter::default())
            .await
            .unwrap();
        assert!(owner.records.is_empty());
    }

    #[tokio::test]
    async fn test_delivery_stamps_today() {
        let (_dir, pipeline) = pipeline_with(Arc::new(OpenGate)).await;
        let customer = pipeline.create_customer("", "Asha", "555-0100").await.unwrap();
        let order = pipeline
            .create_order("", customer.record.customer_id, "blackout", 2, "12 Oak St")
            .await
            .unwrap();

        let delivered = pipeline
            .upsert_delivery("", order.record.order_id, "Delivered")
            .await
            .unwrap();

        let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
        assert_eq!(delivered.record.date, Some(today));
        // Not ready yet, so the delivery list is empty
        assert!(delivered.view.records.is_empty());
    }
}
