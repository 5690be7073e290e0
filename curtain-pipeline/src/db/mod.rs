//! Store operations for the order fulfillment pipeline
//!
//! - `intake`: customer and order creation
//! - `stages`: per-order stage upserts (measurement, manufacturing, delivery)
//! - `views`: role-scoped read joins

use curtain_common::{Error, Result};
use sqlx::SqliteConnection;

pub mod intake;
pub mod stages;
pub mod views;

/// Trimmed value of a required text field, or `ValidationFailed` when blank
pub fn require_field<'a>(name: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::ValidationFailed(format!("{} is required", name)));
    }
    Ok(trimmed)
}

/// `NotFound` unless the order exists
pub(crate) async fn ensure_order_exists(conn: &mut SqliteConnection, order_id: i64) -> Result<()> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM orders WHERE order_id = ?)")
        .bind(order_id)
        .fetch_one(&mut *conn)
        .await?;

    if !exists {
        return Err(Error::NotFound(format!("order {}", order_id)));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use curtain_common::config::DatabaseConfig;
    use curtain_common::db::init_database;
    use sqlx::SqlitePool;
    use tempfile::TempDir;

    /// File-backed database in a temp dir; keep the TempDir alive for the test
    pub async fn temp_pool() -> (TempDir, SqlitePool) {
        let temp_dir = TempDir::new().expect("temp dir");
        let db_path = temp_dir.path().join("curtain.db");
        let pool = init_database(&db_path, &DatabaseConfig::default())
            .await
            .expect("init database");
        (temp_dir, pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_field_trims() {
        assert_eq!(require_field("shade", "  charcoal ").unwrap(), "charcoal");
    }

    #[test]
    fn test_require_field_rejects_blank() {
        match require_field("shade", " \t") {
            Err(Error::ValidationFailed(msg)) => assert_eq!(msg, "shade is required"),
            other => panic!("expected ValidationFailed, got {:?}", other),
        }
    }
}
