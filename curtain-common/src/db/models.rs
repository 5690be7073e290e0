//! Database models

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Delivery status that stamps a delivery date
pub const DELIVERED_STATUS: &str = "Delivered";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Customer {
    pub customer_id: i64,
    pub customer_name: String,
    pub phone_no: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub order_id: i64,
    pub customer_id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub order_type: String,
    pub quantity: i64,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Measurement {
    pub order_id: i64,
    pub shade: String,
    pub dimensions: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ManufacturingStatus {
    pub order_id: i64,
    pub ready: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeliveryRecord {
    pub order_id: i64,
    pub status: String,
    /// `YYYY-MM-DD`, present only when status is "Delivered"
    pub date: Option<String>,
}

impl DeliveryRecord {
    pub fn is_delivered(&self) -> bool {
        self.status == DELIVERED_STATUS
    }
}

/// Manufacturing readiness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadyState {
    Yes,
    No,
}

impl ReadyState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadyState::Yes => "Yes",
            ReadyState::No => "No",
        }
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReadyState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Yes" => Ok(ReadyState::Yes),
            "No" => Ok(ReadyState::No),
            other => Err(Error::ValidationFailed(format!(
                "ready must be \"Yes\" or \"No\", got {:?}",
                other
            ))),
        }
    }
}
