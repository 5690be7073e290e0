//! HTTP API handlers for curtain-pipeline

pub mod auth;
pub mod health;
pub mod roles;

pub use auth::{RoleCredential, CREDENTIAL_HEADER};
pub use health::health_routes;
pub use roles::{
    create_customer, create_order, delivery_view, manufacturer_view, marketing_view,
    measurement_view, owner_view, salesperson_view, submit_delivery, submit_manufacturing_status,
    submit_measurement,
};
