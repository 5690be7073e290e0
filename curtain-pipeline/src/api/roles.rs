//! Role endpoints
//!
//! One GET per role returns that role's view; each role's POST performs its
//! pipeline write and answers with the refreshed view.
//!
//! Write handlers take the body as `Result<Json<_>, JsonRejection>` so the Role
//! Gate answers before the body is looked at, and a body that fails to decode is
//! reported as `ValidationFailed` in the usual error envelope.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use curtain_common::api::Role;
use curtain_common::db::{Customer, DeliveryRecord, ManufacturingStatus, Measurement, Order};
use curtain_common::Error;
use serde::{de, Deserialize, Deserializer};

use super::auth::RoleCredential;
use crate::db::views::{
    DeliveryView, ManufacturerView, MarketingView, MeasurementView, OwnerFilter, PipelineView,
    SalespersonView,
};
use crate::error::ApiResult;
use crate::pipeline::Submitted;
use crate::AppState;

// ========================================
// Request bodies
// ========================================

#[derive(Debug, Default, Deserialize)]
pub struct NewCustomer {
    pub customer_name: Option<String>,
    pub phone_no: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NewOrder {
    #[serde(default, deserialize_with = "integer_field")]
    pub customer_id: Option<i64>,
    #[serde(rename = "type")]
    pub order_type: Option<String>,
    #[serde(default, deserialize_with = "integer_field")]
    pub quantity: Option<i64>,
    pub address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MeasurementInput {
    #[serde(default, deserialize_with = "integer_field")]
    pub order_id: Option<i64>,
    pub shade: Option<String>,
    pub dimensions: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ManufacturingInput {
    #[serde(default, deserialize_with = "integer_field")]
    pub order_id: Option<i64>,
    pub ready: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeliveryInput {
    #[serde(default, deserialize_with = "integer_field")]
    pub order_id: Option<i64>,
    pub status: Option<String>,
}

/// Query string for the owner dashboard
#[derive(Debug, Default, Deserialize)]
pub struct OwnerQuery {
    pub search: Option<String>,
    pub delivered_from: Option<NaiveDate>,
    pub delivered_to: Option<NaiveDate>,
}

impl From<OwnerQuery> for OwnerFilter {
    fn from(query: OwnerQuery) -> Self {
        OwnerFilter {
            search: query.search,
            delivered_from: query.delivered_from,
            delivered_to: query.delivered_to,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntegerOrText {
    Integer(i64),
    Text(String),
}

/// Integer field sent either as a JSON number or as its text form (`"2"`)
///
/// Null and blank text are treated as absent.
fn integer_field<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<IntegerOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(IntegerOrText::Integer(value)) => Ok(Some(value)),
        Some(IntegerOrText::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(IntegerOrText::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("expected an integer, got {:?}", text))),
    }
}

/// Unwrap a decoded body; decode failures become `ValidationFailed`
fn decode<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, Error> {
    body.map(|Json(input)| input)
        .map_err(|rejection| Error::ValidationFailed(rejection.body_text()))
}

fn text(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

fn required<T>(name: &str, value: Option<T>) -> Result<T, Error> {
    value.ok_or_else(|| Error::ValidationFailed(format!("{} is required", name)))
}

/// Gate first, so a refused caller never learns which fields were missing
fn gate(state: &AppState, role: Role, credential: &RoleCredential) -> ApiResult<()> {
    state
        .pipeline
        .authorize(role, credential.as_str())
        .map_err(|e| credential.reject(e))
}

async fn role_view(
    state: &AppState,
    role: Role,
    credential: &RoleCredential,
) -> ApiResult<Json<PipelineView>> {
    let view = state
        .pipeline
        .view(role, credential.as_str())
        .await
        .map_err(|e| credential.reject(e))?;
    Ok(Json(view))
}

// ========================================
// Marketing
// ========================================

/// GET /api/marketing
pub async fn marketing_view(
    State(state): State<AppState>,
    credential: RoleCredential,
) -> ApiResult<Json<PipelineView>> {
    role_view(&state, Role::Marketing, &credential).await
}

/// POST /api/marketing/customers
pub async fn create_customer(
    State(state): State<AppState>,
    credential: RoleCredential,
    body: Result<Json<NewCustomer>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Submitted<Customer, MarketingView>>)> {
    gate(&state, Role::Marketing, &credential)?;
    let input = decode(body)?;

    let submitted = state
        .pipeline
        .create_customer(credential.as_str(), text(&input.customer_name), text(&input.phone_no))
        .await
        .map_err(|e| credential.reject(e))?;
    Ok((StatusCode::CREATED, Json(submitted)))
}

// ========================================
// Salesperson
// ========================================

/// GET /api/salesperson
pub async fn salesperson_view(
    State(state): State<AppState>,
    credential: RoleCredential,
) -> ApiResult<Json<PipelineView>> {
    role_view(&state, Role::Salesperson, &credential).await
}

/// POST /api/salesperson/orders
pub async fn create_order(
    State(state): State<AppState>,
    credential: RoleCredential,
    body: Result<Json<NewOrder>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Submitted<Order, SalespersonView>>)> {
    gate(&state, Role::Salesperson, &credential)?;
    let input = decode(body)?;
    let customer_id = required("customer_id", input.customer_id)?;
    let quantity = required("quantity", input.quantity)?;

    let submitted = state
        .pipeline
        .create_order(
            credential.as_str(),
            customer_id,
            text(&input.order_type),
            quantity,
            text(&input.address),
        )
        .await
        .map_err(|e| credential.reject(e))?;
    Ok((StatusCode::CREATED, Json(submitted)))
}

// ========================================
// Measurement
// ========================================

/// GET /api/measurement
pub async fn measurement_view(
    State(state): State<AppState>,
    credential: RoleCredential,
) -> ApiResult<Json<PipelineView>> {
    role_view(&state, Role::Measurement, &credential).await
}

/// POST /api/measurement
pub async fn submit_measurement(
    State(state): State<AppState>,
    credential: RoleCredential,
    body: Result<Json<MeasurementInput>, JsonRejection>,
) -> ApiResult<Json<Submitted<Measurement, MeasurementView>>> {
    gate(&state, Role::Measurement, &credential)?;
    let input = decode(body)?;
    let order_id = required("order_id", input.order_id)?;

    let submitted = state
        .pipeline
        .upsert_measurement(
            credential.as_str(),
            order_id,
            text(&input.shade),
            text(&input.dimensions),
        )
        .await
        .map_err(|e| credential.reject(e))?;
    Ok(Json(submitted))
}

// ========================================
// Manufacturer
// ========================================

/// GET /api/manufacturer
pub async fn manufacturer_view(
    State(state): State<AppState>,
    credential: RoleCredential,
) -> ApiResult<Json<PipelineView>> {
    role_view(&state, Role::Manufacturer, &credential).await
}

/// POST /api/manufacturer
pub async fn submit_manufacturing_status(
    State(state): State<AppState>,
    credential: RoleCredential,
    body: Result<Json<ManufacturingInput>, JsonRejection>,
) -> ApiResult<Json<Submitted<ManufacturingStatus, ManufacturerView>>> {
    gate(&state, Role::Manufacturer, &credential)?;
    let input = decode(body)?;
    let order_id = required("order_id", input.order_id)?;

    let submitted = state
        .pipeline
        .upsert_manufacturing_status(credential.as_str(), order_id, text(&input.ready))
        .await
        .map_err(|e| credential.reject(e))?;
    Ok(Json(submitted))
}

// ========================================
// Delivery
// ========================================

/// GET /api/delivery
pub async fn delivery_view(
    State(state): State<AppState>,
    credential: RoleCredential,
) -> ApiResult<Json<PipelineView>> {
    role_view(&state, Role::Delivery, &credential).await
}

/// POST /api/delivery
pub async fn submit_delivery(
    State(state): State<AppState>,
    credential: RoleCredential,
    body: Result<Json<DeliveryInput>, JsonRejection>,
) -> ApiResult<Json<Submitted<DeliveryRecord, DeliveryView>>> {
    gate(&state, Role::Delivery, &credential)?;
    let input = decode(body)?;
    let order_id = required("order_id", input.order_id)?;

    let submitted = state
        .pipeline
        .upsert_delivery(credential.as_str(), order_id, text(&input.status))
        .await
        .map_err(|e| credential.reject(e))?;
    Ok(Json(submitted))
}

// ========================================
// Owner
// ========================================

/// GET /api/owner?search=&delivered_from=&delivered_to=
pub async fn owner_view(
    State(state): State<AppState>,
    credential: RoleCredential,
    query: Result<Query<OwnerQuery>, QueryRejection>,
) -> ApiResult<Json<PipelineView>> {
    gate(&state, Role::Owner, &credential)?;
    let Query(query) =
        query.map_err(|rejection| Error::ValidationFailed(rejection.body_text()))?;
    let filter = OwnerFilter::from(query);
    let view = state
        .pipeline
        .owner_view(credential.as_str(), &filter)
        .await
        .map_err(|e| credential.reject(e))?;
    Ok(Json(PipelineView::Owner(view)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_order_reads_type_field() {
        let input: NewOrder = serde_json::from_str(
            r#"{"customer_id": 1, "type": "blackout", "quantity": 2, "address": "12 Oak St"}"#,
        )
        .unwrap();
        assert_eq!(input.order_type.as_deref(), Some("blackout"));
        assert_eq!(input.quantity, Some(2));
    }

    #[test]
    fn test_integer_fields_accept_text_form() {
        let input: NewOrder = serde_json::from_str(
            r#"{"customer_id": "7", "type": "sheer", "quantity": " 2 ", "address": "9 Elm Rd"}"#,
        )
        .unwrap();
        assert_eq!(input.customer_id, Some(7));
        assert_eq!(input.quantity, Some(2));

        let blank: DeliveryInput =
            serde_json::from_str(r#"{"order_id": "", "status": "Delivered"}"#).unwrap();
        assert_eq!(blank.order_id, None);

        let null: ManufacturingInput =
            serde_json::from_str(r#"{"order_id": null, "ready": "Yes"}"#).unwrap();
        assert_eq!(null.order_id, None);
    }

    #[test]
    fn test_non_numeric_text_fails_to_decode() {
        let result = serde_json::from_str::<NewOrder>(r#"{"quantity": "two"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_fields_deserialize_as_none() {
        let input: MeasurementInput = serde_json::from_str(r#"{"shade": "charcoal"}"#).unwrap();
        assert_eq!(input.order_id, None);
        assert!(matches!(
            required("order_id", input.order_id),
            Err(Error::ValidationFailed(_))
        ));
        assert_eq!(text(&input.dimensions), "");
    }
}
