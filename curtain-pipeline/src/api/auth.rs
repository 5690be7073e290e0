//! Credential extraction
//!
//! Callers present their role's access code in the `X-Role-Credential` header.
//! The extractor never rejects; the Role Gate decides. A header that is absent,
//! blank or not valid text counts as no credential, and a denial for such a
//! request is reported as 401 instead of 403.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use curtain_common::Error;

use crate::error::ApiError;

pub const CREDENTIAL_HEADER: &str = "x-role-credential";

/// Access code sent with the request, if any
#[derive(Debug, Clone, Default)]
pub struct RoleCredential(pub Option<String>);

impl RoleCredential {
    pub fn as_str(&self) -> &str {
        self.0.as_deref().unwrap_or("")
    }

    /// Convert a pipeline error, turning a denial without any header into 401
    pub fn reject(&self, err: Error) -> ApiError {
        match err {
            Error::Denied(_) if self.0.is_none() => ApiError::MissingCredential(format!(
                "{} header with a non-empty access code is required",
                CREDENTIAL_HEADER
            )),
            other => ApiError::Pipeline(other),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RoleCredential
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let credential = parts
            .headers
            .get(CREDENTIAL_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        Ok(RoleCredential(credential))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request};

    async fn extract(value: Option<HeaderValue>) -> RoleCredential {
        let mut builder = Request::builder().uri("/api/owner");
        if let Some(value) = value {
            builder = builder.header(CREDENTIAL_HEADER, value);
        }
        let (mut parts, _body) = builder.body(()).unwrap().into_parts();
        RoleCredential::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn test_header_value_is_trimmed() {
        let credential = extract(Some(HeaderValue::from_static(" OWN123 "))).await;
        assert_eq!(credential.0.as_deref(), Some("OWN123"));
    }

    #[tokio::test]
    async fn test_blank_and_undecodable_headers_count_as_missing() {
        assert!(extract(None).await.0.is_none());
        assert!(extract(Some(HeaderValue::from_static(""))).await.0.is_none());
        assert!(extract(Some(HeaderValue::from_static("   "))).await.0.is_none());

        let not_text = HeaderValue::from_bytes(b"\xffcode").unwrap();
        let credential = extract(Some(not_text)).await;
        assert!(credential.0.is_none());
        assert!(matches!(
            credential.reject(Error::Denied("owner".into())),
            ApiError::MissingCredential(_)
        ));
    }

    #[test]
    fn test_denial_without_header_is_missing_credential() {
        let err = RoleCredential(None).reject(Error::Denied("owner".into()));
        assert!(matches!(err, ApiError::MissingCredential(_)));
    }

    #[test]
    fn test_denial_with_header_stays_denied() {
        let err = RoleCredential(Some("bad".into())).reject(Error::Denied("owner".into()));
        assert!(matches!(err, ApiError::Pipeline(Error::Denied(_))));
    }

    #[test]
    fn test_other_errors_pass_through() {
        let err = RoleCredential(None).reject(Error::NotFound("order 3".into()));
        assert!(matches!(err, ApiError::Pipeline(Error::NotFound(_))));
    }
}
