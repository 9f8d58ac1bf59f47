//! Request body extractor.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// JSON body where an empty body means "all defaults".
///
/// Unlike `axum::Json`, no content type is required, and a malformed body
/// is reported as a 400 in the gateway's error format.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::InvalidRequest(format!("Failed to read request body: {}", e)))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }

        serde_json::from_slice(&bytes)
            .map(Self)
            .map_err(|e| AppError::InvalidRequest(format!("Invalid JSON body: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::requests::HeadlinesRequest;
    use axum::body::Body;

    async fn extract(body: &'static str) -> std::result::Result<HeadlinesRequest, AppError> {
        let req = Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from(body))
            .unwrap();
        JsonBody::<HeadlinesRequest>::from_request(req, &())
            .await
            .map(|JsonBody(inner)| inner)
    }

    #[tokio::test]
    async fn test_empty_body_is_default() {
        let req = extract("").await.unwrap();
        assert!(req.category.is_none());
        assert!(extract("  \n").await.is_ok());
    }

    #[tokio::test]
    async fn test_camel_case_fields() {
        let req = extract(r#"{"category":"sports","pageSize":5}"#).await.unwrap();
        assert_eq!(req.category.as_deref(), Some("sports"));
        assert_eq!(req.page_size, Some(5));
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let err = extract("{not json").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    proptest::proptest! {
        // Whitespace-only bodies always mean "no parameters".
        #[test]
        fn prop_blank_body_is_default(body in "[ \t\r\n]{0,16}") {
            let req = Request::builder()
                .method("POST")
                .uri("/")
                .body(Body::from(body))
                .unwrap();
            let result = tokio_test::block_on(JsonBody::<HeadlinesRequest>::from_request(req, &()));
            let JsonBody(inner) = result.unwrap();
            proptest::prop_assert!(inner.category.is_none() && inner.page.is_none());
        }
    }
}
