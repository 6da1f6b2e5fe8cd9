/// Request extractors with JSON error bodies
///
/// Axum's stock `Json` and `Path` rejections answer in plain text. These
/// wrappers turn every rejection into an [`ApiError`] so clients always get
/// the same error shape, and `ValidatedJson` runs `validator` rules before
/// the handler sees the payload.

use crate::error::ApiError;
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use validator::{Validate, ValidationError};

/// JSON body without validation, for handlers that inspect the raw payload
/// before deciding how to parse it
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| Self(value))
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
    }
}

/// JSON body that has passed its `Validate` rules
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let JsonBody(value) = JsonBody::<T>::from_request(req, state).await?;

        value.validate()?;
        Ok(Self(value))
    }
}

/// Path parameters; malformed segments are a 400
#[derive(Debug, Clone, Copy)]
pub struct Path<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for Path<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        axum::extract::Path::<T>::from_request_parts(parts, state)
            .await
            .map(|axum::extract::Path(value)| Self(value))
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
    }
}

/// Deserializes an already-parsed JSON value and validates it
pub fn from_value<T>(value: serde_json::Value) -> Result<T, ApiError>
where
    T: DeserializeOwned + Validate,
{
    let parsed: T = serde_json::from_value(value)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))?;

    parsed.validate()?;
    Ok(parsed)
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`); use together with `#[serde(default)]`
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Rejects empty and whitespace-only strings
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("This field may not be blank.".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde_json::json;

    #[derive(Debug, Deserialize, Validate)]
    struct Patch {
        #[validate(length(min = 1))]
        title: Option<String>,

        #[serde(default, deserialize_with = "double_option")]
        due_date: Option<Option<String>>,
    }

    #[derive(Debug, Deserialize, Validate)]
    struct Comment {
        #[validate(custom(function = "not_blank"))]
        content: String,
    }

    #[test]
    fn test_double_option() {
        let absent: Patch = serde_json::from_value(json!({})).unwrap();
        assert_eq!(absent.due_date, None);

        let null: Patch = serde_json::from_value(json!({ "due_date": null })).unwrap();
        assert_eq!(null.due_date, Some(None));

        let set: Patch = serde_json::from_value(json!({ "due_date": "2025-01-31" })).unwrap();
        assert_eq!(set.due_date, Some(Some("2025-01-31".to_string())));
    }

    #[test]
    fn test_not_blank() {
        assert!(not_blank("Fix bug").is_ok());
        assert!(not_blank("").is_err());
        assert!(not_blank("   ").is_err());
    }

    #[test]
    fn test_from_value_validates() {
        assert!(from_value::<Comment>(json!({ "content": "ok" })).is_ok());
        assert!(matches!(
            from_value::<Comment>(json!({ "content": " " })),
            Err(ApiError::ValidationError(_))
        ));
        assert!(matches!(
            from_value::<Comment>(json!({ "content": 5 })),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            from_value::<Patch>(json!({ "title": "" })),
            Err(ApiError::ValidationError(_))
        ));
    }

    fn post(content_type: Option<&str>, body: &'static str) -> Request {
        let mut builder = axum::http::Request::builder().method("POST").uri("/tasks/");
        if let Some(content_type) = content_type {
            builder = builder.header("content-type", content_type);
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn test_json_body_rejections_are_bad_request() {
        let missing_type = JsonBody::<serde_json::Value>::from_request(post(None, ""), &()).await;
        assert!(matches!(missing_type, Err(ApiError::BadRequest(_))));

        let malformed =
            JsonBody::<serde_json::Value>::from_request(post(Some("application/json"), "{"), &())
                .await;
        assert!(matches!(malformed, Err(ApiError::BadRequest(_))));

        let ok = JsonBody::<serde_json::Value>::from_request(
            post(Some("application/json"), r#"{"board": null}"#),
            &(),
        )
        .await;
        assert!(matches!(ok, Ok(JsonBody(value)) if value["board"].is_null()));
    }
}
