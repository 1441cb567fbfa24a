use crate::error::ApiError;
use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// JsonBody
///
/// Request body parsed into a per-route schema.
///
/// Unlike `axum::Json`, a body that is absent or not JSON at all is read as the empty schema
/// (`T::default()`), so the handler reports the missing fields with a 400. A well-formed body
/// whose fields have the wrong types is rejected right here with a 400.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|_| ApiError::BadRequest)?;

        let value: Value = match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("unreadable request body treated as empty: {}", e);
                return Ok(JsonBody(T::default()));
            }
        };

        match value {
            Value::Null => Ok(JsonBody(T::default())),
            Value::Object(_) => serde_json::from_value(value).map(JsonBody).map_err(|e| {
                tracing::debug!("request body failed validation: {}", e);
                ApiError::BadRequest
            }),
            _ => Err(ApiError::BadRequest),
        }
    }
}

/// DrinkId
///
/// The `{id}` path segment. Only integers address a drink; anything else is an unknown
/// resource.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrinkId(pub i32);

impl<S> FromRequestParts<S> for DrinkId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::NotFound)?;
        raw.parse().map(DrinkId).map_err(|_| ApiError::NotFound)
    }
}
