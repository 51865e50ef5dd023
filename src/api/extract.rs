//! Request extractors

use axum::{
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request},
    http::request::Parts,
    Json,
};
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::auth::token_from_headers;
use crate::core::AppState;
use crate::storage::StorageImpl;
use crate::types::{Error, User};

/// Custom JSON extractor that returns proper JSON error responses
pub struct JsonRequest<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for JsonRequest<T>
where
    T: serde::de::DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonRequest(value)),
            Err(rejection) => {
                let message = match rejection {
                    JsonRejection::JsonDataError(err) => format!("Invalid JSON data: {}", err.body_text()),
                    JsonRejection::JsonSyntaxError(_) => "Malformed JSON".to_string(),
                    JsonRejection::MissingJsonContentType(_) => {
                        "Missing or invalid Content-Type header. Expected 'application/json'".to_string()
                    }
                    JsonRejection::BytesRejection(_) => "Failed to read request body".to_string(),
                    _ => "Invalid JSON request".to_string(),
                };
                tracing::warn!("JSON parsing error: {}", message);
                Err(ApiError(Error::invalid_input(message)))
            }
        }
    }
}

/// The authenticated caller
pub struct AuthUser {
    /// Session owner
    pub user: User,
    /// Token the request was made with
    pub token: String,
}

#[axum::async_trait]
impl<S: StorageImpl> FromRequestParts<Arc<AppState<S>>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers).ok_or(Error::Unauthenticated)?;
        let user = state.accounts.authenticate(&token)?;
        Ok(AuthUser { user, token })
    }
}
