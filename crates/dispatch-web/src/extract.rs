//! A `Json` extractor that reports decode failures as the `{"message":
//! "invalid request json"}` envelope rather than Axum's default plain-text
//! rejection body.

use axum::extract::{FromRequest, Request};
use axum::Json;

use crate::error::ApiError;

pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(_) => Err(ApiError::BadRequest("invalid request json".into())),
        }
    }
}
