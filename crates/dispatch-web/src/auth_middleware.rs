//! Bearer-token auth middleware, one per realm (§4.3, §6).
//!
//! Unknown or absent tokens, and tokens presented against the wrong realm,
//! always yield the same 401 `{"message":"Unauthorized"}` response — the
//! handler never learns why a request was rejected, which is the point.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use dispatch_auth::Realm;

use crate::error::ApiError;
use crate::state::AppState;

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

async fn require_realm(
    realm: Realm,
    state: &AppState,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = bearer_token(&req) else {
        return Err(ApiError::Unauthorized);
    };

    if !state.keys.verify(realm, token) {
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(req).await)
}

/// Gate a route group behind the admin realm.
pub async fn admin_auth(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    require_realm(Realm::Admin, &state, req, next).await
}

/// Gate a route group behind the nodes realm.
pub async fn nodes_auth(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    require_realm(Realm::Nodes, &state, req, next).await
}
