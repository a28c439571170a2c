use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::SET_COOKIE, request::Parts},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use tracing::debug;

use super::{repo_types::User, session};
use crate::{error::AppError, state::AppState};

/// Resolves the session cookie to its user. Anonymous requests are
/// redirected to `/signin`, remembering where they were headed.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = session::current_user(state, &parts.headers)
            .await
            .map_err(|e| AppError::from(e).into_response())?;

        if let Some(user) = user {
            return Ok(AuthUser(user));
        }

        let wanted = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/dashboard");
        debug!(path = %wanted, "anonymous request to protected route");

        let cookie = session::intended_cookie(wanted, state.config.session.cookie_secure)
            .map_err(|e| AppError::Internal(e.into()).into_response())?;
        Err((AppendHeaders([(SET_COOKIE, cookie)]), Redirect::to("/signin")).into_response())
    }
}
