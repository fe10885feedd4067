//! The user dashboard.

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
};

use crate::{
    AppState,
    api::{
        handlers::{Notice, authorize, redirect_to_login},
        models::users::Role,
        render::dashboard_page,
    },
    errors::Error,
};

/// `GET /user` - prediction form plus the one-shot outcome of the most recent
/// submission. Anyone without a live `user` session is bounced to the login
/// page with a notice.
pub async fn user_dashboard(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, Error> {
    let session = match authorize(&state, &headers, Some(Role::User)) {
        Ok(session) => session,
        Err(e) => return Ok(redirect_to_login(Notice::for_rejection(&e))),
    };

    let outcome = state.sessions.take_outcome(session.id);
    let schema = state.classifier.as_deref().map(|c| c.schema().to_vec());

    let page = dashboard_page(
        &session.username,
        outcome.as_deref(),
        schema.as_deref(),
        state.config.analytics_url(),
    )?;
    Ok(page.into_response())
}
