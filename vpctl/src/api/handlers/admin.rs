//! The admin console.

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
};

use crate::{
    AppState,
    api::{
        handlers::{Notice, authorize, redirect_to_login},
        models::users::{Role, UserView},
        render::admin_page,
    },
    db::{
        errors::DbError,
        handlers::{AuditLog, Predictions, Users},
    },
    errors::Error,
};

/// How much history the console shows per table.
const HISTORY_LIMIT: i64 = 100;

/// `GET /admin` - recent audit entries, recent predictions, and the account
/// list (sans password hashes). Requires a live `admin` session.
pub async fn admin_dashboard(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, Error> {
    let session = match authorize(&state, &headers, Some(Role::Admin)) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("DEBUG admin authorize failed: {e:?}; cookies: {:?}", headers.get(axum::http::header::COOKIE));
            return Ok(redirect_to_login(Notice::for_rejection(&e)));
        }
    };

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;

    let logs = AuditLog::new(&mut conn).recent(HISTORY_LIMIT).await?;
    let predictions = Predictions::new(&mut conn).recent(HISTORY_LIMIT).await?;
    let users: Vec<UserView> = Users::new(&mut conn).list().await?.into_iter().map(UserView::from).collect();

    Ok(admin_page(&session.username, &logs, &predictions, &users)?.into_response())
}
