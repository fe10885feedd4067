//! Login, logout, and the login page.

use axum::{
    extract::{Form, State},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use tracing::{info, instrument, warn};

use crate::{
    AppState,
    api::{
        handlers::{Notice, maybe_session, notice_cookie, take_notice},
        models::auth::LoginForm,
        render::login_page,
    },
    auth::password::verify_password,
    db::{
        errors::DbError,
        handlers::{AuditLog, Users},
    },
    errors::Error,
};

/// `GET /` - the login page, or straight to the dashboard for a live session.
/// Consumes a pending one-shot notice if the request carries one.
pub async fn login_form(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, Error> {
    if let Some(session) = maybe_session(&state, &headers) {
        return Ok(Redirect::to(session.role.dashboard_path()).into_response());
    }

    eprintln!("DEBUG login_form cookies: {:?}", headers.get(axum::http::header::COOKIE));
    let notice = take_notice(&headers);
    let page = login_page(None, notice.map(Notice::message))?;

    match notice {
        // Rendering consumed the notice; expire its cookie
        Some(_) => Ok(([(SET_COOKIE, notice_cookie("", 0))], page).into_response()),
        None => Ok(page.into_response()),
    }
}

/// `POST /` - verify credentials, open a session, and hand out the cookie.
///
/// All failure shapes (unknown user, wrong password) share one response so
/// the form does not leak which usernames exist.
#[instrument(skip_all, fields(username = %form.username))]
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Result<Response, Error> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;

    let Some(user) = Users::new(&mut conn).get_by_username(&form.username).await? else {
        warn!("login rejected: unknown username");
        return rejected();
    };

    // Argon2 verification is CPU-bound; keep it off the async workers
    let hash = user.password_hash.clone();
    let password = form.password.clone();
    let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("join password verification task: {e}"),
        })??;

    if !verified {
        warn!("login rejected: wrong password");
        return rejected();
    }

    let (token, session) = state.sessions.issue(&user, &state.config)?;
    info!(session = %crate::types::abbrev_session(&session.id), role = %session.role, "login succeeded");

    AuditLog::new(&mut conn).append(&user.username, "Logged In").await?;

    let cookie = session_cookie(&state, &token, state.config.session.timeout.as_secs());
    Ok(([(SET_COOKIE, cookie)], Redirect::to(session.role.dashboard_path())).into_response())
}

/// `GET /logout` - drop the session and clear the cookie.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, Error> {
    let token = crate::auth::session::token_from_headers(&headers, &state.config.session.cookie_name);

    if let Some(token) = token
        && let Some(session) = state.sessions.invalidate(&token, &state.config)
    {
        info!(session = %crate::types::abbrev_session(&session.id), username = %session.username, "logout");

        let mut conn = state.db.acquire().await.map_err(DbError::from)?;
        AuditLog::new(&mut conn).append(&session.username, "Logged Out").await?;
    }

    // Two cookies go out: the cleared session and the one-shot notice
    let headers = AppendHeaders([
        (SET_COOKIE, session_cookie(&state, "", 0)),
        (SET_COOKIE, notice_cookie(Notice::LoggedOut.code(), 60)),
    ]);
    Ok((headers, Redirect::to("/")).into_response())
}

fn rejected() -> Result<Response, Error> {
    let page = login_page(Some("Invalid username or password"), None)?;
    Ok((StatusCode::UNAUTHORIZED, page).into_response())
}

fn session_cookie(state: &AppState, token: &str, max_age: u64) -> String {
    let mut cookie = format!(
        "{}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}",
        state.config.session.cookie_name
    );
    if state.config.session.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}
