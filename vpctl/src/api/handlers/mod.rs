//! Request handlers.

use axum::{
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    AppState,
    api::models::users::Role,
    auth::session::{Session, token_from_headers},
    errors::Error,
};

pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod predictions;

/// Resolve the request's session cookie into a validated [`Session`],
/// optionally requiring a role.
pub(crate) fn authorize(state: &AppState, headers: &HeaderMap, required_role: Option<Role>) -> Result<Session, Error> {
    let token =
        token_from_headers(headers, &state.config.session.cookie_name).ok_or(Error::Unauthenticated { message: None })?;

    state.sessions.validate(&token, required_role, &state.config)
}

/// Like [`authorize`] but treats any rejection as "no session".
pub(crate) fn maybe_session(state: &AppState, headers: &HeaderMap) -> Option<Session> {
    authorize(state, headers, None).ok()
}

const NOTICE_COOKIE: &str = "vpctl_notice";

/// One-shot notice shown on the next login page render.
///
/// Carried as a short-lived cookie holding a code, not free text, so nothing
/// user-controlled rides the cookie. The login page consumes it and clears
/// the cookie, same one-shot shape as the session outcome stash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Notice {
    LoginRequired,
    AccessDenied,
    LoggedOut,
}

impl Notice {
    fn code(self) -> &'static str {
        match self {
            Notice::LoginRequired => "login_required",
            Notice::AccessDenied => "access_denied",
            Notice::LoggedOut => "logged_out",
        }
    }

    fn from_code(code: &str) -> Option<Self> {
        match code {
            "login_required" => Some(Notice::LoginRequired),
            "access_denied" => Some(Notice::AccessDenied),
            "logged_out" => Some(Notice::LoggedOut),
            _ => None,
        }
    }

    pub(crate) fn message(self) -> &'static str {
        match self {
            Notice::LoginRequired => "Please log in to access this page",
            Notice::AccessDenied => "Access denied. Admin privileges required.",
            Notice::LoggedOut => "You have been logged out",
        }
    }

    /// The notice matching an authorization failure: role mismatch gets the
    /// access-denied wording, everything else asks for a login.
    pub(crate) fn for_rejection(error: &Error) -> Self {
        match error {
            Error::Forbidden { .. } => Notice::AccessDenied,
            _ => Notice::LoginRequired,
        }
    }
}

/// Bounce an HTML caller to the login page, carrying a one-shot notice.
pub(crate) fn redirect_to_login(notice: Notice) -> Response {
    ([(SET_COOKIE, notice_cookie(notice.code(), 60))], Redirect::to("/")).into_response()
}

/// Read the pending notice off the request, if any.
pub(crate) fn take_notice(headers: &HeaderMap) -> Option<Notice> {
    token_from_headers(headers, NOTICE_COOKIE).and_then(|code| Notice::from_code(&code))
}

pub(crate) fn notice_cookie(value: &str, max_age: u64) -> String {
    format!("{NOTICE_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}")
}

pub async fn health() -> &'static str {
    "OK"
}

/// Unmatched routes land on the login surface with a generic notice, never a
/// bare framework error page.
pub async fn not_found() -> Result<Response, Error> {
    let page = crate::api::render::login_page(Some("Page not found"), None)?;
    Ok((StatusCode::NOT_FOUND, page).into_response())
}
