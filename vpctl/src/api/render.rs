//! Server-rendered HTML pages.
//!
//! Templates are compiled into the binary and loaded into a shared minijinja
//! environment on first use. Auto-escaping is on for all of them (`.html`
//! names), so user-controlled values render inert.

use std::sync::OnceLock;

use axum::response::Html;
use minijinja::{Environment, context};

use crate::{
    api::models::users::UserView,
    db::models::{audit::LogEntryDBResponse, predictions::PredictionDBResponse},
    errors::Error,
};

fn environment() -> &'static Environment<'static> {
    static ENV: OnceLock<Environment<'static>> = OnceLock::new();
    ENV.get_or_init(|| {
        let mut env = Environment::new();
        for (name, source) in [
            ("login.html", include_str!("../../templates/login.html")),
            ("dashboard.html", include_str!("../../templates/dashboard.html")),
            ("admin.html", include_str!("../../templates/admin.html")),
        ] {
            env.add_template(name, source).unwrap_or_else(|e| panic!("built-in template {name} is invalid: {e}"));
        }
        env
    })
}

fn render(name: &str, ctx: minijinja::Value) -> Result<Html<String>, Error> {
    let template = environment().get_template(name).map_err(|e| Error::Internal {
        operation: format!("load template {name}: {e}"),
    })?;
    let body = template.render(ctx).map_err(|e| Error::Internal {
        operation: format!("render template {name}: {e}"),
    })?;
    Ok(Html(body))
}

pub fn login_page(error: Option<&str>, notice: Option<&str>) -> Result<Html<String>, Error> {
    render("login.html", context! { error, notice })
}

pub fn dashboard_page(
    username: &str,
    outcome: Option<&str>,
    features: Option<&[String]>,
    analytics_url: &str,
) -> Result<Html<String>, Error> {
    render("dashboard.html", context! { username, outcome, features, analytics_url })
}

pub fn admin_page(
    username: &str,
    logs: &[LogEntryDBResponse],
    predictions: &[PredictionDBResponse],
    users: &[UserView],
) -> Result<Html<String>, Error> {
    render("admin.html", context! { username, logs, predictions, users })
}
