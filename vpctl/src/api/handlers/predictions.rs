//! The prediction pipeline: coerce, classify, persist, respond.

use std::collections::HashMap;

use axum::{
    extract::{Form, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::{
    AppState,
    api::models::predictions::PredictResponse,
    classifier::FeatureVector,
    db::{
        errors::DbError,
        handlers::{AuditLog, Predictions},
        models::predictions::PredictionCreateDBRequest,
    },
    errors::Error,
};

pub const MODEL_UNAVAILABLE: &str = "Model not available";
pub const NOT_LOGGED_IN: &str = "Not logged in";

/// Whether the caller is a programmatic client expecting JSON rather than a
/// browser form post expecting a redirect.
fn wants_json(headers: &HeaderMap) -> bool {
    let ajax = headers
        .get("x-requested-with")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"));

    let accepts_json = headers
        .get(axum::http::header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"));

    ajax || accepts_json
}

/// An outcome string counts as a success only when it is a real label.
fn outcome_success(outcome: &str) -> bool {
    outcome != MODEL_UNAVAILABLE && !outcome.starts_with("Error:")
}

/// Run the classifier over raw form input, producing the outcome string and
/// the coerced feature snapshot to persist alongside it.
fn evaluate(state: &AppState, raw: &HashMap<String, String>) -> (String, serde_json::Value) {
    let Some(classifier) = state.classifier.as_deref() else {
        return (MODEL_UNAVAILABLE.to_string(), json!({}));
    };

    let features = FeatureVector::from_raw(classifier.schema(), raw);
    let snapshot = features.snapshot(classifier.schema());

    let outcome = match classifier.predict(&features) {
        Ok(label) => label.as_str().to_string(),
        Err(e) => {
            warn!(error = %e, "classifier failed on submitted features");
            format!("Error: {e}")
        }
    };

    (outcome, snapshot)
}

/// `POST /predict` - the full pipeline for a role `user` session.
///
/// Every evaluated submission is persisted (prediction record plus audit
/// entry) before the response goes out, including the degraded
/// model-unavailable outcome. Rejected requests write nothing.
#[instrument(skip_all)]
pub async fn predict(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(raw): Form<HashMap<String, String>>,
) -> Result<Response, Error> {
    let session = match super::authorize(&state, &headers, Some(crate::api::models::users::Role::User)) {
        Ok(session) => session,
        Err(e) => {
            info!(error = %e, "prediction rejected");
            if wants_json(&headers) {
                let body = PredictResponse {
                    success: false,
                    prediction: NOT_LOGGED_IN.to_string(),
                };
                return Ok((StatusCode::UNAUTHORIZED, axum::Json(body)).into_response());
            }
            return Ok(super::redirect_to_login(super::Notice::for_rejection(&e)));
        }
    };

    let (outcome, snapshot) = evaluate(&state, &raw);
    info!(username = %session.username, outcome = %outcome, "prediction evaluated");

    // Persist before responding; a storage failure must surface, not produce
    // an unrecorded prediction
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    Predictions::new(&mut conn)
        .record(&PredictionCreateDBRequest {
            username: session.username.clone(),
            features: snapshot,
            outcome: outcome.clone(),
        })
        .await?;
    AuditLog::new(&mut conn)
        .append(&session.username, &format!("Made prediction: {outcome}"))
        .await?;

    if wants_json(&headers) {
        let body = PredictResponse {
            success: outcome_success(&outcome),
            prediction: outcome,
        };
        return Ok(axum::Json(body).into_response());
    }

    // Browser flow: stash the outcome for the next dashboard render
    state.sessions.stash_outcome(session.id, outcome);
    Ok(Redirect::to("/user").into_response())
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use sqlx::SqlitePool;

    use super::*;
    use crate::{
        api::models::users::Role,
        db::handlers::AuditLog,
        test_utils::{create_test_app, login, seed_user},
    };

    const SCENARIO: &[(&str, &str)] = &[("funding", "100000"), ("accelerator", "1"), ("revenue", "50000")];

    #[sqlx::test]
    async fn test_predict_persists_and_redirects(pool: SqlitePool) {
        seed_user(&pool, "user", "user123", Role::User).await;
        let server = create_test_app(pool.clone(), true).await;
        login(&server, "user", "user123").await;

        let response = server.post("/predict").form(&SCENARIO).await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get("location").unwrap(), "/user");

        let mut conn = pool.acquire().await.unwrap();
        let records = Predictions::new(&mut conn).recent(10).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].username, "user");
        assert_eq!(records[0].outcome, "Success");
        let snapshot: serde_json::Value = serde_json::from_str(&records[0].features).unwrap();
        assert_eq!(snapshot, json!({"funding": 100000.0, "accelerator": 1.0, "revenue": 50000.0}));

        let entries = AuditLog::new(&mut conn).recent(10).await.unwrap();
        assert_eq!(entries[0].action, "Made prediction: Success");
    }

    #[sqlx::test]
    async fn test_predict_outcome_shows_once_on_dashboard(pool: SqlitePool) {
        seed_user(&pool, "user", "user123", Role::User).await;
        let server = create_test_app(pool, true).await;
        login(&server, "user", "user123").await;

        server.post("/predict").form(&SCENARIO).await;

        let page = server.get("/user").await;
        page.assert_status_ok();
        assert!(page.text().contains("Prediction: <strong>Success</strong>"));

        // One-shot: the next render no longer shows it
        let page = server.get("/user").await;
        assert!(!page.text().contains("Prediction: <strong>"));
    }

    #[sqlx::test]
    async fn test_predict_answers_json_clients(pool: SqlitePool) {
        seed_user(&pool, "user", "user123", Role::User).await;
        let server = create_test_app(pool, true).await;
        login(&server, "user", "user123").await;

        let response = server
            .post("/predict")
            .add_header("accept", "application/json")
            .form(&SCENARIO)
            .await;
        response.assert_status_ok();

        let body: PredictResponse = response.json();
        assert!(body.success);
        assert_eq!(body.prediction, "Success");
    }

    #[sqlx::test]
    async fn test_unauthenticated_predict_writes_nothing(pool: SqlitePool) {
        let server = create_test_app(pool.clone(), true).await;

        // Browser flow bounces to the login page with a one-shot notice
        let response = server.post("/predict").form(&SCENARIO).await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get("location").unwrap(), "/");
        let cookie = response.headers().get("set-cookie").unwrap().to_str().unwrap();
        assert!(cookie.starts_with("vpctl_notice=login_required"), "got {cookie}");

        // AJAX flow gets the JSON rejection
        let response = server
            .post("/predict")
            .add_header("x-requested-with", "XMLHttpRequest")
            .form(&SCENARIO)
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: PredictResponse = response.json();
        assert!(!body.success);
        assert_eq!(body.prediction, NOT_LOGGED_IN);

        let mut conn = pool.acquire().await.unwrap();
        assert!(Predictions::new(&mut conn).recent(10).await.unwrap().is_empty());
        assert!(AuditLog::new(&mut conn).recent(10).await.unwrap().is_empty());
    }

    #[sqlx::test]
    async fn test_admin_sessions_cannot_predict(pool: SqlitePool) {
        seed_user(&pool, "admin", "admin123", Role::Admin).await;
        let server = create_test_app(pool.clone(), true).await;
        login(&server, "admin", "admin123").await;

        let response = server
            .post("/predict")
            .add_header("accept", "application/json")
            .form(&SCENARIO)
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        let mut conn = pool.acquire().await.unwrap();
        assert!(Predictions::new(&mut conn).recent(10).await.unwrap().is_empty());
    }

    #[sqlx::test]
    async fn test_predict_without_model_still_records(pool: SqlitePool) {
        seed_user(&pool, "user", "user123", Role::User).await;
        let server = create_test_app(pool.clone(), false).await;
        login(&server, "user", "user123").await;

        let response = server
            .post("/predict")
            .add_header("accept", "application/json")
            .form(&SCENARIO)
            .await;
        response.assert_status_ok();
        let body: PredictResponse = response.json();
        assert!(!body.success);
        assert_eq!(body.prediction, MODEL_UNAVAILABLE);

        let mut conn = pool.acquire().await.unwrap();
        let records = Predictions::new(&mut conn).recent(10).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].outcome, MODEL_UNAVAILABLE);
        assert_eq!(records[0].features, "{}");

        let entries = AuditLog::new(&mut conn).recent(10).await.unwrap();
        assert_eq!(entries[0].action, format!("Made prediction: {MODEL_UNAVAILABLE}"));
    }

    #[sqlx::test]
    async fn test_predict_coerces_garbage_input(pool: SqlitePool) {
        seed_user(&pool, "user", "user123", Role::User).await;
        let server = create_test_app(pool.clone(), true).await;
        login(&server, "user", "user123").await;

        let response = server
            .post("/predict")
            .add_header("accept", "application/json")
            .form(&[("funding", "lots"), ("bogus", "1")])
            .await;
        response.assert_status_ok();

        let mut conn = pool.acquire().await.unwrap();
        let records = Predictions::new(&mut conn).recent(10).await.unwrap();
        let snapshot: serde_json::Value = serde_json::from_str(&records[0].features).unwrap();
        assert_eq!(snapshot, json!({"funding": 0.0, "accelerator": 0.0, "revenue": 0.0}));
    }

    #[test]
    fn test_wants_json() {
        let mut headers = HeaderMap::new();
        assert!(!wants_json(&headers));

        headers.insert("x-requested-with", "xmlhttprequest".parse().unwrap());
        assert!(wants_json(&headers));

        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::ACCEPT, "application/json, text/plain".parse().unwrap());
        assert!(wants_json(&headers));

        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::ACCEPT, "text/html".parse().unwrap());
        assert!(!wants_json(&headers));
    }

    #[test]
    fn test_outcome_success() {
        assert!(outcome_success("Success"));
        assert!(outcome_success("Failure"));
        assert!(!outcome_success(MODEL_UNAVAILABLE));
        assert!(!outcome_success("Error: feature vector has 2 values, model expects 3"));
    }
}
