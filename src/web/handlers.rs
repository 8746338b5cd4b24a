//! Request handlers

use super::form::TransactionForm;
use super::render::{self, Panel};
use super::AppState;
use crate::session::{FormSession, SampleKind};
use crate::types::transaction::TransactionRecord;
use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::{Form, Json};
use serde_json::json;
use tracing::warn;

fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// Render the form for a session after running its prediction
fn predict_page(state: &AppState, mut session: FormSession) -> Response {
    match state.predict(&mut session) {
        Ok(outcome) => {
            Html(render::page(session.record(), Some(Panel::Outcome(&outcome)))).into_response()
        }
        Err(e) => {
            let message = e.to_string();
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Html(render::page(session.record(), Some(Panel::Error(&message)))),
            )
                .into_response()
        }
    }
}

/// `GET /`: empty form with the default values
pub async fn index() -> Html<String> {
    Html(render::page(&TransactionRecord::default(), None))
}

/// `POST /predict`: score the submitted form values
pub async fn predict_form(
    State(state): State<AppState>,
    form: Result<Form<TransactionForm>, FormRejection>,
) -> Response {
    let (echo, parsed) = match form {
        Ok(Form(form)) => (form.echo(), form.parse()),
        Err(rejection) => (TransactionRecord::default(), Err(rejection.body_text())),
    };

    match parsed {
        Ok(record) => predict_page(&state, FormSession::with_record(record)),
        Err(message) => {
            state.metrics.record_failure();
            warn!(error = %message, "Form rejected");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Html(render::page(&echo, Some(Panel::Error(&message)))),
            )
                .into_response()
        }
    }
}

/// `POST /sample/{kind}`: load a sample and predict right away
pub async fn sample_form(State(state): State<AppState>, Path(kind): Path<String>) -> Response {
    let Ok(kind) = kind.parse::<SampleKind>() else {
        return (StatusCode::NOT_FOUND, "unknown sample").into_response();
    };

    let mut session = FormSession::default();
    session.load_sample(kind);
    predict_page(&state, session)
}

/// `POST /api/predict`: score a JSON record
pub async fn api_predict(
    State(state): State<AppState>,
    payload: Result<Json<TransactionRecord>, JsonRejection>,
) -> Response {
    let record = match payload {
        Ok(Json(record)) => record,
        Err(rejection) => {
            state.metrics.record_failure();
            return json_error(StatusCode::UNPROCESSABLE_ENTITY, rejection.body_text());
        }
    };

    let mut session = FormSession::with_record(record);
    match state.predict(&mut session) {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => json_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
    }
}

/// `GET /api/samples/{kind}`: the record a sample button would load
pub async fn api_sample(Path(kind): Path<String>) -> Response {
    match kind.parse::<SampleKind>() {
        Ok(kind) => Json(kind.record()).into_response(),
        Err(message) => json_error(StatusCode::NOT_FOUND, message),
    }
}

/// `GET /api/metrics`
pub async fn api_metrics(State(state): State<AppState>) -> Response {
    Json(state.metrics.snapshot()).into_response()
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Response {
    Json(json!({
        "status": "ok",
        "classifier": state.engine.classifier_name(),
    }))
    .into_response()
}
