use axum::extract::{RawQuery, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};

use oaipmh_provider::{Arguments, OaiRequest, RequestMethod};

use crate::state::AppState;

pub const XML_CONTENT_TYPE: &str = "text/xml; charset=UTF-8";

pub async fn oai_get(State(state): State<AppState>, RawQuery(query): RawQuery) -> Response {
    respond(&state, OaiRequest::get(query.as_deref().unwrap_or_default())).await
}

pub async fn oai_post(State(state): State<AppState>, body: String) -> Response {
    respond(&state, OaiRequest::post(&body)).await
}

/// Any other method still gets an OAI-PMH document reporting the problem.
pub async fn oai_other(
    State(state): State<AppState>,
    method: Method,
    RawQuery(query): RawQuery,
) -> Response {
    let request = OaiRequest::new(
        RequestMethod::parse(method.as_str()),
        Arguments::parse(query.as_deref().unwrap_or_default()),
    );
    respond(&state, request).await
}

async fn respond(state: &AppState, request: OaiRequest) -> Response {
    match state.repository.handle(&request).await {
        Ok(response) => {
            tracing::info!(
                verb = response.verb.map(|v| v.to_string()).unwrap_or_default(),
                errors = response.errors.len(),
                "OAI-PMH request handled"
            );
            ([(header::CONTENT_TYPE, XML_CONTENT_TYPE)], response.body).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "OAI-PMH request failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

pub async fn health(State(state): State<AppState>) -> Result<&'static str, StatusCode> {
    if let Some(pool) = &state.pool {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(pool)
            .await
            .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?;
    }
    Ok("OK")
}
