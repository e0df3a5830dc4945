use std::time::Instant;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};
use factcheck_core::{run_fact_check, validate_headline};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::error::AppError;
use crate::metrics;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct FactCheckRequest {
    pub headline: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactCheckResponse {
    Analysis { analysis: String },
    Error { error: String },
}

pub fn fact_check_router() -> Router<AppState> {
    Router::new().route("/fact-check", post(fact_check))
}

#[instrument(skip_all)]
async fn fact_check(
    State(state): State<AppState>,
    payload: Result<Json<FactCheckRequest>, JsonRejection>,
) -> Result<Json<FactCheckResponse>, AppError> {
    let Json(request) =
        payload.map_err(|rejection| AppError::new(rejection.status(), rejection.body_text()))?;

    if let Err(err) = validate_headline(&request.headline) {
        metrics::check_rejected("empty headline");
        return Ok(Json(FactCheckResponse::Error {
            error: err.to_string(),
        }));
    }

    metrics::check_started(request.headline.chars().count());
    info!("kicking off crew");

    let started = Instant::now();
    let providers = state.providers();
    let result = run_fact_check(&request.headline, providers.as_ref(), state.agent_config()).await;
    let duration_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(output) => {
            let verdict = output.verdict.map(|v| v.as_str()).unwrap_or("unlabelled");
            metrics::check_completed(duration_ms, verdict, output.analysis.len());
            Ok(Json(FactCheckResponse::Analysis {
                analysis: output.analysis,
            }))
        }
        Err(err) => {
            error!(error = %err, duration_ms, "crew execution failed");
            metrics::check_failed(duration_ms, &err.to_string());
            Err(AppError::from(err))
        }
    }
}
