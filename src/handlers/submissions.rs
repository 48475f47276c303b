use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::dto::{BucketsResponse, SubmitSurveyRequest, SuccessResponse};
use crate::error::AppResult;
use crate::AppState;

// ── POST /api/default ────────────────────────────────────────────────────────

pub async fn submit_survey(
    State(state): State<AppState>,
    payload: Result<Json<SubmitSurveyRequest>, JsonRejection>,
) -> AppResult<Json<SuccessResponse>> {
    let Json(body) = payload?;
    let record = body.into_record()?;
    let day = record.day_key();

    // The response never waits on, or reports, the archival of an older day.
    if let Some(job) = state.buckets.append(record).await {
        tracing::info!(
            day = %job.day,
            current_day = %day,
            records = job.records.len(),
            "Scheduling archival of stale day bucket"
        );
        state.buckets.spawn_archive(job, state.blob.clone());
    }

    Ok(Json(SuccessResponse { success: true }))
}

// ── GET /api/default ─────────────────────────────────────────────────────────

pub async fn list_buckets(State(state): State<AppState>) -> Json<BucketsResponse> {
    Json(BucketsResponse {
        success: true,
        data: state.buckets.snapshot().await,
    })
}
