use axum::{extract::rejection::JsonRejection, Json};

use crate::dto::ScoreResponse;
use crate::error::AppResult;
use crate::models::survey::SurveyAnswers;
use crate::services::scoring;

pub async fn score_answers(
    payload: Result<Json<SurveyAnswers>, JsonRejection>,
) -> AppResult<Json<ScoreResponse>> {
    let Json(answers) = payload?;

    Ok(Json(ScoreResponse {
        probability: scoring::score(&answers),
    }))
}
