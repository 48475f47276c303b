//! Request/response envelopes for the HTTP and WebSocket surface.
//!
//! Conventions:
//! - `*Request`  → deserialized from client JSON
//! - `*Response` → serialized to client JSON
//! - Field names are camelCase on the wire, matching the form client

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::survey::{
    FluidColor, ImportantActivity, RawDate, SurveyAnswers, SurveyRecord,
};
use crate::services::day_buckets::BucketMap;
use crate::services::outcome::{Outcome, SpinFrame};

// ============================================================================
// Common
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Every error response uses this shape
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: String,
}

// ============================================================================
// Submissions
// ============================================================================

/// POST /api/default
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitSurveyRequest {
    #[serde(alias = "daysWithout")]
    pub days_without_activity: u32,
    pub desire_intensity: u32,
    pub has_important_activity: ImportantActivity,
    pub age: u32,
    #[serde(default, alias = "spermColor")]
    pub fluid_color: Option<FluidColor>,

    #[validate(length(min = 1, max = 128, message = "anonymousId must be 1-128 characters"))]
    pub anonymous_id: String,

    pub date: RawDate,
}

impl SubmitSurveyRequest {
    pub fn into_record(self) -> AppResult<SurveyRecord> {
        self.validate()
            .map_err(|e| AppError::InvalidPayload(e.to_string()))?;
        let date = self.date.parse().map_err(AppError::InvalidDate)?;

        Ok(SurveyRecord {
            answers: SurveyAnswers {
                days_without_activity: self.days_without_activity,
                desire_intensity: self.desire_intensity,
                has_important_activity: self.has_important_activity,
                age: self.age,
                fluid_color: self.fluid_color,
            },
            anonymous_id: self.anonymous_id,
            date,
        })
    }
}

/// GET /api/default
#[derive(Debug, Serialize)]
pub struct BucketsResponse {
    pub success: bool,
    pub data: BucketMap,
}

// ============================================================================
// Scoring
// ============================================================================

/// POST /api/score
#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub probability: f64,
}

// ============================================================================
// Spin (WebSocket)
// ============================================================================

#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SpinMessage {
    Tick {
        value: u32,
    },
    Result {
        value: u32,
        outcome: Outcome,
        emoji: &'static str,
        probability: f64,
    },
    Error {
        error: String,
    },
}

impl SpinMessage {
    pub fn from_frame(frame: SpinFrame, probability: f64) -> Self {
        match frame {
            SpinFrame::Rolling(value) => SpinMessage::Tick { value },
            SpinFrame::Settled { draw, outcome } => SpinMessage::Result {
                value: draw,
                outcome,
                emoji: outcome.emoji(),
                probability,
            },
        }
    }
}
