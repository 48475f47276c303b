use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImportantActivity {
    Yes,
    No,
    Maybe,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FluidColor {
    White,
    Yellow,
    Red,
    Green,
    Clear,
}

/// The scored part of a submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SurveyAnswers {
    #[serde(alias = "daysWithout")]
    pub days_without_activity: u32,
    pub desire_intensity: u32,
    pub has_important_activity: ImportantActivity,
    pub age: u32,
    #[serde(default, alias = "spermColor", skip_serializing_if = "Option::is_none")]
    pub fluid_color: Option<FluidColor>,
}

/// One accepted submission. Never mutated after it lands in a day bucket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SurveyRecord {
    #[serde(flatten)]
    pub answers: SurveyAnswers,
    pub anonymous_id: String,
    pub date: DateTime<Utc>,
}

impl SurveyRecord {
    /// UTC calendar day, `YYYY-MM-DD`. Lexicographic order on these keys is
    /// chronological order.
    pub fn day_key(&self) -> String {
        day_key(&self.date)
    }
}

pub fn day_key(date: &DateTime<Utc>) -> String {
    date.date_naive().format("%Y-%m-%d").to_string()
}

/// Date-times with an explicit offset that RFC 3339 parsing refuses
/// (missing seconds, space separator).
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M%#z",
];

/// Offset-less date-times. These are read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// A `date` as it arrives on the wire, before it is known to be a real timestamp.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawDate {
    /// Epoch milliseconds.
    Millis(f64),
    /// RFC 3339, ISO-like date-time with or without offset, or bare `YYYY-MM-DD`.
    Text(String),
}

impl RawDate {
    pub fn parse(&self) -> Result<DateTime<Utc>, String> {
        match self {
            RawDate::Millis(ms) => {
                if !ms.is_finite() {
                    return Err(format!("{ms} is not a valid timestamp"));
                }
                Utc.timestamp_millis_opt(*ms as i64)
                    .single()
                    .ok_or_else(|| format!("{ms} is out of range"))
            }
            RawDate::Text(text) => {
                let text = text.trim();
                if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
                    return Ok(dt.with_timezone(&Utc));
                }
                for format in OFFSET_FORMATS {
                    if let Ok(dt) = DateTime::parse_from_str(text, format) {
                        return Ok(dt.with_timezone(&Utc));
                    }
                }
                // A trailing `Z` names UTC, which is what naive values become anyway.
                let naive_text = text.strip_suffix(['Z', 'z']).unwrap_or(text);
                for format in NAIVE_FORMATS {
                    if let Ok(naive) = NaiveDateTime::parse_from_str(naive_text, format) {
                        return Ok(naive.and_utc());
                    }
                }
                NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|naive| naive.and_utc())
                    .ok_or_else(|| format!("'{text}' is not a valid timestamp"))
            }
        }
    }
}
