use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use utoipa::ToSchema;

pub const DEFAULT_TITLE: &str = "Untitled Note";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Note ID, derived from the creation time in milliseconds
    pub id: i64,
    /// Note title
    pub title: String,
    /// Note body
    pub text: String,
    /// Creation timestamp
    #[serde(serialize_with = "serialize_millis")]
    pub created_at: DateTime<Utc>,
    /// Last edit timestamp, absent until the first edit
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_opt_millis"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

// ISO-8601 UTC with exactly three fractional digits, e.g. 2026-01-02T03:04:05.120Z
fn serialize_millis<S: Serializer>(
    value: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn serialize_opt_millis<S: Serializer>(
    value: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(value) => serialize_millis(value, serializer),
        None => serializer.serialize_none(),
    }
}
