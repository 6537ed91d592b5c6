use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[schema(as = params::meeting::CreateParams)]
pub(crate) struct CreateParams {
    pub(crate) title: String,
}

/// A meeting planned for `date` at `time`, both UTC.
#[derive(Debug, Deserialize, ToSchema)]
#[schema(as = params::meeting::ScheduleParams)]
pub(crate) struct ScheduleParams {
    pub(crate) title: String,
    #[schema(value_type = String, format = Date, example = "2024-02-01")]
    pub(crate) date: NaiveDate,
    #[schema(value_type = String, example = "14:30")]
    #[serde(deserialize_with = "time_of_day")]
    pub(crate) time: NaiveTime,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[schema(as = params::meeting::JoinParams)]
pub(crate) struct JoinParams {
    /// Name shown to the other participants. Defaults to the account's name.
    #[serde(default)]
    pub(crate) display_name: String,
}

/// Path of every route below `/meetings/:code`.
#[derive(Debug, Deserialize)]
pub(crate) struct MeetingPath {
    pub(crate) code: String,
}

/// Accepts `HH:MM` as sent by time inputs, as well as `HH:MM:SS`.
fn time_of_day<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    NaiveTime::parse_from_str(&raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
        .map_err(serde::de::Error::custom)
}
