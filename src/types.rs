use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    #[default]
    Haircut,
    Coloring,
    Styling,
    Other,
}

impl ServiceType {
    pub const ALL: [ServiceType; 4] = [
        ServiceType::Haircut,
        ServiceType::Coloring,
        ServiceType::Styling,
        ServiceType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Haircut => "haircut",
            ServiceType::Coloring => "coloring",
            ServiceType::Styling => "styling",
            ServiceType::Other => "other",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ServiceType::ALL
            .into_iter()
            .find(|service_type| service_type.as_str() == value)
            .ok_or_else(|| format!("Unknown service type '{value}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            _ => Err(format!("Unknown appointment status '{value}'")),
        }
    }
}

/// A booking as stored and returned by the appointment API.
///
/// `start` and `end` are wall-clock times of the salon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub phone: String,
    pub service_type: ServiceType,
    pub notes: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn from_draft(draft: AppointmentDraft) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: draft.title,
            start: draft.start,
            end: draft.end,
            phone: draft.phone,
            service_type: draft.service_type,
            notes: draft.notes,
            status: AppointmentStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites the editable fields, keeping status and creation time.
    pub fn apply_draft(&mut self, draft: AppointmentDraft) {
        self.title = draft.title;
        self.start = draft.start;
        self.end = draft.end;
        self.phone = draft.phone;
        self.service_type = draft.service_type;
        self.notes = draft.notes;
        self.updated_at = Utc::now();
    }
}

/// Body of create and update requests.
///
/// Every field is optional on the wire so that missing fields surface as
/// validation errors instead of deserialization failures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[validate(
        required(message = "title is missing"),
        length(min = 1, message = "title must not be empty")
    )]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_start")]
    #[validate(required(message = "start is missing"))]
    pub start: Option<NaiveDateTime>,
    #[validate(required(message = "serviceType is missing"))]
    pub service_type: Option<ServiceType>,
    #[validate(
        required(message = "duration is missing"),
        range(min = 1, message = "duration must be a positive number of minutes")
    )]
    pub duration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl AppointmentRequest {
    /// Trims every text field.
    pub fn normalized(self) -> Self {
        let trim = |value: Option<String>| value.map(|value| value.trim().to_string());
        Self {
            id: trim(self.id),
            title: trim(self.title),
            phone: trim(self.phone),
            notes: trim(self.notes),
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Validated appointment fields, ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentDraft {
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub phone: String,
    pub service_type: ServiceType,
    pub notes: Option<String>,
}

/// Parses a salon wall-clock time. Instants carrying an offset are
/// converted to the local time of the server.
pub fn parse_wall_clock(value: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    match value.parse::<NaiveDateTime>() {
        Ok(datetime) => Ok(datetime),
        Err(_) => DateTime::parse_from_rfc3339(value)
            .map(|datetime| datetime.with_timezone(&Local).naive_local()),
    }
}

fn deserialize_start<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .filter(|value| !value.trim().is_empty())
        .map(|value| parse_wall_clock(value.trim()).map_err(serde::de::Error::custom))
        .transpose()
}
