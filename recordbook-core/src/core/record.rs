//! Record entity, its status, and the raw input shape it is built from.

use crate::RecordbookError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a record.
///
/// Serialized lowercase (`"active"`, `"pending"`, `"completed"`), matching the
/// values the dashboard sends over HTTP.
///
/// ```rust
/// use recordbook_core::RecordStatus;
///
/// let json = serde_json::to_string(&RecordStatus::Pending).unwrap();
/// assert_eq!(json, r#""pending""#);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    #[default]
    Active,
    Pending,
    Completed,
}

impl RecordStatus {
    /// Every status, in display order.
    pub const ALL: [RecordStatus; 3] = [Self::Active, Self::Pending, Self::Completed];

    /// Returns the wire name of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordStatus {
    type Err = RecordbookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            other => Err(RecordbookError::Validation(format!(
                "Unknown status: {other}"
            ))),
        }
    }
}

/// A stored appointment or lesson.
///
/// `id` and `created_at` are assigned by the [`RecordStore`](crate::RecordStore)
/// and never change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: RecordStatus,
    pub tags: Vec<String>,
    pub date: DateTime<Utc>,
    pub participants: Vec<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Record {
    /// Label to show for the record: the title, else the contact name.
    ///
    /// Returns `None` when neither is set; callers must cope with that.
    #[must_use]
    pub fn display_label(&self) -> Option<&str> {
        self.title.as_deref().or(self.name.as_deref())
    }
}

/// Raw record data as it arrives from a form or HTTP body.
///
/// Every field is optional and dates are plain strings; the
/// [`normalize`](crate::normalize) function turns this into a [`NewRecord`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub tags: Option<Vec<String>>,
    pub date: Option<String>,
    pub preferred_date: Option<String>,
    pub preferred_time: Option<String>,
    pub participants: Option<Vec<String>>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub category: Option<String>,
}

/// A normalized record ready to be inserted or used as a full replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecord {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: RecordStatus,
    pub tags: Vec<String>,
    pub date: DateTime<Utc>,
    pub participants: Vec<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub category: Option<String>,
}

impl NewRecord {
    /// Attaches the storage identity to produce a full [`Record`].
    #[must_use]
    pub fn into_record(self, id: String, created_at: DateTime<Utc>) -> Record {
        Record {
            id,
            title: self.title,
            description: self.description,
            status: self.status,
            tags: self.tags,
            date: self.date,
            participants: self.participants,
            name: self.name,
            phone: self.phone,
            email: self.email,
            category: self.category,
            created_at,
        }
    }
}

impl From<NewRecord> for RecordInput {
    fn from(r: NewRecord) -> Self {
        Self {
            title: r.title,
            description: r.description,
            status: Some(r.status.as_str().to_string()),
            tags: Some(r.tags),
            date: Some(r.date.to_rfc3339()),
            preferred_date: None,
            preferred_time: None,
            participants: Some(r.participants),
            name: r.name,
            phone: r.phone,
            email: r.email,
            category: r.category,
        }
    }
}

impl From<&Record> for RecordInput {
    fn from(r: &Record) -> Self {
        Self {
            title: r.title.clone(),
            description: r.description.clone(),
            status: Some(r.status.as_str().to_string()),
            tags: Some(r.tags.clone()),
            date: Some(r.date.to_rfc3339()),
            preferred_date: None,
            preferred_time: None,
            participants: Some(r.participants.clone()),
            name: r.name.clone(),
            phone: r.phone.clone(),
            email: r.email.clone(),
            category: r.category.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Record {
        Record {
            id: "rec-1".to_string(),
            title: None,
            description: None,
            status: RecordStatus::Active,
            tags: vec![],
            date: Utc.with_ymd_and_hms(2025, 8, 10, 10, 0, 0).unwrap(),
            participants: vec![],
            name: Some("Иван".to_string()),
            phone: None,
            email: None,
            category: None,
            created_at: Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("Active".parse::<RecordStatus>().unwrap(), RecordStatus::Active);
        assert_eq!(" completed ".parse::<RecordStatus>().unwrap(), RecordStatus::Completed);
        assert!(matches!(
            "archived".parse::<RecordStatus>(),
            Err(RecordbookError::Validation(_))
        ));
    }

    #[test]
    fn test_display_label_falls_back_to_name() {
        let mut r = sample();
        assert_eq!(r.display_label(), Some("Иван"));
        r.title = Some("Урок".to_string());
        assert_eq!(r.display_label(), Some("Урок"));
        r.title = None;
        r.name = None;
        assert_eq!(r.display_label(), None);
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"status\":\"active\""));
    }

    #[test]
    fn test_input_deserializes_partial_body() {
        let input: RecordInput = serde_json::from_str(
            r#"{"name":"Анна","preferredDate":"2025-08-07","preferredTime":"17:00"}"#,
        )
        .unwrap();
        assert_eq!(input.name.as_deref(), Some("Анна"));
        assert_eq!(input.preferred_time.as_deref(), Some("17:00"));
        assert!(input.tags.is_none());
    }
}
