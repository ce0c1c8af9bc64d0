//! Record export to CSV, JSON and iCalendar, plus JSON import.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{Record, RecordStatus, RecordbookError, Result};

/// Format version written into [`ExportRecords::version`].
pub const EXPORT_VERSION: u32 = 1;

const CSV_HEADERS: [&str; 7] = ["ID", "Название", "Статус", "Дата", "Теги", "Телефон", "Email"];
const ICAL_PRODID: &str = "-//Records Dashboard//Records Dashboard//EN";
const ICAL_UID_DOMAIN: &str = "records-dashboard.com";
const ICAL_DEFAULT_SUMMARY: &str = "Событие";
const ICAL_TIMESTAMP: &str = "%Y%m%dT%H%M%SZ";

/// Top-level JSON structure of a records export.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRecords {
    pub version: u32,
    pub app_version: String,
    pub exported_at: DateTime<Utc>,
    pub records: Vec<Record>,
}

/// One element of a bare JSON array, as the web dashboard exported it.
///
/// Dashboard documents carry `_id` instead of `id` and may lack
/// `createdAt`; extra document fields are ignored.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyRecord {
    #[serde(alias = "_id")]
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: RecordStatus,
    #[serde(default)]
    tags: Vec<String>,
    date: DateTime<Utc>,
    #[serde(default)]
    participants: Vec<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl LegacyRecord {
    fn into_record(self, imported_at: DateTime<Utc>) -> Record {
        Record {
            id: self.id,
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
            created_at: self.created_at.unwrap_or(imported_at),
        }
    }
}

/// Renders `records` as CSV with a header row, one line per record.
pub fn export_csv(records: &[Record]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADERS)?;
    for record in records {
        writer.write_record([
            record.id.as_str(),
            record.display_label().unwrap_or_default(),
            record.status.as_str(),
            &record.date.format("%Y-%m-%d").to_string(),
            &record.tags.join(", "),
            record.phone.as_deref().unwrap_or_default(),
            record.email.as_deref().unwrap_or_default(),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| RecordbookError::Io(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| RecordbookError::Validation(format!("CSV is not valid UTF-8: {e}")))
}

/// Serializes `records` as pretty JSON inside an [`ExportRecords`] envelope.
pub fn export_json(records: &[Record], exported_at: DateTime<Utc>) -> Result<String> {
    let export = ExportRecords {
        version: EXPORT_VERSION,
        app_version: env!("CARGO_PKG_VERSION").to_string(),
        exported_at,
        records: records.to_vec(),
    };
    Ok(serde_json::to_string_pretty(&export)?)
}

/// Reads records back from [`export_json`] output or a bare JSON array.
///
/// A bare array may use the web dashboard's document shape (`_id`, no
/// `createdAt`); missing creation times become `imported_at`. Exports written
/// by a newer format version are rejected.
pub fn import_json(json: &str, imported_at: DateTime<Utc>) -> Result<Vec<Record>> {
    match serde_json::from_str::<serde_json::Value>(json)? {
        value @ serde_json::Value::Array(_) => {
            let legacy: Vec<LegacyRecord> = serde_json::from_value(value)?;
            log::info!("importing {} records from a bare array", legacy.len());
            Ok(legacy.into_iter().map(|r| r.into_record(imported_at)).collect())
        }
        value @ serde_json::Value::Object(_) => {
            let export: ExportRecords = serde_json::from_value(value)?;
            if export.version > EXPORT_VERSION {
                return Err(RecordbookError::Validation(format!(
                    "Unsupported export version {} (expected at most {EXPORT_VERSION})",
                    export.version
                )));
            }
            log::info!(
                "importing {} records exported by version {}",
                export.records.len(),
                export.app_version
            );
            Ok(export.records)
        }
        _ => Err(RecordbookError::Validation(
            "Import must be an export object or an array of records".to_string(),
        )),
    }
}

/// Builds a `VCALENDAR` with one one-hour `VEVENT` per record.
///
/// Lines are CRLF-terminated and text values are escaped per RFC 5545.
#[must_use]
pub fn export_icalendar(records: &[Record]) -> String {
    let mut lines: Vec<String> = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{ICAL_PRODID}"),
    ];
    for record in records {
        let end = record.date + Duration::hours(1);
        lines.push("BEGIN:VEVENT".to_string());
        lines.push(format!("UID:{}@{ICAL_UID_DOMAIN}", record.id));
        lines.push(format!("DTSTART:{}", record.date.format(ICAL_TIMESTAMP)));
        lines.push(format!("DTEND:{}", end.format(ICAL_TIMESTAMP)));
        lines.push(format!(
            "SUMMARY:{}",
            escape_text(record.display_label().unwrap_or(ICAL_DEFAULT_SUMMARY))
        ));
        lines.push(format!(
            "DESCRIPTION:{}",
            escape_text(record.description.as_deref().unwrap_or_default())
        ));
        lines.push(format!("STATUS:{}", record.status.as_str().to_uppercase()));
        lines.push("END:VEVENT".to_string());
    }
    lines.push("END:VCALENDAR".to_string());

    let mut out = lines.join("\r\n");
    out.push_str("\r\n");
    out
}

fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Record {
        Record {
            id: "rec-1".to_string(),
            title: Some("Урок чтения".to_string()),
            description: Some("Слоги, буквы; текст".to_string()),
            status: RecordStatus::Pending,
            tags: vec!["чтение".to_string(), "обучение".to_string()],
            date: Utc.with_ymd_and_hms(2025, 3, 4, 10, 30, 0).unwrap(),
            participants: vec!["Маша".to_string()],
            name: Some("Маша".to_string()),
            phone: Some("+7 900 000-00-00".to_string()),
            email: None,
            category: None,
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_export_csv_rows() {
        let csv = export_csv(&[sample()]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "ID,Название,Статус,Дата,Теги,Телефон,Email");
        assert_eq!(
            lines[1],
            "rec-1,Урок чтения,pending,2025-03-04,\"чтение, обучение\",+7 900 000-00-00,"
        );
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_export_json_envelope() {
        let exported_at = Utc.with_ymd_and_hms(2025, 3, 5, 0, 0, 0).unwrap();
        let json = export_json(&[sample()], exported_at).unwrap();
        assert!(json.contains("\"version\": 1"));
        assert!(json.contains("\"appVersion\""));
        assert!(json.contains("\"exportedAt\""));

        let records = import_json(&json, exported_at).unwrap();
        assert_eq!(records, vec![sample()]);
    }

    fn imported_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_import_accepts_bare_array() {
        let json = serde_json::to_string(&vec![sample()]).unwrap();
        assert_eq!(import_json(&json, imported_at()).unwrap(), vec![sample()]);
    }

    #[test]
    fn test_import_accepts_dashboard_documents() {
        let json = r#"[{"_id":"rec1","title":"Урок","status":"active","tags":["чтение"],
            "date":"2025-08-10T10:00:00.000Z","participants":["Иван"],"userId":"u1","__v":0}]"#;
        let records = import_json(json, imported_at()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "rec1");
        assert_eq!(records[0].title.as_deref(), Some("Урок"));
        assert_eq!(records[0].status, RecordStatus::Active);
        assert_eq!(records[0].date, Utc.with_ymd_and_hms(2025, 8, 10, 10, 0, 0).unwrap());
        assert_eq!(records[0].participants, vec!["Иван"]);
        assert_eq!(records[0].created_at, imported_at());
    }

    #[test]
    fn test_import_rejects_scalar_payload() {
        assert!(matches!(
            import_json("42", imported_at()),
            Err(RecordbookError::Validation(_))
        ));
    }

    #[test]
    fn test_import_rejects_newer_version() {
        let json = r#"{"version":99,"appVersion":"9.0.0","exportedAt":"2025-01-01T00:00:00Z","records":[]}"#;
        let err = import_json(json, imported_at()).unwrap_err();
        assert!(matches!(err, RecordbookError::Validation(_)));
    }

    #[test]
    fn test_import_rejects_garbage() {
        assert!(matches!(import_json("{not json", imported_at()), Err(RecordbookError::Json(_))));
    }

    #[test]
    fn test_icalendar_event() {
        let ics = export_icalendar(&[sample()]);
        assert!(ics.starts_with("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n"));
        assert!(ics.ends_with("END:VCALENDAR\r\n"));
        assert!(ics.contains("UID:rec-1@records-dashboard.com\r\n"));
        assert!(ics.contains("DTSTART:20250304T103000Z\r\n"));
        assert!(ics.contains("DTEND:20250304T113000Z\r\n"));
        assert!(ics.contains("SUMMARY:Урок чтения\r\n"));
        assert!(ics.contains("DESCRIPTION:Слоги\\, буквы\\; текст\r\n"));
        assert!(ics.contains("STATUS:PENDING\r\n"));
    }

    #[test]
    fn test_icalendar_summary_fallback() {
        let mut record = sample();
        record.title = None;
        record.name = None;
        let ics = export_icalendar(&[record]);
        assert!(ics.contains("SUMMARY:Событие\r\n"));
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a\\b\r\nc"), "a\\\\b\\nc");
    }
}
