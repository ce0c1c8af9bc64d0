//! Turns raw form input into storage-ready records.
//!
//! [`normalize`] fills in the fields a caller left out (schedule instant,
//! title, description, participants, tags) from the fields it did supply.
//! It never overwrites a non-empty caller value, so running it on its own
//! output is a no-op.

use crate::{NewRecord, RecordInput, RecordStatus, RecordbookError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

/// Tag assigned when a record arrives with no tags and no category.
pub const DEFAULT_TAG: &str = "Appointment";

const TITLE_PREFIX: &str = "Запись для ";
const PHONE_LABEL: &str = "Телефон: ";
const EMAIL_LABEL: &str = "Email: ";
const DESCRIPTION_SEPARATOR: &str = ", ";

/// One `@`, no whitespace, and a dotted domain that neither starts nor ends with a dot.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@.][^\s@]*\.[^\s@]*[^\s@.]$").expect("email pattern is valid")
});

/// Normalizes raw input into a [`NewRecord`].
///
/// # Errors
///
/// Returns [`RecordbookError::Validation`] when no schedule instant can be
/// resolved (neither a parsable `date` nor both `preferredDate` and
/// `preferredTime`), or when `status` is not a known value.
pub fn normalize(input: &RecordInput) -> Result<NewRecord> {
    let date = resolve_date(input)?;

    let name = clean(input.name.as_deref());
    let phone = clean(input.phone.as_deref());
    let email = clean(input.email.as_deref());
    let category = clean(input.category.as_deref());

    let title = clean(input.title.as_deref())
        .or_else(|| name.as_ref().map(|n| format!("{TITLE_PREFIX}{n}")))
        .or_else(|| category.clone());

    let description = clean(input.description.as_deref())
        .or_else(|| contact_description(phone.as_deref(), email.as_deref()));

    let mut participants = clean_list(input.participants.as_deref());
    if participants.is_empty() {
        if let Some(n) = &name {
            participants.push(n.clone());
        }
    }

    let mut tags = clean_list(input.tags.as_deref());
    if tags.is_empty() {
        tags.push(category.clone().unwrap_or_else(|| DEFAULT_TAG.to_string()));
    }

    let status = match clean(input.status.as_deref()) {
        Some(s) => s.parse::<RecordStatus>()?,
        None => RecordStatus::default(),
    };

    Ok(NewRecord {
        title,
        description,
        status,
        tags,
        date,
        participants,
        name,
        phone,
        email,
        category,
    })
}

/// Strict check used by the booking form before anything is normalized.
///
/// The form requires a contact name, a preferred date and a preferred time,
/// and rejects malformed e-mail addresses.
///
/// # Errors
///
/// Returns [`RecordbookError::Validation`] naming the first offending field.
pub fn validate_form(input: &RecordInput) -> Result<()> {
    if clean(input.name.as_deref()).is_none() {
        return Err(RecordbookError::Validation(
            "Имя обязательно для заполнения".to_string(),
        ));
    }
    if let Some(email) = clean(input.email.as_deref()) {
        if !is_valid_email(&email) {
            return Err(RecordbookError::Validation("Некорректный email".to_string()));
        }
    }
    if clean(input.preferred_date.as_deref()).is_none() {
        return Err(RecordbookError::Validation("Дата обязательна".to_string()));
    }
    if clean(input.preferred_time.as_deref()).is_none() {
        return Err(RecordbookError::Validation("Время обязательно".to_string()));
    }
    if let Some(status) = clean(input.status.as_deref()) {
        status.parse::<RecordStatus>()?;
    }
    Ok(())
}

/// Parses a stored or submitted timestamp.
///
/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM[:SS]` (taken as UTC), or a
/// bare `YYYY-MM-DD` (midnight UTC).
///
/// # Errors
///
/// Returns [`RecordbookError::Validation`] if none of the formats match.
pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(naive.and_utc());
        }
    }
    if let Some(midnight) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc());
    }
    Err(RecordbookError::Validation(format!("Invalid date: {raw}")))
}

fn resolve_date(input: &RecordInput) -> Result<DateTime<Utc>> {
    let preferred_date = clean(input.preferred_date.as_deref());
    let preferred_time = clean(input.preferred_time.as_deref());
    if let (Some(day), Some(time)) = (preferred_date, preferred_time) {
        return combine_preferred(&day, &time);
    }
    match clean(input.date.as_deref()) {
        Some(raw) => parse_instant(&raw),
        None => Err(RecordbookError::Validation(
            "A date or both preferredDate and preferredTime are required".to_string(),
        )),
    }
}

/// Date portion of `day` (first ten characters) plus `time` as HH:MM, in UTC.
fn combine_preferred(day: &str, time: &str) -> Result<DateTime<Utc>> {
    let day_part = day.get(..10).unwrap_or(day);
    let date = NaiveDate::parse_from_str(day_part, "%Y-%m-%d")
        .map_err(|_| RecordbookError::Validation(format!("Invalid preferredDate: {day}")))?;
    let time_of_day = NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .map_err(|_| RecordbookError::Validation(format!("Invalid preferredTime: {time}")))?;
    Ok(date.and_time(time_of_day).and_utc())
}

fn contact_description(phone: Option<&str>, email: Option<&str>) -> Option<String> {
    let segments: Vec<String> = [
        phone.map(|p| format!("{PHONE_LABEL}{p}")),
        email.map(|e| format!("{EMAIL_LABEL}{e}")),
    ]
    .into_iter()
    .flatten()
    .collect();
    if segments.is_empty() {
        None
    } else {
        Some(segments.join(DESCRIPTION_SEPARATOR))
    }
}

fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Trims entries, drops empties and repeats, keeps first-seen order.
fn clean_list(values: Option<&[String]>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for v in values.unwrap_or_default() {
        let v = v.trim();
        if !v.is_empty() && !out.iter().any(|existing| existing == v) {
            out.push(v.to_string());
        }
    }
    out
}

fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}
