//! SQLite-backed record store.
//!
//! Every write goes through [`normalize`](crate::normalize), so stored rows
//! always satisfy the record invariants. Dates are kept as UTC milliseconds;
//! records returned by writes are truncated the same way, so they compare
//! equal to what a later read gives back.

use crate::{
    normalize, NewRecord, Record, RecordInput, RecordQuery, RecordStatus, RecordbookError, Result,
    Storage, UserSettings,
};
use chrono::{DateTime, Duration, SubsecRound, Utc};
use std::path::Path;
use uuid::Uuid;

const RECORD_COLUMNS: &str = "id, title, description, status, tags_json, date, \
     participants_json, name, phone, email, category, created_at";

type RecordRow = (
    String,
    Option<String>,
    Option<String>,
    String,
    String,
    i64,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    i64,
);

/// Persistent collection of records.
pub struct RecordStore {
    storage: Storage,
}

impl RecordStore {
    /// Creates a new database file at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            storage: Storage::create(path)?,
        })
    }

    /// Opens an existing database file created by [`RecordStore::create`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            storage: Storage::open(path)?,
        })
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            storage: Storage::in_memory()?,
        })
    }

    /// Normalizes `input` and stores it under a fresh UUID.
    pub fn insert(&mut self, input: &RecordInput) -> Result<Record> {
        let created_at = Utc::now().trunc_subsecs(3);
        let mut record = normalize(input)?.into_record(Uuid::new_v4().to_string(), created_at);
        record.date = record.date.trunc_subsecs(3);
        let conn = self.storage.connection();
        conn.execute(
            &format!(
                "INSERT INTO records ({RECORD_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
            ),
            rusqlite::params![
                record.id,
                record.title,
                record.description,
                record.status.as_str(),
                serde_json::to_string(&record.tags)?,
                record.date.timestamp_millis(),
                serde_json::to_string(&record.participants)?,
                record.name,
                record.phone,
                record.email,
                record.category,
                record.created_at.timestamp_millis(),
            ],
        )?;
        log::info!("created record {}", record.id);
        Ok(record)
    }

    pub fn get(&self, id: &str) -> Result<Record> {
        let row = self
            .storage
            .connection()
            .query_row(
                &format!("SELECT {RECORD_COLUMNS} FROM records WHERE id = ?1"),
                [id],
                map_record_row,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    RecordbookError::NotFound(format!("Record {id} not found"))
                }
                other => other.into(),
            })?;
        record_from_row_tuple(row)
    }

    /// All records, earliest date first.
    pub fn list(&self) -> Result<Vec<Record>> {
        let mut stmt = self.storage.connection().prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM records ORDER BY date ASC, id ASC"
        ))?;
        let rows = stmt
            .query_map([], map_record_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(record_from_row_tuple).collect()
    }

    /// Applies `query` to the current snapshot.
    pub fn find(&self, query: &RecordQuery) -> Result<Vec<Record>> {
        Ok(query.apply(&self.list()?))
    }

    /// Replaces every field of record `id` with the normalized `input`.
    ///
    /// `id` and `created_at` are preserved.
    pub fn replace(&mut self, id: &str, input: &RecordInput) -> Result<Record> {
        let existing = self.get(id)?;
        let NewRecord {
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
        } = normalize(input)?;
        let date = date.trunc_subsecs(3);

        self.storage.connection().execute(
            "UPDATE records SET title = ?1, description = ?2, status = ?3, tags_json = ?4,
                 date = ?5, participants_json = ?6, name = ?7, phone = ?8, email = ?9,
                 category = ?10
             WHERE id = ?11",
            rusqlite::params![
                title,
                description,
                status.as_str(),
                serde_json::to_string(&tags)?,
                date.timestamp_millis(),
                serde_json::to_string(&participants)?,
                name,
                phone,
                email,
                category,
                id,
            ],
        )?;
        log::info!("replaced record {id}");

        Ok(Record {
            id: existing.id,
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
            created_at: existing.created_at,
        })
    }

    /// Removes record `id` and its reminder bookkeeping.
    pub fn delete(&mut self, id: &str) -> Result<()> {
        let tx = self.storage.connection_mut().transaction()?;
        let removed = tx.execute("DELETE FROM records WHERE id = ?1", [id])?;
        if removed == 0 {
            return Err(RecordbookError::NotFound(format!("Record {id} not found")));
        }
        tx.execute("DELETE FROM notified_records WHERE record_id = ?1", [id])?;
        tx.commit()?;
        log::info!("deleted record {id}");
        Ok(())
    }

    /// Active records starting within the lead time after `now` whose
    /// reminder has not been sent, or is due again when repeats are on.
    pub fn due_notifications(
        &self,
        now: DateTime<Utc>,
        settings: &UserSettings,
    ) -> Result<Vec<Record>> {
        let horizon = now + Duration::days(i64::from(settings.notification_lead_time));
        let mut stmt = self.storage.connection().prepare(&format!(
            "SELECT {}, n.notified_at
             FROM records r
             LEFT JOIN notified_records n ON n.record_id = r.id
             WHERE r.status = ?1 AND r.date > ?2 AND r.date <= ?3
             ORDER BY r.date ASC, r.id ASC",
            prefixed_columns("r")
        ))?;
        let rows = stmt
            .query_map(
                rusqlite::params![
                    RecordStatus::Active.as_str(),
                    now.timestamp_millis(),
                    horizon.timestamp_millis()
                ],
                |row| Ok((map_record_row(row)?, row.get::<_, Option<i64>>(12)?)),
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let repeat_after = Duration::minutes(i64::from(settings.notification_frequency));
        let mut due = Vec::new();
        for (row, notified_at) in rows {
            let ready = match notified_at {
                None => true,
                Some(ms) => {
                    settings.enable_repeating_notifications
                        && now - millis_to_datetime(ms)? >= repeat_after
                }
            };
            if ready {
                due.push(record_from_row_tuple(row)?);
            }
        }
        Ok(due)
    }

    /// Records that a reminder for `id` went out at `now`.
    pub fn mark_notified(&mut self, id: &str, now: DateTime<Utc>) -> Result<()> {
        self.get(id)?;
        self.storage.connection().execute(
            "INSERT OR REPLACE INTO notified_records (record_id, notified_at) VALUES (?1, ?2)",
            rusqlite::params![id, now.timestamp_millis()],
        )?;
        log::debug!("marked record {id} as notified");
        Ok(())
    }
}

fn prefixed_columns(alias: &str) -> String {
    RECORD_COLUMNS
        .split(',')
        .map(|c| format!("{alias}.{}", c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Row-mapping closure for `rusqlite::Row` → raw tuple.
fn map_record_row(row: &rusqlite::Row) -> rusqlite::Result<RecordRow> {
    Ok((
        row.get::<_, String>(0)?,
        row.get::<_, Option<String>>(1)?,
        row.get::<_, Option<String>>(2)?,
        row.get::<_, String>(3)?,
        row.get::<_, String>(4)?,
        row.get::<_, i64>(5)?,
        row.get::<_, String>(6)?,
        row.get::<_, Option<String>>(7)?,
        row.get::<_, Option<String>>(8)?,
        row.get::<_, Option<String>>(9)?,
        row.get::<_, Option<String>>(10)?,
        row.get::<_, i64>(11)?,
    ))
}

/// Converts a raw 12-column tuple into a [`Record`], parsing the JSON list columns.
fn record_from_row_tuple(
    (id, title, description, status, tags_json, date, participants_json, name, phone, email, category, created_at): RecordRow,
) -> Result<Record> {
    Ok(Record {
        id,
        title,
        description,
        status: status.parse()?,
        tags: serde_json::from_str(&tags_json)?,
        date: millis_to_datetime(date)?,
        participants: serde_json::from_str(&participants_json)?,
        name,
        phone,
        email,
        category,
        created_at: millis_to_datetime(created_at)?,
    })
}

fn millis_to_datetime(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| {
        log::warn!("stored timestamp {ms} is out of range");
        RecordbookError::Validation(format!("Stored timestamp {ms} is out of range"))
    })
}
