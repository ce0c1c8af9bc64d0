//! Filter and sort parameters for listing records.
//!
//! A [`RecordQuery`] is usually parsed from the flat `search` / `status` /
//! `tag` / `sortBy` / `sortOrder` pairs of a request URL. An empty value or
//! the `"all"` sentinel means "do not filter on this".

use crate::{Record, RecordStatus, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

const ALL_SENTINEL: &str = "all";

/// Status restriction for a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(RecordStatus),
}

/// Tag restriction for a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TagFilter {
    #[default]
    All,
    Only(String),
}

/// Field a listing is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Date,
    Title,
    Status,
    Tag,
}

/// Direction of a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Complete filter + sort description for a record listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordQuery {
    /// Case-insensitive substring matched against title, description, name and email.
    pub search: Option<String>,
    pub status: StatusFilter,
    pub tag: TagFilter,
    pub sort_by: SortKey,
    pub sort_order: SortOrder,
}

impl RecordQuery {
    /// Builds a query from flat key/value pairs.
    ///
    /// Recognised keys are `search`, `status`, `tag`, `sortBy` and
    /// `sortOrder`; anything else is ignored. An unknown `sortBy` falls back
    /// to `date` and any `sortOrder` other than `desc` means ascending.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RecordbookError::Validation`] if `status` is neither
    /// empty, `"all"`, nor a known status.
    pub fn from_params<I, K, V>(params: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut query = Self::default();
        for (key, value) in params {
            let value = value.as_ref().trim();
            let unfiltered = value.is_empty() || value.eq_ignore_ascii_case(ALL_SENTINEL);
            match key.as_ref() {
                "search" if !value.is_empty() => query.search = Some(value.to_string()),
                "status" if !unfiltered => query.status = StatusFilter::Only(value.parse()?),
                "tag" if !unfiltered => query.tag = TagFilter::Only(value.to_string()),
                "sortBy" => {
                    query.sort_by = match value.to_lowercase().as_str() {
                        "title" => SortKey::Title,
                        "status" => SortKey::Status,
                        "tag" => SortKey::Tag,
                        _ => SortKey::Date,
                    }
                }
                "sortOrder" => {
                    query.sort_order = if value.eq_ignore_ascii_case("desc") {
                        SortOrder::Desc
                    } else {
                        SortOrder::Asc
                    }
                }
                _ => {}
            }
        }
        Ok(query)
    }

    /// Returns `true` if `record` passes every filter of this query.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        if let StatusFilter::Only(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        if let TagFilter::Only(tag) = &self.tag {
            if !record.tags.iter().any(|t| t == tag) {
                return false;
            }
        }
        match &self.search {
            Some(term) => {
                let needle = term.to_lowercase();
                [&record.title, &record.description, &record.name, &record.email]
                    .into_iter()
                    .flatten()
                    .any(|field| field.to_lowercase().contains(&needle))
            }
            None => true,
        }
    }

    /// Orders two records by the query's sort key and direction.
    #[must_use]
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        let ordering = match self.sort_by {
            SortKey::Date => a.date.cmp(&b.date),
            SortKey::Title => lowercase(a.title.as_deref()).cmp(&lowercase(b.title.as_deref())),
            SortKey::Status => a.status.as_str().cmp(b.status.as_str()),
            SortKey::Tag => lowercase(a.tags.first().map(String::as_str))
                .cmp(&lowercase(b.tags.first().map(String::as_str))),
        };
        match self.sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }

    /// The filter half of the query as a standalone closure.
    pub fn predicate(&self) -> impl Fn(&Record) -> bool + '_ {
        move |record| self.matches(record)
    }

    /// The ordering half of the query as a standalone closure.
    pub fn comparator(&self) -> impl Fn(&Record, &Record) -> Ordering + '_ {
        move |a, b| self.compare(a, b)
    }

    /// Returns the `(predicate, comparator)` pair for callers that drive
    /// their own iteration.
    pub fn build(
        &self,
    ) -> (
        impl Fn(&Record) -> bool + '_,
        impl Fn(&Record, &Record) -> Ordering + '_,
    ) {
        (self.predicate(), self.comparator())
    }

    /// Filters and sorts a snapshot, returning owned copies.
    ///
    /// The sort is stable, so equal keys keep snapshot order and the result
    /// is the same for the same snapshot every time.
    #[must_use]
    pub fn apply(&self, records: &[Record]) -> Vec<Record> {
        let mut out: Vec<Record> = records.iter().filter(|r| self.matches(r)).cloned().collect();
        out.sort_by(|a, b| self.compare(a, b));
        out
    }
}

fn lowercase(value: Option<&str>) -> String {
    value.unwrap_or_default().to_lowercase()
}
