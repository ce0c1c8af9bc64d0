//! Approximate free-text search with structured filters.
//!
//! Per-field similarity comes from `strsim`; this module owns only the field
//! weighting, ranking and filter composition. Within one filter type any
//! value may match (OR); across filter types all must hold (AND).

use crate::core::tag_rules::classify;
use crate::{Record, RecordStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Field distances above this do not count as a match.
pub const MATCH_THRESHOLD: f64 = 0.3;

/// Queries shorter than this (in characters) only match exact substrings.
pub const MIN_MATCH_CHARS: usize = 2;

const MAX_SUGGESTIONS: usize = 8;

/// Used in place of a zero distance so that weights still order exact hits.
const EXACT_HIT: f64 = f64::EPSILON;

const POPULAR_SEARCHES: &[&str] = &[
    "логопедия",
    "консультация",
    "групповое занятие",
    "индивидуальное",
    "развитие речи",
];

/// A searchable record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    Title,
    Name,
    Tags,
    Description,
    Email,
    Phone,
}

impl SearchField {
    pub const ALL: [SearchField; 6] = [
        Self::Title,
        Self::Name,
        Self::Tags,
        Self::Description,
        Self::Email,
        Self::Phone,
    ];

    /// Relative importance of a hit in this field.
    #[must_use]
    pub fn weight(self) -> f64 {
        match self {
            Self::Title => 0.7,
            Self::Name => 0.6,
            Self::Tags => 0.5,
            Self::Description => 0.4,
            Self::Email => 0.3,
            Self::Phone => 0.2,
        }
    }

    fn values(self, record: &Record) -> Vec<&str> {
        match self {
            Self::Title => record.title.as_deref().into_iter().collect(),
            Self::Name => record.name.as_deref().into_iter().collect(),
            Self::Tags => record.tags.iter().map(String::as_str).collect(),
            Self::Description => record.description.as_deref().into_iter().collect(),
            Self::Email => record.email.as_deref().into_iter().collect(),
            Self::Phone => record.phone.as_deref().into_iter().collect(),
        }
    }
}

/// Structured restrictions applied after (or instead of) text matching.
///
/// Empty lists and `None` bounds do not restrict.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchFilters {
    pub tags: Vec<String>,
    pub statuses: Vec<RecordStatus>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub participants: Vec<String>,
}

impl SearchFilters {
    /// Returns `true` if `record` satisfies every non-empty filter.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        if !self.tags.is_empty() && !self.tags.iter().any(|t| record.tags.contains(t)) {
            return false;
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&record.status) {
            return false;
        }
        if self.date_from.is_some_and(|from| record.date < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| record.date > to) {
            return false;
        }
        if !self.participants.is_empty()
            && !self.participants.iter().any(|p| record.participants.contains(p))
        {
            return false;
        }
        true
    }
}

/// One hit. Lower `score` is better; `None` means the result is unranked.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult<'a> {
    pub record: &'a Record,
    pub score: Option<f64>,
    pub matched_fields: Vec<SearchField>,
}

impl<'a> SearchResult<'a> {
    fn unranked(record: &'a Record) -> Self {
        Self { record, score: None, matched_fields: Vec::new() }
    }
}

/// Search view over a borrowed record snapshot.
///
/// Build a new index whenever the snapshot changes; the borrow keeps the
/// index from outliving the data it searches.
#[derive(Debug, Clone, Copy)]
pub struct SearchIndex<'a> {
    records: &'a [Record],
}

impl<'a> SearchIndex<'a> {
    #[must_use]
    pub fn new(records: &'a [Record]) -> Self {
        Self { records }
    }

    /// Runs `query` and then `filters` over the snapshot.
    ///
    /// A blank query with no filters returns every record unranked, in
    /// snapshot order. A blank query with filters returns the filtered
    /// snapshot, also unranked. Otherwise results are ordered best first.
    #[must_use]
    pub fn search(&self, query: &str, filters: Option<&SearchFilters>) -> Vec<SearchResult<'a>> {
        let query = query.trim().to_lowercase();
        let keep = |record: &Record| filters.map_or(true, |f| f.matches(record));

        if query.is_empty() {
            return self
                .records
                .iter()
                .filter(|r| keep(r))
                .map(SearchResult::unranked)
                .collect();
        }

        let mut results: Vec<SearchResult<'a>> = self
            .records
            .iter()
            .filter(|r| keep(r))
            .filter_map(|record| score_record(&query, record))
            .collect();
        results.sort_by(|a, b| {
            a.score
                .unwrap_or(f64::MAX)
                .total_cmp(&b.score.unwrap_or(f64::MAX))
        });
        results
    }

    /// Autocomplete: titles and names containing `query`, then tags the
    /// classifier suggests for it. At most eight, without repeats.
    #[must_use]
    pub fn suggestions(&self, query: &str) -> Vec<String> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        let mut out: Vec<String> = Vec::new();
        let mut push = |s: &str| {
            if !out.iter().any(|existing| existing == s) {
                out.push(s.to_string());
            }
        };
        for record in self.records {
            for value in [record.title.as_deref(), record.name.as_deref()].into_iter().flatten() {
                if value.to_lowercase().contains(&needle) {
                    push(value);
                }
            }
        }
        for suggestion in &classify(query) {
            push(&suggestion.tag);
        }
        out.truncate(MAX_SUGGESTIONS);
        out
    }

    /// Canned queries shown before the user types anything.
    #[must_use]
    pub fn popular_searches() -> &'static [&'static str] {
        POPULAR_SEARCHES
    }
}

fn score_record<'a>(query: &str, record: &'a Record) -> Option<SearchResult<'a>> {
    let mut score = 1.0_f64;
    let mut matched_fields = Vec::new();
    for field in SearchField::ALL {
        let best = field
            .values(record)
            .into_iter()
            .map(|value| field_distance(query, value))
            .fold(f64::INFINITY, f64::min);
        if best <= MATCH_THRESHOLD {
            score *= best.max(EXACT_HIT).powf(field.weight());
            matched_fields.push(field);
        }
    }
    if matched_fields.is_empty() {
        None
    } else {
        Some(SearchResult { record, score: Some(score), matched_fields })
    }
}

/// Distance in `[0, 1]` between a lowercase query and a field value.
///
/// Zero for a substring hit; otherwise the best normalized Levenshtein
/// distance against word windows of the value, both whole and cut to the
/// query's length so that a typo in a prefix still matches.
fn field_distance(query: &str, value: &str) -> f64 {
    let value = value.to_lowercase();
    if value.contains(query) {
        return 0.0;
    }
    let query_chars = query.chars().count();
    if query_chars < MIN_MATCH_CHARS {
        return 1.0;
    }

    let words: Vec<&str> = value.split_whitespace().collect();
    let window = query.split_whitespace().count().clamp(1, words.len().max(1));
    let mut best = 0.0_f64;
    for chunk in words.windows(window) {
        let candidate = chunk.join(" ");
        let prefix: String = candidate.chars().take(query_chars).collect();
        best = best
            .max(strsim::normalized_levenshtein(query, &candidate))
            .max(strsim::normalized_levenshtein(query, &prefix));
    }
    1.0 - best
}
