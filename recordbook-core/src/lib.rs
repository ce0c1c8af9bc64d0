//! Core library for Recordbook, an appointment and lesson record manager.
//!
//! The primary entry point is [`RecordStore`], which owns an SQLite file of
//! records. Everything else works on a snapshot of records: [`RecordQuery`]
//! filters and sorts, [`SearchIndex`] does fuzzy search, [`classify`]
//! suggests tags, [`WorkloadAnalyzer`] and [`DashboardStats`] aggregate.
//!
//! Types are re-exported from their respective sub-modules for convenience;
//! consumers should import from the crate root rather than the `core` module.

pub mod core;

// Re-export commonly used types.
#[doc(inline)]
pub use core::{
    analytics::{DashboardStats, DayCount, MonthCount, StatusSlice, TagStat},
    error::{RecordbookError, Result},
    export::{export_csv, export_icalendar, export_json, import_json, ExportRecords, EXPORT_VERSION},
    normalize::{normalize, parse_instant, validate_form, DEFAULT_TAG},
    query::{RecordQuery, SortKey, SortOrder, StatusFilter, TagFilter},
    record::{NewRecord, Record, RecordInput, RecordStatus},
    search::{SearchField, SearchFilters, SearchIndex, SearchResult},
    settings::{load_settings, save_settings, settings_file_path, Language, Theme, UserSettings},
    storage::Storage,
    store::RecordStore,
    tag_registry::{
        slugify_tag_name, EnhancedTag, NewTag, TagCategory, TagRegistry, TagUpdate, TAG_CATEGORIES,
    },
    tag_rules::{
        classify, classify_record, suggest_tags_from_name, tag_color, TagRule, TagSuggestion,
        TagSuggestions, TAG_RULES,
    },
    templates::{LessonTemplate, LESSON_TEMPLATES},
    workload::{
        CapacityAnalysis, DailyWorkload, HourlyBucket, Intensity, WeeklyStats, WeeklyTrend,
        WorkloadAnalytics, WorkloadAnalyzer, WorkloadConfig, WorkloadSession,
    },
};
