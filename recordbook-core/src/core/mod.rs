//! Internal domain modules for the Recordbook core library.
//!
//! All public types from these modules are re-exported at the crate root
//! with `#[doc(inline)]`; import from there in preference to this module.

pub mod analytics;
pub mod error;
pub mod export;
pub mod normalize;
pub mod query;
pub mod record;
pub mod search;
pub mod settings;
pub mod storage;
pub mod store;
pub mod tag_registry;
pub mod tag_rules;
pub mod templates;
pub mod workload;

#[doc(inline)]
pub use analytics::{DashboardStats, DayCount, MonthCount, StatusSlice, TagStat};
#[doc(inline)]
pub use error::{RecordbookError, Result};
#[doc(inline)]
pub use export::{
    export_csv, export_icalendar, export_json, import_json, ExportRecords, EXPORT_VERSION,
};
#[doc(inline)]
pub use normalize::{normalize, parse_instant, validate_form, DEFAULT_TAG};
#[doc(inline)]
pub use query::{RecordQuery, SortKey, SortOrder, StatusFilter, TagFilter};
#[doc(inline)]
pub use record::{NewRecord, Record, RecordInput, RecordStatus};
#[doc(inline)]
pub use search::{SearchField, SearchFilters, SearchIndex, SearchResult};
#[doc(inline)]
pub use settings::{load_settings, save_settings, settings_file_path, Language, Theme, UserSettings};
#[doc(inline)]
pub use storage::Storage;
#[doc(inline)]
pub use store::RecordStore;
#[doc(inline)]
pub use tag_registry::{
    slugify_tag_name, EnhancedTag, NewTag, TagCategory, TagRegistry, TagUpdate, TAG_CATEGORIES,
};
#[doc(inline)]
pub use tag_rules::{
    classify, classify_record, suggest_tags_from_name, tag_color, TagRule, TagSuggestion,
    TagSuggestions, TAG_RULES,
};
#[doc(inline)]
pub use templates::{LessonTemplate, LESSON_TEMPLATES};
#[doc(inline)]
pub use workload::{
    CapacityAnalysis, DailyWorkload, HourlyBucket, Intensity, WeeklyStats, WeeklyTrend,
    WorkloadAnalytics, WorkloadAnalyzer, WorkloadConfig, WorkloadSession,
};
