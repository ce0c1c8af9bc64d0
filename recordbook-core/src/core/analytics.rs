//! Headline numbers and chart series for the records dashboard.

use crate::{Record, RecordStatus};
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;

const TOP_TAGS: usize = 10;
const TREND_MONTHS: u32 = 6;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagStat {
    pub name: String,
    pub count: usize,
    /// `hsl(...)` color spread by golden-angle steps over first-seen order.
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCount {
    pub date: NaiveDate,
    /// Short weekday name, e.g. `"Mon"`.
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSlice {
    pub status: RecordStatus,
    pub name: String,
    pub value: usize,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    pub year: i32,
    pub month: u32,
    /// Short month name, e.g. `"Aug"`.
    pub label: String,
    pub count: usize,
}

/// Aggregates shown on the dashboard overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_records: usize,
    pub active_records: usize,
    pub pending_records: usize,
    pub completed_records: usize,
    /// Records dated in the Monday-based week containing `today`.
    pub weekly_records: usize,
    /// Records dated in `today`'s calendar month.
    pub monthly_records: usize,
    pub tag_stats: Vec<TagStat>,
    pub weekly_chart: Vec<DayCount>,
    pub status_chart: Vec<StatusSlice>,
    /// Last six months, oldest first.
    pub monthly_trend: Vec<MonthCount>,
}

impl DashboardStats {
    #[must_use]
    pub fn compute(records: &[Record], today: NaiveDate) -> Self {
        let count_status = |status| records.iter().filter(|r| r.status == status).count();
        let active_records = count_status(RecordStatus::Active);
        let pending_records = count_status(RecordStatus::Pending);
        let completed_records = count_status(RecordStatus::Completed);

        let week_start = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
        let week_end = week_start + Duration::days(6);
        let weekly_records = records
            .iter()
            .filter(|r| (week_start..=week_end).contains(&r.date.date_naive()))
            .count();
        let monthly_records = records
            .iter()
            .filter(|r| same_month(r.date.date_naive(), today.year(), today.month()))
            .count();

        let weekly_chart = (0..7)
            .map(|offset| {
                let date = week_start + Duration::days(offset);
                DayCount {
                    date,
                    label: date.format("%a").to_string(),
                    count: records.iter().filter(|r| r.date.date_naive() == date).count(),
                }
            })
            .collect();

        let status_chart = [
            (RecordStatus::Active, "Активные", "#22c55e", active_records),
            (RecordStatus::Pending, "Ожидающие", "#eab308", pending_records),
            (RecordStatus::Completed, "Завершенные", "#6b7280", completed_records),
        ]
        .into_iter()
        .filter(|(_, _, _, value)| *value > 0)
        .map(|(status, name, color, value)| StatusSlice {
            status,
            name: name.to_string(),
            value,
            color: color.to_string(),
        })
        .collect();

        let monthly_trend = (0..TREND_MONTHS)
            .rev()
            .map(|back| {
                let (year, month) = months_before(today.year(), today.month(), back);
                let label = NaiveDate::from_ymd_opt(year, month, 1)
                    .map(|d| d.format("%b").to_string())
                    .unwrap_or_default();
                MonthCount {
                    year,
                    month,
                    label,
                    count: records
                        .iter()
                        .filter(|r| same_month(r.date.date_naive(), year, month))
                        .count(),
                }
            })
            .collect();

        Self {
            total_records: records.len(),
            active_records,
            pending_records,
            completed_records,
            weekly_records,
            monthly_records,
            tag_stats: tag_stats(records),
            weekly_chart,
            status_chart,
            monthly_trend,
        }
    }
}

fn tag_stats(records: &[Record]) -> Vec<TagStat> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for tag in records.iter().flat_map(|r| r.tags.iter()) {
        let count = counts.entry(tag.as_str()).or_insert(0);
        if *count == 0 {
            order.push(tag.as_str());
        }
        *count += 1;
    }

    let mut stats: Vec<TagStat> = order
        .into_iter()
        .enumerate()
        .map(|(index, name)| TagStat {
            name: name.to_string(),
            count: counts.get(name).copied().unwrap_or_default(),
            color: format!("hsl({}, 70%, 50%)", (index as f64 * 137.5) % 360.0),
        })
        .collect();
    stats.sort_by(|a, b| b.count.cmp(&a.count));
    stats.truncate(TOP_TAGS);
    stats
}

fn same_month(date: NaiveDate, year: i32, month: u32) -> bool {
    date.year() == year && date.month() == month
}

/// `(year, month)` that lies `back` months before the given one.
fn months_before(year: i32, month: u32, back: u32) -> (i32, u32) {
    let zero_based = year * 12 + month as i32 - 1 - back as i32;
    (zero_based.div_euclid(12), zero_based.rem_euclid(12) as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(id: &str, status: RecordStatus, tags: &[&str], y: i32, m: u32, d: u32) -> Record {
        Record {
            id: id.to_string(),
            title: None,
            description: None,
            status,
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
            date: Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap(),
            participants: vec![],
            name: None,
            phone: None,
            email: None,
            category: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn today() -> NaiveDate {
        // Wednesday
        NaiveDate::from_ymd_opt(2025, 8, 13).unwrap()
    }

    fn snapshot() -> Vec<Record> {
        vec![
            record("a", RecordStatus::Active, &["чтение", "письмо"], 2025, 8, 11),
            record("b", RecordStatus::Active, &["чтение"], 2025, 8, 17),
            record("c", RecordStatus::Pending, &["логопедия"], 2025, 8, 18),
            record("d", RecordStatus::Active, &["письмо", "чтение"], 2025, 7, 2),
            record("e", RecordStatus::Active, &[], 2025, 1, 20),
        ]
    }

    #[test]
    fn test_status_totals_and_chart() {
        let stats = DashboardStats::compute(&snapshot(), today());
        assert_eq!(stats.total_records, 5);
        assert_eq!(stats.active_records, 4);
        assert_eq!(stats.pending_records, 1);
        assert_eq!(stats.completed_records, 0);
        let names: Vec<&str> = stats.status_chart.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Активные", "Ожидающие"]);
    }

    #[test]
    fn test_week_and_month_windows() {
        let stats = DashboardStats::compute(&snapshot(), today());
        // Mon 11 .. Sun 17 August
        assert_eq!(stats.weekly_records, 2);
        assert_eq!(stats.monthly_records, 3);
        assert_eq!(stats.weekly_chart.len(), 7);
        assert_eq!(stats.weekly_chart[0].label, "Mon");
        assert_eq!(stats.weekly_chart[0].count, 1);
        assert_eq!(stats.weekly_chart[6].count, 1);
    }

    #[test]
    fn test_tag_stats_sorted_with_stable_colors() {
        let stats = DashboardStats::compute(&snapshot(), today());
        let tags: Vec<(&str, usize)> =
            stats.tag_stats.iter().map(|t| (t.name.as_str(), t.count)).collect();
        assert_eq!(tags, vec![("чтение", 3), ("письмо", 2), ("логопедия", 1)]);
        assert_eq!(stats.tag_stats[0].color, "hsl(0, 70%, 50%)");
        assert_eq!(stats.tag_stats[1].color, "hsl(137.5, 70%, 50%)");
    }

    #[test]
    fn test_monthly_trend_spans_six_months() {
        let stats = DashboardStats::compute(&snapshot(), today());
        let months: Vec<(i32, u32, usize)> =
            stats.monthly_trend.iter().map(|m| (m.year, m.month, m.count)).collect();
        assert_eq!(
            months,
            vec![(2025, 3, 0), (2025, 4, 0), (2025, 5, 0), (2025, 6, 0), (2025, 7, 1), (2025, 8, 3)]
        );
        assert_eq!(stats.monthly_trend[5].label, "Aug");
    }

    #[test]
    fn test_months_before_wraps_year() {
        assert_eq!(months_before(2025, 2, 3), (2024, 11));
        assert_eq!(months_before(2025, 1, 0), (2025, 1));
    }
}
