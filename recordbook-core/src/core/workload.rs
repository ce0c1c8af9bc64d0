//! Workload analytics over a snapshot of records.
//!
//! Only `active` records count. Days are calendar days in UTC.

use crate::{Record, RecordStatus, RecordbookError, Result};
use chrono::{Datelike, Duration, NaiveDate, Timelike, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Number of weekly buckets in [`WorkloadAnalytics::monthly_trends`].
const TREND_WEEKS: i64 = 4;

/// Longest duration a single session may claim: one full day.
pub const MAX_SESSION_MINUTES: u32 = 24 * 60;

static DURATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*(мин|минут|hour|час)").expect("duration pattern is valid")
});

/// Tunable thresholds of the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkloadConfig {
    /// First working hour of the day (inclusive).
    pub working_hours_start: u32,
    /// End of the working day (exclusive).
    pub working_hours_end: u32,
    pub max_sessions_per_day: u32,
    /// Minutes assumed for a session whose description names no duration.
    pub default_session_duration: u32,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            working_hours_start: 9,
            working_hours_end: 18,
            max_sessions_per_day: 8,
            default_session_duration: 60,
        }
    }
}

impl WorkloadConfig {
    /// Checks that the working window is non-empty and the daily max is positive.
    ///
    /// # Errors
    ///
    /// Returns [`RecordbookError::Validation`] describing the bad value.
    pub fn validate(&self) -> Result<()> {
        if self.working_hours_start >= self.working_hours_end || self.working_hours_end > 24 {
            return Err(RecordbookError::Validation(format!(
                "Invalid working hours {}..{}",
                self.working_hours_start, self.working_hours_end
            )));
        }
        if self.max_sessions_per_day == 0 {
            return Err(RecordbookError::Validation(
                "maxSessionsPerDay must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Zero for an inverted window, which [`validate`](Self::validate) rejects
    /// but a deserialized config may still carry.
    fn working_hours(&self) -> u32 {
        self.working_hours_end.saturating_sub(self.working_hours_start)
    }
}

/// Load classification of a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Low,
    Medium,
    High,
    Overload,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadSession {
    pub id: String,
    /// Start time as `HH:MM` (UTC).
    pub time: String,
    /// Minutes.
    pub duration: u32,
    /// First tag of the record, or `"general"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub participants: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyWorkload {
    pub date: NaiveDate,
    pub total_sessions: usize,
    /// Sum of session durations in minutes.
    pub duration: u64,
    pub intensity: Intensity,
    pub sessions: Vec<WorkloadSession>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyStats {
    pub total_hours: f64,
    pub average_sessions_per_day: f64,
    /// First day with the most sessions.
    pub peak_day: Option<NaiveDate>,
    /// First day with the fewest sessions.
    pub lightest_day: Option<NaiveDate>,
    /// Percentage of the working-hours window that is booked.
    pub utilization: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourlyBucket {
    pub hour: u32,
    pub sessions: usize,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyTrend {
    pub week: String,
    pub start: NaiveDate,
    pub hours: f64,
    pub sessions: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityAnalysis {
    /// Sessions per week at the configured daily maximum.
    pub max_capacity: u32,
    pub current_load: usize,
    pub recommended_capacity: u32,
    pub overload_days: Vec<NaiveDate>,
}

/// Everything the workload dashboard shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadAnalytics {
    pub daily_workload: Vec<DailyWorkload>,
    pub weekly_stats: WeeklyStats,
    pub hourly_distribution: Vec<HourlyBucket>,
    pub monthly_trends: Vec<WeeklyTrend>,
    pub capacity_analysis: CapacityAnalysis,
}

/// Computes [`WorkloadAnalytics`] from a caller-supplied record snapshot.
///
/// The analyzer keeps only its configuration; setters take effect on the
/// next call.
#[derive(Debug, Clone, Default)]
pub struct WorkloadAnalyzer {
    config: WorkloadConfig,
}

impl WorkloadAnalyzer {
    #[must_use]
    pub fn new(config: WorkloadConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &WorkloadConfig {
        &self.config
    }

    /// # Errors
    ///
    /// Returns [`RecordbookError::Validation`] unless `start < end <= 24`.
    pub fn set_working_hours(&mut self, start: u32, end: u32) -> Result<()> {
        let candidate = WorkloadConfig {
            working_hours_start: start,
            working_hours_end: end,
            ..self.config
        };
        candidate.validate()?;
        self.config = candidate;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`RecordbookError::Validation`] if `max` is zero.
    pub fn set_max_sessions(&mut self, max: u32) -> Result<()> {
        let candidate = WorkloadConfig { max_sessions_per_day: max, ..self.config };
        candidate.validate()?;
        self.config = candidate;
        Ok(())
    }

    pub fn set_default_session_duration(&mut self, minutes: u32) {
        self.config.default_session_duration = minutes;
    }

    /// Analyzes the inclusive day range `start..=end`, with the monthly trend
    /// anchored on today's month.
    #[must_use]
    pub fn analyze(&self, records: &[Record], start: NaiveDate, end: NaiveDate) -> WorkloadAnalytics {
        self.analyze_at(records, start, end, Utc::now().date_naive())
    }

    /// Like [`analyze`](Self::analyze) with an explicit "today".
    #[must_use]
    pub fn analyze_at(
        &self,
        records: &[Record],
        start: NaiveDate,
        end: NaiveDate,
        today: NaiveDate,
    ) -> WorkloadAnalytics {
        let active: Vec<&Record> = records
            .iter()
            .filter(|r| r.status == RecordStatus::Active)
            .collect();

        let daily_workload: Vec<DailyWorkload> = start
            .iter_days()
            .take_while(|day| *day <= end)
            .map(|day| self.daily(&active, day))
            .collect();

        WorkloadAnalytics {
            weekly_stats: self.weekly_stats(&daily_workload),
            hourly_distribution: self.hourly_distribution(&active),
            monthly_trends: self.monthly_trends(&active, today),
            capacity_analysis: self.capacity(&daily_workload),
            daily_workload,
        }
    }

    /// Classifies a day by its session count against the daily maximum.
    #[must_use]
    pub fn intensity_for(&self, sessions: usize) -> Intensity {
        let scaled = sessions as u64 * 10;
        let max = u64::from(self.config.max_sessions_per_day);
        if scaled >= max * 8 {
            Intensity::Overload
        } else if scaled >= max * 6 {
            Intensity::High
        } else if scaled >= max * 3 {
            Intensity::Medium
        } else {
            Intensity::Low
        }
    }

    /// Minutes named in the description (`"45 мин"`, `"2 часа"`), else the default.
    ///
    /// Capped at [`MAX_SESSION_MINUTES`].
    #[must_use]
    pub fn session_duration(&self, record: &Record) -> u32 {
        record
            .description
            .as_deref()
            .and_then(|text| DURATION_PATTERN.captures(text))
            .and_then(|caps| {
                let value: u32 = caps[1].parse().ok()?;
                let unit = caps[2].to_lowercase();
                if unit.contains("час") || unit.contains("hour") {
                    value.checked_mul(60)
                } else {
                    Some(value)
                }
            })
            .unwrap_or(self.config.default_session_duration)
            .min(MAX_SESSION_MINUTES)
    }

    fn daily(&self, active: &[&Record], day: NaiveDate) -> DailyWorkload {
        let sessions: Vec<WorkloadSession> = active
            .iter()
            .filter(|r| r.date.date_naive() == day)
            .map(|r| WorkloadSession {
                id: r.id.clone(),
                time: r.date.format("%H:%M").to_string(),
                duration: self.session_duration(r),
                kind: r.tags.first().cloned().unwrap_or_else(|| "general".to_string()),
                participants: r.participants.len().max(1),
            })
            .collect();

        DailyWorkload {
            date: day,
            total_sessions: sessions.len(),
            duration: sessions.iter().map(|s| u64::from(s.duration)).sum(),
            intensity: self.intensity_for(sessions.len()),
            sessions,
        }
    }

    fn weekly_stats(&self, days: &[DailyWorkload]) -> WeeklyStats {
        let total_minutes: u64 = days.iter().map(|d| d.duration).sum();
        let total_hours = total_minutes as f64 / 60.0;
        let total_sessions: usize = days.iter().map(|d| d.total_sessions).sum();

        let mut peak: Option<&DailyWorkload> = None;
        let mut lightest: Option<&DailyWorkload> = None;
        for day in days {
            if peak.map_or(true, |p| day.total_sessions > p.total_sessions) {
                peak = Some(day);
            }
            if lightest.map_or(true, |l| day.total_sessions < l.total_sessions) {
                lightest = Some(day);
            }
        }

        let capacity_hours = days.len() as f64 * f64::from(self.config.working_hours());
        let average = if days.is_empty() {
            0.0
        } else {
            total_sessions as f64 / days.len() as f64
        };
        let utilization = if capacity_hours > 0.0 {
            total_hours / capacity_hours * 100.0
        } else {
            0.0
        };

        WeeklyStats {
            total_hours: round1(total_hours),
            average_sessions_per_day: round1(average),
            peak_day: peak.map(|d| d.date),
            lightest_day: lightest.map(|d| d.date),
            utilization: round1(utilization),
        }
    }

    fn hourly_distribution(&self, active: &[&Record]) -> Vec<HourlyBucket> {
        let mut counts = [0usize; 24];
        for record in active {
            counts[record.date.hour() as usize] += 1;
        }
        (self.config.working_hours_start..self.config.working_hours_end.min(24))
            .map(|hour| HourlyBucket {
                hour,
                sessions: counts[hour as usize],
                label: format!("{hour}:00"),
            })
            .collect()
    }

    /// Four consecutive 7-day buckets starting on the 1st of `today`'s month.
    fn monthly_trends(&self, active: &[&Record], today: NaiveDate) -> Vec<WeeklyTrend> {
        let month_start = today.with_day(1).unwrap_or(today);
        (0..TREND_WEEKS)
            .map(|i| {
                let start = month_start + Duration::days(7 * i);
                let end = start + Duration::days(7);
                let in_week: Vec<&&Record> = active
                    .iter()
                    .filter(|r| {
                        let day = r.date.date_naive();
                        day >= start && day < end
                    })
                    .collect();
                let minutes: u64 = in_week
                    .iter()
                    .map(|r| u64::from(self.session_duration(r)))
                    .sum();
                WeeklyTrend {
                    week: format!("Неделя {}", i + 1),
                    start,
                    hours: round1(minutes as f64 / 60.0),
                    sessions: in_week.len(),
                }
            })
            .collect()
    }

    fn capacity(&self, days: &[DailyWorkload]) -> CapacityAnalysis {
        let max_capacity = self.config.max_sessions_per_day.saturating_mul(7);
        CapacityAnalysis {
            max_capacity,
            current_load: days.iter().map(|d| d.total_sessions).sum(),
            recommended_capacity: (u64::from(max_capacity) * 3 / 4) as u32,
            overload_days: days
                .iter()
                .filter(|d| d.intensity == Intensity::Overload)
                .map(|d| d.date)
                .collect(),
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
