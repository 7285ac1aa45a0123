use crate::models::{Database, Session, SessionStatus};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPeriod {
    Week,
    Month,
    All,
}

/// Start of the reporting window: Monday 00:00 for a week, the first of the
/// month for a month, no bound for all time.
pub fn period_cutoff(period: ReportPeriod, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let today = now.date();
    let start = match period {
        ReportPeriod::Week => {
            today - Duration::days(today.weekday().num_days_from_monday() as i64)
        }
        ReportPeriod::Month => today.with_day(1)?,
        ReportPeriod::All => return None,
    };
    start.and_hms_opt(0, 0, 0)
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub date: NaiveDate,
    pub task: String,
    pub clock_in: NaiveDateTime,
    pub clock_out: Option<NaiveDateTime>,
    pub work_minutes: f64,
    pub completed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct LogSummary {
    pub entries: Vec<LogEntry>,
    pub daily_totals: BTreeMap<NaiveDate, f64>,
    pub total_minutes: f64,
}

/// Sessions clocked in within the trailing `days` window, grouped per date.
/// A window reaching past the representable calendar takes every session.
pub fn calculate_log(db: &Database, days: i64, now: NaiveDateTime) -> LogSummary {
    let cutoff = Duration::try_days(days).and_then(|d| now.checked_sub_signed(d));
    let in_window = |s: &&Session| cutoff.map_or(true, |cutoff| s.clock_in >= cutoff);
    let mut summary = LogSummary::default();

    for session in db.sessions.iter().filter(in_window) {
        let date = session.clock_in.date();
        let work_minutes = session.live_work_minutes(now);

        *summary.daily_totals.entry(date).or_default() += work_minutes;
        summary.total_minutes += work_minutes;
        summary.entries.push(LogEntry {
            date,
            task: session.task_label().to_string(),
            clock_in: session.clock_in,
            clock_out: session.clock_out,
            work_minutes,
            completed: session.status == SessionStatus::Completed,
        });
    }

    summary
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskTotal {
    pub task: String,
    pub minutes: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone)]
pub struct ReportStats {
    pub start: Option<NaiveDateTime>,
    pub session_count: usize,
    pub total_work: f64,
    pub total_breaks: f64,
    pub daily_work: BTreeMap<NaiveDate, f64>,
    /// Sorted by descending minutes.
    pub tasks: Vec<TaskTotal>,
}

impl ReportStats {
    pub fn days_worked(&self) -> usize {
        self.daily_work.len()
    }

    pub fn average_per_day(&self) -> Option<f64> {
        if self.daily_work.is_empty() {
            None
        } else {
            Some(self.total_work / self.daily_work.len() as f64)
        }
    }
}

pub fn calculate_report(db: &Database, period: ReportPeriod, now: NaiveDateTime) -> ReportStats {
    let start = period_cutoff(period, now);
    let in_period = |s: &&Session| start.map_or(true, |cutoff| s.clock_in >= cutoff);

    let mut session_count = 0;
    let mut total_work = 0.0;
    let mut total_breaks = 0.0;
    let mut daily_work: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    let mut by_task: BTreeMap<String, f64> = BTreeMap::new();

    for session in db.sessions.iter().filter(in_period) {
        let work = session.live_work_minutes(now);
        session_count += 1;
        total_work += work;
        total_breaks += session.live_break_minutes(now);
        *daily_work.entry(session.clock_in.date()).or_default() += work;
        *by_task.entry(session.task_label().to_string()).or_default() += work;
    }

    let mut tasks: Vec<TaskTotal> = by_task
        .into_iter()
        .map(|(task, minutes)| TaskTotal {
            task,
            minutes,
            percentage: if total_work > 0.0 {
                minutes / total_work * 100.0
            } else {
                0.0
            },
        })
        .collect();
    tasks.sort_by(|a, b| b.minutes.partial_cmp(&a.minutes).unwrap_or(Ordering::Equal));

    ReportStats {
        start,
        session_count,
        total_work,
        total_breaks,
        daily_work,
        tasks,
    }
}
