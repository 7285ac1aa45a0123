use crate::config::Config;
use crate::models::{Database, Session, SessionStatus};
use crate::stats::{calculate_log, calculate_report, ReportPeriod};
use crate::tracker::ClockOut;
use crate::utils::{format_duration, minutes_between, percentage_of, progress_bar};
use anyhow::Result;
use chrono::NaiveDateTime;
use std::io::Write;

const NARROW: usize = 50;
const WIDE: usize = 60;

fn rule(out: &mut impl Write, ch: char, width: usize) -> Result<()> {
    writeln!(out, "{}", ch.to_string().repeat(width))?;
    Ok(())
}

fn banner(out: &mut impl Write, title: &str, width: usize) -> Result<()> {
    rule(out, '=', width)?;
    writeln!(out, "  {}", title)?;
    rule(out, '=', width)
}

/// Renders command receipts and read-only views as plain text.
pub struct Reporter {
    config: Config,
}

impl Reporter {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn clock_in(&self, out: &mut impl Write, session: &Session) -> Result<()> {
        banner(out, &format!("CLOCKED IN - {}", self.config.project_name), NARROW)?;
        writeln!(out, "  Time:  {}", session.clock_in.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(out, "  Task:  {}", session.task_label())?;
        if let Some(notes) = &session.notes {
            writeln!(out, "  Notes: {}", notes)?;
        }
        rule(out, '=', NARROW)
    }

    pub fn clock_out(&self, out: &mut impl Write, result: &ClockOut) -> Result<()> {
        let session = &result.session;
        banner(out, &format!("CLOCKED OUT - {}", self.config.project_name), NARROW)?;
        writeln!(out, "  Clock In:    {}", session.clock_in.format("%H:%M:%S"))?;
        if let Some(clock_out) = session.clock_out {
            writeln!(out, "  Clock Out:   {}", clock_out.format("%H:%M:%S"))?;
        }
        writeln!(out, "  Total Time:  {}", format_duration(result.total_minutes))?;
        writeln!(out, "  Break Time:  {}", format_duration(session.total_break_minutes))?;
        writeln!(
            out,
            "  Work Time:   {}",
            format_duration(session.work_minutes.unwrap_or(0.0))
        )?;
        writeln!(out, "  Task:        {}", session.task_label())?;
        rule(out, '=', NARROW)
    }

    pub fn break_started(&self, out: &mut impl Write, session: &Session) -> Result<()> {
        banner(out, "BREAK STARTED", NARROW)?;
        if let Some(current) = session.current_break() {
            writeln!(out, "  Time: {}", current.start.format("%H:%M:%S"))?;
        }
        writeln!(out, "  Use 'break end' to resume work.")?;
        rule(out, '=', NARROW)
    }

    pub fn break_ended(&self, out: &mut impl Write, session: &Session) -> Result<()> {
        let last = session
            .breaks
            .last()
            .and_then(|b| b.duration_minutes)
            .unwrap_or(0.0);
        banner(out, "BREAK ENDED", NARROW)?;
        writeln!(out, "  Break Duration: {}", format_duration(last))?;
        writeln!(out, "  Total Breaks:   {}", format_duration(session.total_break_minutes))?;
        rule(out, '=', NARROW)
    }

    pub fn status(&self, out: &mut impl Write, db: &Database, now: NaiveDateTime) -> Result<()> {
        banner(out, &format!("STATUS - {}", self.config.project_name), NARROW)?;

        match db.open_session() {
            None => {
                writeln!(out, "  Status: NOT CLOCKED IN")?;
                writeln!(out)?;
                if let Some(last) = db.last_completed() {
                    writeln!(out, "  Last Session:")?;
                    writeln!(out, "    Date: {}", last.clock_in.format("%Y-%m-%d"))?;
                    writeln!(
                        out,
                        "    Work: {}",
                        format_duration(last.work_minutes.unwrap_or(0.0))
                    )?;
                }
            }
            Some(open) => {
                let marker = if open.status == SessionStatus::OnBreak {
                    "🔴"
                } else {
                    "🟢"
                };
                writeln!(
                    out,
                    "  Status: {} {}",
                    marker,
                    open.status.as_str().to_uppercase()
                )?;
                writeln!(out)?;
                writeln!(out, "  Clock In:     {}", open.clock_in.format("%H:%M:%S"))?;
                writeln!(out, "  Task:         {}", open.task_label())?;
                writeln!(out, "  Elapsed:      {}", format_duration(open.elapsed_minutes(now)))?;
                writeln!(
                    out,
                    "  Break Time:   {}",
                    format_duration(open.live_break_minutes(now))
                )?;
                writeln!(
                    out,
                    "  Work Time:    {}",
                    format_duration(open.live_work_minutes(now))
                )?;
                if let Some(current) = open.current_break() {
                    writeln!(
                        out,
                        "  Current Break: {}",
                        format_duration(minutes_between(current.start, now))
                    )?;
                }
            }
        }

        rule(out, '=', NARROW)
    }

    pub fn log(&self, out: &mut impl Write, db: &Database, days: i64, now: NaiveDateTime) -> Result<()> {
        let summary = calculate_log(db, days, now);

        banner(out, &format!("SESSION LOG - Last {} days", days), WIDE)?;

        for entry in &summary.entries {
            let marker = if entry.completed { "✓" } else { "⏳" };
            writeln!(out)?;
            writeln!(out, "  {} {}", marker, entry.date.format("%Y-%m-%d"))?;
            writeln!(out, "    Task: {}", entry.task)?;
            write!(out, "    In:   {}", entry.clock_in.format("%H:%M"))?;
            if let Some(clock_out) = entry.clock_out {
                write!(out, "  Out: {}", clock_out.format("%H:%M"))?;
            }
            writeln!(out, "  Work: {}", format_duration(entry.work_minutes))?;
        }

        writeln!(out)?;
        rule(out, '-', WIDE)?;
        writeln!(out, "  Daily Totals:")?;
        let target = self.config.target_minutes();
        for (date, minutes) in &summary.daily_totals {
            let percentage = percentage_of(*minutes, target);
            writeln!(
                out,
                "    {}: [{}] {} ({:.0}%)",
                date.format("%Y-%m-%d"),
                progress_bar(percentage),
                format_duration(*minutes),
                percentage
            )?;
        }
        rule(out, '-', WIDE)?;
        writeln!(out, "  Total: {}", format_duration(summary.total_minutes))?;
        rule(out, '=', WIDE)
    }

    pub fn report(
        &self,
        out: &mut impl Write,
        db: &Database,
        period: ReportPeriod,
        now: NaiveDateTime,
    ) -> Result<()> {
        let stats = calculate_report(db, period, now);

        let title = match (period, stats.start) {
            (ReportPeriod::Week, Some(start)) => format!(
                "Weekly Report ({} to {})",
                start.format("%Y-%m-%d"),
                now.format("%Y-%m-%d")
            ),
            (ReportPeriod::Month, _) => format!("Monthly Report ({})", now.format("%B %Y")),
            _ => "All Time Report".to_string(),
        };
        banner(out, &title, WIDE)?;

        writeln!(out)?;
        writeln!(out, "  Summary:")?;
        writeln!(out, "    Sessions:     {}", stats.session_count)?;
        writeln!(out, "    Total Work:   {}", format_duration(stats.total_work))?;
        writeln!(out, "    Total Breaks: {}", format_duration(stats.total_breaks))?;
        writeln!(out, "    Days Worked:  {}", stats.days_worked())?;
        if let Some(avg) = stats.average_per_day() {
            writeln!(out, "    Avg per Day:  {}", format_duration(avg))?;
        }

        writeln!(out)?;
        writeln!(out, "  By Task:")?;
        for task in &stats.tasks {
            writeln!(
                out,
                "    {}: {} ({:.1}%)",
                task.task,
                format_duration(task.minutes),
                task.percentage
            )?;
        }

        rule(out, '=', WIDE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn dt(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn sample_db() -> Database {
        let mut session = Session::start_at(dt(16, 9, 0), "A".into(), None);
        session.start_break(dt(16, 10, 0)).unwrap();
        session.end_break(dt(16, 10, 15)).unwrap();
        session.clock_out(dt(16, 17, 0), None).unwrap();
        Database {
            sessions: vec![session],
        }
    }

    #[test]
    fn test_status_not_clocked_in() {
        let reporter = Reporter::new(Config::default());
        let text = render(|out| reporter.status(out, &sample_db(), dt(17, 9, 0)));

        assert!(text.contains("STATUS - DeepSafe"));
        assert!(text.contains("NOT CLOCKED IN"));
        assert!(text.contains("Date: 2024-01-16"));
        assert!(text.contains("Work: 7h 45m"));
    }

    #[test]
    fn test_status_on_break() {
        let reporter = Reporter::new(Config::default());
        let mut db = sample_db();
        let mut open = Session::start_at(dt(17, 9, 0), "B".into(), None);
        open.start_break(dt(17, 10, 0)).unwrap();
        db.sessions.push(open);

        let text = render(|out| reporter.status(out, &db, dt(17, 10, 20)));
        assert!(text.contains("ON_BREAK"));
        assert!(text.contains("Elapsed:      1h 20m"));
        assert!(text.contains("Work Time:    1h 0m"));
        assert!(text.contains("Current Break: 20m"));
    }

    #[test]
    fn test_log_with_no_sessions() {
        let reporter = Reporter::new(Config::default());
        let text = render(|out| reporter.log(out, &Database::default(), 1, dt(17, 9, 0)));

        assert!(text.contains("SESSION LOG - Last 1 days"));
        assert!(text.contains("Total: 0m"));
        assert!(!text.contains("Task:"));
    }

    #[test]
    fn test_log_bar_capped() {
        let reporter = Reporter::new(Config::default());
        let mut session = Session::start_at(dt(16, 6, 0), "long".into(), None);
        session.clock_out(dt(16, 6, 0) + Duration::hours(12), None).unwrap();
        let db = Database {
            sessions: vec![session],
        };

        let text = render(|out| reporter.log(out, &db, 7, dt(17, 9, 0)));
        assert!(text.contains(&format!("2024-01-16: [{}] 12h 0m (150%)", "█".repeat(20))));
    }

    #[test]
    fn test_report_sections() {
        let reporter = Reporter::new(Config::default());
        let text = render(|out| reporter.report(out, &sample_db(), ReportPeriod::Week, dt(17, 9, 0)));

        assert!(text.contains("Weekly Report (2024-01-15 to 2024-01-17)"));
        assert!(text.contains("Sessions:     1"));
        assert!(text.contains("Total Breaks: 15m"));
        assert!(text.contains("A: 7h 45m (100.0%)"));
    }

    #[test]
    fn test_report_empty_has_no_average() {
        let reporter = Reporter::new(Config::default());
        let text = render(|out| {
            reporter.report(out, &Database::default(), ReportPeriod::All, dt(17, 9, 0))
        });

        assert!(text.contains("All Time Report"));
        assert!(text.contains("Sessions:     0"));
        assert!(!text.contains("Avg per Day"));
    }
}
