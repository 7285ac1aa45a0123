use crate::models::Database;
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::ValueEnum;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

pub const CSV_HEADER: [&str; 8] = [
    "ID",
    "Clock In",
    "Clock Out",
    "Task",
    "Status",
    "Work Minutes",
    "Break Minutes",
    "Notes",
];

/// Writes a snapshot of every session to `export_<timestamp>.<ext>` in `dir`.
pub fn export(db: &Database, format: ExportFormat, dir: &Path, now: NaiveDateTime) -> Result<PathBuf> {
    let path = dir.join(format!(
        "export_{}.{}",
        now.format("%Y%m%d_%H%M%S"),
        format.extension()
    ));

    match format {
        ExportFormat::Csv => write_csv(db, &path)?,
        ExportFormat::Json => write_json(db, &path)?,
    }

    info!(path = %path.display(), sessions = db.sessions.len(), "exported sessions");
    Ok(path)
}

fn write_json(db: &Database, path: &Path) -> Result<()> {
    let data = serde_json::to_string_pretty(db)?;
    fs::write(path, data).with_context(|| format!("Could not write {}", path.display()))?;
    Ok(())
}

fn write_csv(db: &Database, path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Could not create {}", path.display()))?;

    wtr.write_record(CSV_HEADER)?;
    for session in &db.sessions {
        wtr.write_record([
            session.id.clone(),
            session.clock_in.format("%Y-%m-%dT%H:%M:%S").to_string(),
            session
                .clock_out
                .map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string())
                .unwrap_or_default(),
            session.task.clone().unwrap_or_default(),
            session.status.to_string(),
            session
                .work_minutes
                .map(|m| format!("{:?}", m))
                .unwrap_or_default(),
            format!("{:?}", session.total_break_minutes),
            session.notes.clone().unwrap_or_default(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
