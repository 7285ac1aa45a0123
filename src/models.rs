use crate::error::SessionError;
use crate::utils::{minutes_between, round2};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub const UNCATEGORIZED: &str = "uncategorized";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    OnBreak,
    Completed,
}

impl SessionStatus {
    pub fn is_open(self) -> bool {
        matches!(self, Self::Active | Self::OnBreak)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::OnBreak => "on_break",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Break {
    pub start: NaiveDateTime,
    #[serde(default)]
    pub end: Option<NaiveDateTime>,
    #[serde(default)]
    pub duration_minutes: Option<f64>,
}

impl Break {
    pub fn open_at(start: NaiveDateTime) -> Self {
        Self {
            start,
            end: None,
            duration_minutes: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Session {
    pub id: String,
    pub clock_in: NaiveDateTime,
    #[serde(default)]
    pub clock_out: Option<NaiveDateTime>,
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub status: SessionStatus,
    #[serde(default)]
    pub breaks: Vec<Break>,
    #[serde(default)]
    pub total_break_minutes: f64,
    #[serde(default)]
    pub work_minutes: Option<f64>,
}

impl Session {
    /// Opens a new session. The id carries the clock-in time to the second.
    pub fn start_at(clock_in: NaiveDateTime, task: String, notes: Option<String>) -> Self {
        Self {
            id: clock_in.format("%Y%m%d_%H%M%S").to_string(),
            clock_in,
            clock_out: None,
            task: Some(task),
            notes,
            status: SessionStatus::Active,
            breaks: Vec::new(),
            total_break_minutes: 0.0,
            work_minutes: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    pub fn task_label(&self) -> &str {
        self.task.as_deref().unwrap_or(UNCATEGORIZED)
    }

    pub fn current_break(&self) -> Option<&Break> {
        self.breaks.last().filter(|b| b.is_open())
    }

    pub fn start_break(&mut self, now: NaiveDateTime) -> Result<(), SessionError> {
        match self.status {
            SessionStatus::Completed => Err(SessionError::NoOpenSession),
            SessionStatus::OnBreak => Err(SessionError::AlreadyOnBreak),
            SessionStatus::Active => {
                self.breaks.push(Break::open_at(now));
                self.status = SessionStatus::OnBreak;
                Ok(())
            }
        }
    }

    pub fn end_break(&mut self, now: NaiveDateTime) -> Result<(), SessionError> {
        match self.status {
            SessionStatus::Completed => Err(SessionError::NoOpenSession),
            SessionStatus::Active => Err(SessionError::NotOnBreak),
            SessionStatus::OnBreak => {
                self.close_last_break(now);
                self.status = SessionStatus::Active;
                Ok(())
            }
        }
    }

    /// Seals the session, closing a running break first.
    /// Returns the total elapsed minutes between clock-in and clock-out.
    pub fn clock_out(
        &mut self,
        now: NaiveDateTime,
        notes: Option<&str>,
    ) -> Result<f64, SessionError> {
        if !self.is_open() {
            return Err(SessionError::NoOpenSession);
        }
        if self.status == SessionStatus::OnBreak {
            self.close_last_break(now);
        }

        let total_minutes = minutes_between(self.clock_in, now);
        self.clock_out = Some(now);
        self.status = SessionStatus::Completed;
        self.work_minutes = Some(round2(total_minutes - self.total_break_minutes));

        if let Some(notes) = notes.map(str::trim).filter(|n| !n.is_empty()) {
            let existing = self.notes.as_deref().unwrap_or("");
            let combined = format!("{}\n[Clock-out] {}", existing, notes);
            self.notes = Some(combined.trim().to_string());
        }

        Ok(total_minutes)
    }

    // Each break is rounded when it closes; the total is the sum of the rounded values.
    fn close_last_break(&mut self, now: NaiveDateTime) {
        if let Some(last) = self.breaks.last_mut().filter(|b| b.is_open()) {
            last.end = Some(now);
            last.duration_minutes = Some(round2(minutes_between(last.start, now)));
            self.total_break_minutes = self
                .breaks
                .iter()
                .filter_map(|b| b.duration_minutes)
                .sum();
        }
    }

    pub fn elapsed_minutes(&self, now: NaiveDateTime) -> f64 {
        minutes_between(self.clock_in, self.clock_out.unwrap_or(now))
    }

    /// Closed breaks plus the running one, if any.
    pub fn live_break_minutes(&self, now: NaiveDateTime) -> f64 {
        let running = self
            .current_break()
            .filter(|_| self.is_open())
            .map(|b| minutes_between(b.start, now))
            .unwrap_or(0.0);
        self.total_break_minutes + running
    }

    /// Stored work minutes for sealed sessions, computed against `now` otherwise.
    /// Unlike the stored clock-out figure, an open session also subtracts its running break.
    pub fn live_work_minutes(&self, now: NaiveDateTime) -> f64 {
        if self.is_open() {
            self.elapsed_minutes(now) - self.live_break_minutes(now)
        } else {
            self.work_minutes.unwrap_or(0.0)
        }
    }
}

/// The full record list, persisted as a bare JSON array.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(transparent)]
pub struct Database {
    pub sessions: Vec<Session>,
}

impl Database {
    pub fn open_session(&self) -> Option<&Session> {
        self.sessions.iter().rev().find(|s| s.is_open())
    }

    pub fn open_session_mut(&mut self) -> Option<&mut Session> {
        self.sessions.iter_mut().rev().find(|s| s.is_open())
    }

    pub fn last_completed(&self) -> Option<&Session> {
        self.sessions
            .iter()
            .rev()
            .find(|s| s.status == SessionStatus::Completed)
    }
}
