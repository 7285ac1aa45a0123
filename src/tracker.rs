use crate::config::Config;
use crate::error::SessionError;
use crate::models::{Database, Session};
use crate::storage::Storage;
use anyhow::Result;
use chrono::NaiveDateTime;
use tracing::info;

/// Result of sealing a session.
#[derive(Debug, Clone)]
pub struct ClockOut {
    pub session: Session,
    pub total_minutes: f64,
}

/// Drives the session state machine. Every mutation rewrites the whole store.
pub struct Tracker {
    pub storage: Storage,
    pub config: Config,
    pub db: Database,
}

impl Tracker {
    pub fn new(storage: Storage, config: Config) -> Result<Self> {
        let db = storage.load()?;
        Ok(Self {
            storage,
            config,
            db,
        })
    }

    pub fn clock_in(
        &mut self,
        task: Option<String>,
        notes: Option<String>,
        now: NaiveDateTime,
    ) -> Result<Session> {
        if let Some(open) = self.db.open_session() {
            return Err(SessionError::AlreadyOpen {
                since: open.clock_in.format("%Y-%m-%d %H:%M:%S").to_string(),
                task: open.task_label().to_string(),
            }
            .into());
        }

        let task = task
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| self.config.default_task.clone());
        let session = Session::start_at(now, task, notes);
        self.db.sessions.push(session.clone());
        self.storage.save(&self.db)?;

        info!(id = %session.id, task = session.task_label(), "clocked in");
        Ok(session)
    }

    pub fn clock_out(&mut self, notes: Option<&str>, now: NaiveDateTime) -> Result<ClockOut> {
        let session = self
            .db
            .open_session_mut()
            .ok_or(SessionError::NoOpenSession)?;
        let total_minutes = session.clock_out(now, notes)?;
        let session = session.clone();
        self.storage.save(&self.db)?;

        info!(
            id = %session.id,
            work_minutes = ?session.work_minutes,
            break_minutes = session.total_break_minutes,
            "clocked out"
        );
        Ok(ClockOut {
            session,
            total_minutes,
        })
    }

    pub fn start_break(&mut self, now: NaiveDateTime) -> Result<Session> {
        let session = self
            .db
            .open_session_mut()
            .ok_or(SessionError::NoOpenSession)?;
        session.start_break(now)?;
        let session = session.clone();
        self.storage.save(&self.db)?;

        info!(id = %session.id, "break started");
        Ok(session)
    }

    pub fn end_break(&mut self, now: NaiveDateTime) -> Result<Session> {
        let session = self
            .db
            .open_session_mut()
            .ok_or(SessionError::NoOpenSession)?;
        session.end_break(now)?;
        let session = session.clone();
        self.storage.save(&self.db)?;

        info!(
            id = %session.id,
            break_minutes = session.total_break_minutes,
            "break ended"
        );
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionStatus;
    use chrono::NaiveDate;
    use std::path::Path;
    use tempfile::tempdir;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn setup_tracker(dir: &Path) -> Tracker {
        Tracker::new(Storage::in_dir(dir), Config::default()).unwrap()
    }

    fn session_error(err: &anyhow::Error) -> Option<&SessionError> {
        err.downcast_ref::<SessionError>()
    }

    fn open_count(tracker: &Tracker) -> usize {
        tracker.db.sessions.iter().filter(|s| s.is_open()).count()
    }

    #[test]
    fn test_full_day_example() {
        let dir = tempdir().unwrap();
        let mut tracker = setup_tracker(dir.path());

        tracker.clock_in(Some("A".into()), None, at(9, 0, 0)).unwrap();
        tracker.start_break(at(10, 0, 0)).unwrap();
        tracker.end_break(at(10, 15, 0)).unwrap();
        let out = tracker.clock_out(None, at(17, 0, 0)).unwrap();

        assert_eq!(out.total_minutes, 480.0);
        assert_eq!(out.session.total_break_minutes, 15.0);
        assert_eq!(out.session.work_minutes, Some(465.0));
        assert_eq!(out.session.status, SessionStatus::Completed);
        assert_eq!(out.session.clock_out, Some(at(17, 0, 0)));
    }

    #[test]
    fn test_clock_in_twice_fails() {
        let dir = tempdir().unwrap();
        let mut tracker = setup_tracker(dir.path());

        tracker.clock_in(None, None, at(9, 0, 0)).unwrap();
        let err = tracker.clock_in(None, None, at(9, 30, 0)).unwrap_err();

        assert_eq!(
            session_error(&err),
            Some(&SessionError::AlreadyOpen {
                since: "2024-01-15 09:00:00".into(),
                task: "development".into(),
            })
        );
        assert_eq!(tracker.db.sessions.len(), 1);
    }

    #[test]
    fn test_clock_in_after_clock_out() {
        let dir = tempdir().unwrap();
        let mut tracker = setup_tracker(dir.path());

        tracker.clock_in(None, None, at(9, 0, 0)).unwrap();
        tracker.clock_out(None, at(12, 0, 0)).unwrap();
        let second = tracker.clock_in(Some("B".into()), None, at(13, 0, 0)).unwrap();

        assert_eq!(second.status, SessionStatus::Active);
        assert_eq!(tracker.db.sessions.len(), 2);
        assert_eq!(open_count(&tracker), 1);
    }

    #[test]
    fn test_default_task_applied() {
        let dir = tempdir().unwrap();
        let mut tracker = setup_tracker(dir.path());

        let session = tracker.clock_in(None, Some("n".into()), at(9, 0, 0)).unwrap();
        assert_eq!(session.task.as_deref(), Some("development"));
        assert_eq!(session.notes.as_deref(), Some("n"));
    }

    #[test]
    fn test_blank_task_uses_default() {
        let dir = tempdir().unwrap();
        let mut tracker = setup_tracker(dir.path());

        let session = tracker.clock_in(Some("".into()), None, at(9, 0, 0)).unwrap();
        assert_eq!(session.task.as_deref(), Some("development"));
        tracker.clock_out(None, at(10, 0, 0)).unwrap();

        let session = tracker.clock_in(Some("   ".into()), None, at(11, 0, 0)).unwrap();
        assert_eq!(session.task.as_deref(), Some("development"));
    }

    #[test]
    fn test_operations_without_open_session() {
        let dir = tempdir().unwrap();
        let mut tracker = setup_tracker(dir.path());

        for err in [
            tracker.clock_out(None, at(9, 0, 0)).unwrap_err(),
            tracker.start_break(at(9, 0, 0)).unwrap_err(),
            tracker.end_break(at(9, 0, 0)).unwrap_err(),
        ] {
            assert_eq!(session_error(&err), Some(&SessionError::NoOpenSession));
        }
        assert!(!dir.path().join(crate::storage::SESSIONS_FILE).exists());
    }

    #[test]
    fn test_break_state_conflicts() {
        let dir = tempdir().unwrap();
        let mut tracker = setup_tracker(dir.path());
        tracker.clock_in(None, None, at(9, 0, 0)).unwrap();

        let err = tracker.end_break(at(9, 30, 0)).unwrap_err();
        assert_eq!(session_error(&err), Some(&SessionError::NotOnBreak));

        tracker.start_break(at(10, 0, 0)).unwrap();
        let err = tracker.start_break(at(10, 5, 0)).unwrap_err();
        assert_eq!(session_error(&err), Some(&SessionError::AlreadyOnBreak));

        let session = tracker.end_break(at(10, 20, 0)).unwrap();
        assert_eq!(session.status, SessionStatus::Active);
        assert_eq!(session.total_break_minutes, 20.0);

        let err = tracker.end_break(at(10, 30, 0)).unwrap_err();
        assert_eq!(session_error(&err), Some(&SessionError::NotOnBreak));
    }

    #[test]
    fn test_clock_out_on_break_closes_break() {
        let dir = tempdir().unwrap();
        let mut tracker = setup_tracker(dir.path());

        tracker.clock_in(None, None, at(9, 0, 0)).unwrap();
        tracker.start_break(at(12, 0, 0)).unwrap();
        let out = tracker.clock_out(Some("wrap up"), at(12, 45, 0)).unwrap();

        let session = &out.session;
        assert!(session.breaks.iter().all(|b| !b.is_open()));
        assert_eq!(session.total_break_minutes, 45.0);
        let expected = out.total_minutes - session.total_break_minutes;
        assert!((session.work_minutes.unwrap() - expected).abs() < 0.01);
        assert_eq!(session.notes.as_deref(), Some("[Clock-out] wrap up"));
    }

    #[test]
    fn test_mutations_persisted() {
        let dir = tempdir().unwrap();
        {
            let mut tracker = setup_tracker(dir.path());
            tracker.clock_in(Some("A".into()), None, at(9, 0, 0)).unwrap();
            tracker.start_break(at(10, 0, 0)).unwrap();
        }

        let mut reloaded = setup_tracker(dir.path());
        let open = reloaded.db.open_session().unwrap();
        assert_eq!(open.status, SessionStatus::OnBreak);
        assert!(open.current_break().is_some());

        reloaded.end_break(at(10, 30, 0)).unwrap();
        let again = setup_tracker(dir.path());
        assert_eq!(again.db.sessions[0].total_break_minutes, 30.0);
    }

    #[test]
    fn test_at_most_one_open_session() {
        let dir = tempdir().unwrap();
        let mut tracker = setup_tracker(dir.path());
        let mut now = at(8, 0, 0);

        for step in 0..40 {
            now = now + chrono::Duration::minutes(7);
            let _ = match step % 5 {
                0 => tracker.clock_in(None, None, now).map(|_| ()),
                1 => tracker.start_break(now).map(|_| ()),
                2 => tracker.end_break(now).map(|_| ()),
                3 => tracker.start_break(now).map(|_| ()),
                _ => tracker.clock_out(None, now).map(|_| ()),
            };
            assert!(open_count(&tracker) <= 1);
            for session in &tracker.db.sessions {
                assert!(session.breaks.iter().filter(|b| b.is_open()).count() <= 1);
                if let Some(work) = session.work_minutes {
                    assert!(work >= 0.0);
                }
            }
        }
    }
}
