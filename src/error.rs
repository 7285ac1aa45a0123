use thiserror::Error;

/// Conflicts between the requested command and the current session state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error(
        "already clocked in since {since} (task: {task}). Use 'clock-out' first or 'status' to check the current session"
    )]
    AlreadyOpen { since: String, task: String },

    #[error("not currently clocked in. Use 'clock-in' to start a session")]
    NoOpenSession,

    #[error("already on break. Use 'break end' to resume work")]
    AlreadyOnBreak,

    #[error("not currently on break. Use 'break start' to take one")]
    NotOnBreak,
}
