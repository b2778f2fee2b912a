//! Session control - lock, log off, shut down, restart

use thiserror::Error;

use crate::platform;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("requires administrator privileges")]
    NotElevated,
    #[error("session command failed: {0}")]
    CommandFailed(String),
}

/// Whether the current process runs with administrator privileges. Always
/// false off Windows.
pub fn is_admin() -> bool {
    platform::is_admin()
}

/// Current interactive username, with environment fallbacks.
pub fn current_user() -> String {
    platform::current_user()
}

/// Lock the interactive session. Best-effort.
pub fn lock_screen() -> bool {
    platform::lock_workstation()
}

/// Log the current user off. Best-effort.
pub fn log_off() -> bool {
    platform::log_off()
}

/// Immediate shutdown. Requires elevation, checked up front.
pub fn shutdown_now() -> Result<(), SessionError> {
    if !platform::is_admin() {
        return Err(SessionError::NotElevated);
    }
    platform::shutdown(false).map_err(|e| SessionError::CommandFailed(e.to_string()))
}

/// Immediate restart. Requires elevation, checked up front.
pub fn restart_now() -> Result<(), SessionError> {
    if !platform::is_admin() {
        return Err(SessionError::NotElevated);
    }
    platform::shutdown(true).map_err(|e| SessionError::CommandFailed(e.to_string()))
}
