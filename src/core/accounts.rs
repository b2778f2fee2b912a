//! Local account adapter - account command invocation and output parsing
//!
//! Listing scrapes the tabular output of the OS account command, which makes
//! it best-effort by nature: the format is assumed stable and
//! unlocalized-enough to parse.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::platform;

/// Accounts never surfaced by `list()`.
const BUILTIN_ACCOUNTS: &[&str] = &["guest", "defaultaccount", "wdagutilityaccount"];

/// Tokens of the command's completion message that leak into naive column
/// parsing on some locales.
const COMPLETION_TOKENS: &[&str] = &["the", "command", "completed", "successfully."];

/// A local account and its security identifier, resolved on demand and not
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub username: String,
    pub security_id: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    #[error("requires administrator privileges")]
    NotElevated,
    #[error("{0}")]
    InvalidInput(&'static str),
    #[error("account command failed: {0}")]
    CommandFailed(String),
}

/// Runs the OS account-management command. Split out so the fragile text
/// parsing can be exercised against canned output, and so a structured
/// system API could replace the scraping without touching callers.
pub trait AccountCommand {
    /// Raw text of the account listing, `None` if the command failed.
    fn listing(&self) -> Option<String>;
    /// Run a mutation (add, delete, password change) with the given
    /// arguments; `Err` carries the command's failure text.
    fn run(&self, args: &[String]) -> Result<(), String>;
}

/// List/create/delete/change-password over local OS accounts.
pub struct AccountDirectory {
    command: Box<dyn AccountCommand>,
    elevated: bool,
}

impl AccountDirectory {
    pub fn new() -> Self {
        Self::with_parts(platform::account_command(), platform::is_admin())
    }

    /// Directory over a caller-provided command backend and elevation state.
    pub fn with_parts(command: Box<dyn AccountCommand>, elevated: bool) -> Self {
        Self { command, elevated }
    }

    /// Local account names, minus built-in accounts, machine accounts
    /// (trailing `$`) and completion-message artifacts. Empty when the
    /// listing command fails.
    pub fn list(&self) -> Vec<String> {
        match self.command.listing() {
            Some(output) => parse_account_listing(&output),
            None => Vec::new(),
        }
    }

    /// Create a local account. Requires elevation, checked up front.
    pub fn create(&self, username: &str, password: &str) -> Result<(), AccountError> {
        self.ensure_elevated()?;
        self.run(vec![
            "user".into(),
            username.into(),
            password.into(),
            "/add".into(),
        ])?;
        info!("local account '{}' created", username);
        Ok(())
    }

    /// Delete a local account. Requires elevation, checked up front.
    pub fn delete(&self, username: &str) -> Result<(), AccountError> {
        self.ensure_elevated()?;
        self.run(vec!["user".into(), username.into(), "/delete".into()])?;
        info!("local account '{}' deleted", username);
        Ok(())
    }

    /// Change a local account's password. Requires elevation; both arguments
    /// are validated non-empty before the command runs.
    pub fn change_password(&self, username: &str, new_password: &str) -> Result<(), AccountError> {
        self.ensure_elevated()?;
        if username.trim().is_empty() || new_password.trim().is_empty() {
            return Err(AccountError::InvalidInput(
                "username and new password are required",
            ));
        }
        self.run(vec!["user".into(), username.into(), new_password.into()])?;
        info!("password updated for '{}'", username);
        Ok(())
    }

    /// Resolve a username to its security identifier via the local account
    /// directory.
    pub fn identity(&self, username: &str) -> Option<UserIdentity> {
        platform::lookup_security_id(username).map(|security_id| UserIdentity {
            username: username.to_string(),
            security_id,
        })
    }

    fn ensure_elevated(&self) -> Result<(), AccountError> {
        if self.elevated {
            Ok(())
        } else {
            Err(AccountError::NotElevated)
        }
    }

    fn run(&self, args: Vec<String>) -> Result<(), AccountError> {
        self.command.run(&args).map_err(|message| {
            warn!("account command failed: {}", message);
            AccountError::CommandFailed(message)
        })
    }
}

impl Default for AccountDirectory {
    fn default() -> Self {
        Self::new()
    }
}

/// Pull usernames out of the tabular listing: names appear in free-form
/// columns between the dashed separator and the first blank line.
pub fn parse_account_listing(output: &str) -> Vec<String> {
    let mut users = Vec::new();
    let mut in_list = false;
    for line in output.lines() {
        if line.contains("------") {
            in_list = true;
            continue;
        }
        if !in_list {
            continue;
        }
        if line.trim().is_empty() {
            break;
        }
        for token in line.split_whitespace() {
            if is_account_name(token) {
                users.push(token.to_string());
            }
        }
    }
    users
}

fn is_account_name(token: &str) -> bool {
    if token.ends_with('$') {
        return false;
    }
    let lower = token.to_lowercase();
    !BUILTIN_ACCOUNTS.contains(&lower.as_str()) && !COMPLETION_TOKENS.contains(&lower.as_str())
}
