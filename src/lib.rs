//! winadmin - Administration adapters for Windows desktops
//!
//! The OS-facing building blocks of a desktop administration tool: periodic
//! resource sampling, local policy toggles, process control, installed
//! application management, local account management and session actions.
//! The graphical layer that drives these adapters lives in the embedding
//! application; every adapter here is a synchronous call that converts OS
//! failures into typed results instead of letting them escape.

pub mod core;
pub mod platform;

pub use crate::core::accounts::{AccountDirectory, AccountError, UserIdentity};
pub use crate::core::apps::{AppDirectory, InstalledApp};
pub use crate::core::cleaner::{clear_temp, CleanupReport};
pub use crate::core::monitor::{CounterSource, ResourceMonitor};
pub use crate::core::policy::{PolicyDescriptor, PolicyScope, PolicyState, PolicyStore};
pub use crate::core::process::{KillError, ProcessDirectory, ProcessEntry};
pub use crate::core::report::SystemReport;
pub use crate::core::sample::{ResourceHistory, ResourceSample};
pub use crate::core::session::SessionError;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Library name constant
pub const LIB_NAME: &str = "winadmin";

/// Initialize the logging system for an embedding application.
///
/// Respects `RUST_LOG` when set; harmless to call more than once.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{LIB_NAME}=info")));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
