//! Core module - OS-interaction adapters and their data model

pub mod accounts;
pub mod apps;
pub mod cleaner;
pub mod monitor;
pub mod policy;
pub mod process;
pub mod report;
pub mod sample;
pub mod session;

pub use accounts::AccountDirectory;
pub use apps::AppDirectory;
pub use monitor::ResourceMonitor;
pub use policy::PolicyStore;
pub use process::ProcessDirectory;
