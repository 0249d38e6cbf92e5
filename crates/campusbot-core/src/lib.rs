//! Shared types, configuration, and storage for the campusbot client.

pub mod backend;
pub mod config;
pub mod error;
pub mod session;
pub mod store;
pub mod types;

pub use backend::ChatBackend;
pub use config::CampusConfig;
pub use error::{CampusError, Result};
pub use session::SessionContext;
pub use store::LocalStore;
pub use types::*;
