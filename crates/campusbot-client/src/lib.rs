//! HTTP client for the campusbot server: chat backend, sign-in, and the
//! admin console.

pub mod admin;
pub mod api;
pub mod auth;

pub use admin::AdminConsole;
pub use api::ApiClient;
pub use auth::Authenticator;
