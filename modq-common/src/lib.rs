//! # modq Common Library
//!
//! Shared code for the moderation queue:
//! - Database initialization, schema and migrations
//! - Modification, vote and moderator record types
//! - Configuration loading
//! - Time helpers

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use config::{EngineConfig, ServerConfig};
pub use error::{Error, Result};
