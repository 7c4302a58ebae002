//! HTTP API handlers for modq-server
//!
//! Moderator identity is supplied by the caller; authentication belongs to
//! the surrounding system.

pub mod error;
pub mod health;
pub mod modifications;
pub mod records;
pub mod votes;

pub use error::ApiError;
pub use health::health_routes;
pub use modifications::{get_modification, list_modifications, submit_modification};
pub use records::{
    create_album, create_artist, create_moderator, create_track, get_album, get_artist,
    get_moderator, get_track,
};
pub use votes::{cast_votes, run_sweep};
