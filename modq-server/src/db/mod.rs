//! Database access layer for modq-server

pub mod store;

pub use modq_common::db::{init_database, open_in_memory};
