pub mod connection;
pub mod json;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, connect_with_settings, DbPool};
