pub mod connection;
pub mod indexes;
pub mod keys;
pub mod models;

pub use connection::connect;
pub use keys::{CourseKey, KeyError, UsageKey};
