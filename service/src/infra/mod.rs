//! Infrastructure layer.

pub mod database;
pub mod sessions;

pub use self::{database::Database, sessions::SessionStore};
#[cfg(feature = "postgres")]
pub use self::database::{postgres, Postgres};
#[cfg(feature = "redis")]
pub use self::sessions::{redis, Redis};
