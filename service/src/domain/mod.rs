//! Domain definitions.

pub mod csrf;
pub mod user;

pub use self::user::{Session, User};
