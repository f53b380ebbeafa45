//! [`Database`]-related implementations.

#[cfg(feature = "postgres")]
pub mod postgres;

use derive_more::{Display, Error as StdError, From};

#[cfg(feature = "postgres")]
pub use self::postgres::Postgres;

/// Database operation.
pub use common::Handler as Database;

/// Names of the uniqueness constraints enforced by a [`Database`].
pub mod constraint {
    /// Uniqueness of [`User`] names.
    ///
    /// [`User`]: crate::domain::User
    pub const USER_NAME: &str = "users_name_unique";

    /// Uniqueness of [`User`] emails.
    ///
    /// [`User`]: crate::domain::User
    pub const USER_EMAIL: &str = "users_email_unique";
}

/// [`Database`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    #[cfg(feature = "postgres")]
    /// [`Postgres`] error.
    Postgres(postgres::Error),
}

impl Error {
    /// Checks if this [`Error`] is a violation of the provided uniqueness
    /// [`constraint`].
    #[must_use]
    pub fn is_unique_violation(&self, constraint: &str) -> bool {
        match *self {
            #[cfg(feature = "postgres")]
            Self::Postgres(ref e) => e.is_unique_violation(Some(constraint)),
        }
    }
}
