//! Postgres [`Database`] implementation.

mod impls;

use deadpool_postgres::{Object, Pool, Runtime};
use derive_more::{Display, Error as StdError, From};
use tokio_postgres::{error::SqlState, NoTls};
use tracerr::Traced;

use crate::infra::database;
#[cfg(doc)]
use crate::infra::Database;

pub use refinery::embed_migrations;

pub use deadpool_postgres::Config;

/// Postgres [`Database`] client backed by a connection [`Pool`].
#[derive(Clone, Debug)]
pub struct Postgres {
    /// [`Pool`] of connections to draw a client from for every operation.
    pool: Pool,
}

impl Postgres {
    /// Creates a new [`Postgres`] client with the provided [`Config`].
    ///
    /// # Errors
    ///
    /// If failed to create a new [`Postgres`] client.
    pub fn new(conf: &Config) -> Result<Self, Traced<database::Error>> {
        let pool = conf
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)?;
        Ok(Self { pool })
    }

    /// Takes a pooled connection.
    ///
    /// # Errors
    ///
    /// If the [`Pool`] fails to provide a connection.
    async fn client(&self) -> Result<Object, Traced<database::Error>> {
        self.pool
            .get()
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)
    }
}

/// Postgres database [`Error`].
#[derive(Debug, Display, StdError, From)]
pub enum Error {
    /// Error of a Postgres connection.
    #[display("Connection error: {_0}")]
    Connection(tokio_postgres::Error),

    /// Error of creating a new [`Pool`].
    #[display("Failed to create a new `Pool`: {_0}")]
    PoolCreationError(deadpool_postgres::CreatePoolError),

    /// [`Pool`] error.
    #[display("`Pool` error: {_0}")]
    PoolError(deadpool_postgres::PoolError),
}

impl Error {
    /// Checks if the error is a unique violation of the specified constraint.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            Self::Connection(e) => {
                e.code() == Some(&SqlState::UNIQUE_VIOLATION)
                    && constraint.map_or(true, |c| {
                        e.as_db_error().and_then(|e| e.constraint()) == Some(c)
                    })
            }
            Self::PoolError(..) | Self::PoolCreationError(..) => false,
        }
    }
}
