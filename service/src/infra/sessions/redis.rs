//! Redis [`SessionStore`] implementation.

use std::fmt;

use common::operations::{By, Delete, Insert, Select};
use fred::prelude::{
    Builder, ClientLike as _, Expiration, KeysInterface as _, Pool,
};
use tracerr::Traced;

use crate::{
    domain::{
        user::{self, session},
        Session,
    },
    infra::{sessions, SessionStore},
};

pub use fred::{
    error::Error,
    prelude::{Config, ServerConfig},
};

/// Prefix of the keys holding [`Session`]s.
const KEY_PREFIX: &str = "session:";

/// [`SessionStore`] keeping [`Session`]s in Redis with a TTL.
#[derive(Clone)]
pub struct Redis {
    /// [`Pool`] of Redis clients.
    pool: Pool,
}

impl fmt::Debug for Redis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Redis").finish_non_exhaustive()
    }
}

impl Redis {
    /// Connects a [`Pool`] of `size` clients with the provided [`Config`].
    ///
    /// # Errors
    ///
    /// If failed to build the [`Pool`] or to connect it.
    pub async fn connect(
        conf: Config,
        size: usize,
    ) -> Result<Self, Traced<sessions::Error>> {
        let pool = Builder::from_config(conf)
            .build_pool(size)
            .map_err(tracerr::from_and_wrap!(=> sessions::Error))?;
        drop(
            pool.init()
                .await
                .map_err(tracerr::from_and_wrap!(=> sessions::Error))?,
        );
        Ok(Self { pool })
    }

    /// Returns the Redis key of the provided [`session::Token`].
    fn key(token: &session::Token) -> String {
        format!("{KEY_PREFIX}{token}")
    }
}

impl SessionStore<Insert<Session>> for Redis {
    type Ok = ();
    type Err = Traced<sessions::Error>;

    async fn execute(
        &self,
        Insert(session): Insert<Session>,
    ) -> Result<Self::Ok, Self::Err> {
        let Session {
            token,
            user_id,
            expires_at,
        } = session;

        self.pool
            .set::<(), _, _>(
                Self::key(&token),
                i64::from(user_id),
                Some(Expiration::EXAT(expires_at.unix_timestamp())),
                None,
                false,
            )
            .await
            .map_err(tracerr::from_and_wrap!(=> sessions::Error))
    }
}

impl<'l> SessionStore<Select<By<Option<user::Id>, &'l session::Token>>>
    for Redis
{
    type Ok = Option<user::Id>;
    type Err = Traced<sessions::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<user::Id>, &'l session::Token>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.pool
            .get::<Option<i64>, _>(Self::key(by.into_inner()))
            .await
            .map(|id| id.map(user::Id::from))
            .map_err(tracerr::from_and_wrap!(=> sessions::Error))
    }
}

impl<'l> SessionStore<Delete<By<Session, &'l session::Token>>> for Redis {
    type Ok = ();
    type Err = Traced<sessions::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Session, &'l session::Token>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.pool
            .del::<i64, _>(Self::key(by.into_inner()))
            .await
            .map(drop)
            .map_err(tracerr::from_and_wrap!(=> sessions::Error))
    }
}
