//! [`Command`] for resolving a [`Session`] into its [`User`].

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::{Session, User};
use crate::{
    domain::user::{self, session},
    infra::{sessions, SessionStore},
    Service,
};

use super::Command;

/// [`Command`] for resolving a [`Session`] into its [`User`].
#[derive(Clone, Debug, From)]
pub struct AuthorizeUserSession {
    /// [`session::Token`] presented by the client.
    pub token: session::Token,
}

impl<Db, Sessions> Command<AuthorizeUserSession> for Service<Db, Sessions>
where
    Sessions: for<'l> SessionStore<
        Select<By<Option<user::Id>, &'l session::Token>>,
        Ok = Option<user::Id>,
        Err = Traced<sessions::Error>,
    >,
{
    type Ok = user::Id;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AuthorizeUserSession { token } = cmd;

        self.sessions()
            .execute(Select(By::new(&token)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::SessionNotFound)
            .map_err(tracerr::wrap!())
    }
}

/// Error of [`AuthorizeUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`SessionStore`] error.
    #[display("`SessionStore` operation failed: {_0}")]
    #[from]
    Store(sessions::Error),

    /// [`Session`] is absent or expired.
    #[display("`Session` does not exist")]
    SessionNotFound,
}
