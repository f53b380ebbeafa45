//! [`Command`] for deleting a [`Session`].

use common::operations::{By, Delete};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{user::session, Session},
    infra::{sessions, SessionStore},
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`Session`].
///
/// Deleting an absent [`Session`] succeeds.
#[derive(Clone, Debug, From)]
pub struct DeleteUserSession {
    /// [`session::Token`] of the [`Session`] to delete.
    pub token: session::Token,
}

impl<Db, Sessions> Command<DeleteUserSession> for Service<Db, Sessions>
where
    Sessions: for<'l> SessionStore<
        Delete<By<Session, &'l session::Token>>,
        Ok = (),
        Err = Traced<sessions::Error>,
    >,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        let DeleteUserSession { token } = cmd;

        self.sessions()
            .execute(Delete(By::new(&token)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> ExecutionError))
    }
}

/// Error of [`DeleteUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`SessionStore`] error.
    #[display("`SessionStore` operation failed: {_0}")]
    Store(sessions::Error),
}
