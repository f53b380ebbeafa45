//! [`Command`] for updating a [`user::Email`].

use common::operations::{By, Select, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::Email;
use crate::{
    domain::{user, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for updating a [`user::Email`].
#[derive(Clone, Debug)]
pub struct UpdateUserEmail {
    /// ID of the [`User`] whose [`Email`] should be updated.
    pub user_id: user::Id,

    /// New [`Email`] of the [`User`].
    pub email: user::Email,
}

impl<Db, Sessions> Command<UpdateUserEmail> for Service<Db, Sessions>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + for<'l> Database<
            Select<By<Option<User>, &'l user::Email>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Update<User>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateUserEmail,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateUserEmail { user_id, email } = cmd;

        let mut user = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(user_id))
            .map_err(tracerr::wrap!())?;
        if user.email == email {
            return Ok(user);
        }

        let occupied = self
            .database()
            .execute(Select(By::new(&email)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if occupied.is_some() {
            return Err(tracerr::new!(E::EmailOccupied(email)));
        }

        user.email = email;
        self.database()
            .execute(Update(user.clone()))
            .await
            .map_err(|e| {
                if e.as_ref().is_unique_violation(database::constraint::USER_EMAIL)
                {
                    tracerr::new!(E::EmailOccupied(user.email.clone()))
                } else {
                    tracerr::map_from_and_wrap!(=> E)(e)
                }
            })?;

        Ok(user)
    }
}

/// Error of [`UpdateUserEmail`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`User`] doesn't exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),

    /// [`Email`] is occupied by another [`User`].
    #[display("`Email` `{_0}` is occupied already")]
    EmailOccupied(#[error(not(source))] user::Email),
}
