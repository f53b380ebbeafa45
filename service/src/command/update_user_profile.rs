//! [`Command`] for updating a [`user::Username`] and a [`user::Email`] at
//! once.

use common::operations::{By, Select, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{Email, Username};
use crate::{
    domain::{user, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for updating the [`Username`] and the [`Email`] of a [`User`]
/// in a single write.
///
/// Nothing is written unless every provided value is free.
#[derive(Clone, Debug)]
pub struct UpdateUserProfile {
    /// ID of the [`User`] to be updated.
    pub user_id: user::Id,

    /// New [`Username`] of the [`User`], if it should change.
    pub name: Option<user::Username>,

    /// New [`Email`] of the [`User`], if it should change.
    pub email: Option<user::Email>,
}

impl<Db, Sessions> Command<UpdateUserProfile> for Service<Db, Sessions>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + for<'l> Database<
            Select<By<Option<User>, &'l user::Username>>,
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
        cmd: UpdateUserProfile,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateUserProfile {
            user_id,
            name,
            email,
        } = cmd;

        let mut user = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(user_id))
            .map_err(tracerr::wrap!())?;

        let name = name.filter(|n| *n != user.name);
        let email = email.filter(|e| *e != user.email);
        if name.is_none() && email.is_none() {
            return Ok(user);
        }

        if let Some(name) = name {
            let occupied = self
                .database()
                .execute(Select(By::new(&name)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if occupied.is_some() {
                return Err(tracerr::new!(E::NameOccupied(name)));
            }
            user.name = name;
        }
        if let Some(email) = email {
            let occupied = self
                .database()
                .execute(Select(By::new(&email)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if occupied.is_some() {
                return Err(tracerr::new!(E::EmailOccupied(email)));
            }
            user.email = email;
        }

        self.database()
            .execute(Update(user.clone()))
            .await
            .map_err(|e| {
                let err = e.as_ref();
                if err.is_unique_violation(database::constraint::USER_NAME) {
                    tracerr::new!(E::NameOccupied(user.name.clone()))
                } else if err
                    .is_unique_violation(database::constraint::USER_EMAIL)
                {
                    tracerr::new!(E::EmailOccupied(user.email.clone()))
                } else {
                    tracerr::map_from_and_wrap!(=> E)(e)
                }
            })?;

        Ok(user)
    }
}

/// Error of [`UpdateUserProfile`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`User`] doesn't exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),

    /// [`Username`] is occupied by another [`User`].
    #[display("`Username` `{_0}` is occupied already")]
    NameOccupied(#[error(not(source))] user::Username),

    /// [`Email`] is occupied by another [`User`].
    #[display("`Email` `{_0}` is occupied already")]
    EmailOccupied(#[error(not(source))] user::Email),
}
