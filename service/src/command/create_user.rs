//! [`Command`] for creating a new [`User`].

use argon2::password_hash;
use common::{
    operations::{By, Insert, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret as _, SecretBox};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{Email, Password, Username};
use crate::{
    domain::{user, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`User`].
#[derive(Debug)]
pub struct CreateUser {
    /// [`Username`] of a new [`User`].
    pub name: user::Username,

    /// [`Email`] of a new [`User`].
    pub email: user::Email,

    /// [`Password`] of a new [`User`].
    pub password: SecretBox<user::Password>,
}

impl<Db, Sessions> Command<CreateUser> for Service<Db, Sessions>
where
    Db: for<'l> Database<
            Select<By<Option<User>, &'l user::Username>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + for<'l> Database<
            Select<By<Option<User>, &'l user::Email>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Insert<user::New>, Ok = User, Err = Traced<database::Error>>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateUser {
            name,
            email,
            password,
        } = cmd;

        let occupied = self
            .database()
            .execute(Select(By::new(&name)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if occupied.is_some() {
            return Err(tracerr::new!(E::NameOccupied(name)));
        }

        let occupied = self
            .database()
            .execute(Select(By::new(&email)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if occupied.is_some() {
            return Err(tracerr::new!(E::EmailOccupied(email)));
        }

        let password_hash = user::PasswordHash::new(password.expose_secret())
            .map_err(tracerr::from_and_wrap!(=> E))?;

        // Concurrent sign-ups may still race past the checks above, so the
        // `Database` constraints have the final word.
        self.database()
            .execute(Insert(user::New {
                name: name.clone(),
                email: email.clone(),
                password_hash,
                created_at: DateTime::now().coerce(),
            }))
            .await
            .map_err(|e| {
                if e.as_ref().is_unique_violation(database::constraint::USER_NAME)
                {
                    tracerr::new!(E::NameOccupied(name))
                } else if e
                    .as_ref()
                    .is_unique_violation(database::constraint::USER_EMAIL)
                {
                    tracerr::new!(E::EmailOccupied(email))
                } else {
                    tracerr::map_from_and_wrap!(=> E)(e)
                }
            })
    }
}

/// Error of [`CreateUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Hashing of the [`Password`] failed.
    #[display("Failed to hash `Password`: {_0}")]
    #[from]
    PasswordHash(password_hash::Error),

    /// [`Username`] is occupied already.
    #[display("`Username` `{_0}` is occupied already")]
    NameOccupied(#[error(not(source))] user::Username),

    /// [`Email`] is occupied already.
    #[display("`Email` `{_0}` is occupied already")]
    EmailOccupied(#[error(not(source))] user::Email),
}
