//! [`User`]-related endpoints.

use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;
use derive_more::Debug;
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _},
    domain, query, Query as _,
};

use crate::{api, context::CurrentUser, define_error, AppState, AsError, Error};

/// Account of a listener.
#[derive(Clone, Debug, Serialize)]
pub struct User {
    /// Unique identifier of this [`User`].
    pub id: i64,

    /// Username of this [`User`].
    pub username: String,

    /// Email of this [`User`].
    pub email: String,

    /// [RFC 3339] date and time when this [`User`] was created.
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    pub created_at: String,
}

impl From<domain::User> for User {
    fn from(user: domain::User) -> Self {
        Self {
            id: user.id.into(),
            username: user.name.to_string(),
            email: user.email.to_string(),
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Request body of [`update`].
#[derive(Debug, Deserialize)]
pub struct UpdateProfile {
    /// New username, if it should change.
    pub username: Option<String>,

    /// New email, if it should change.
    pub email: Option<String>,
}

/// Request body of [`update_password`].
#[derive(Debug, Deserialize)]
pub struct UpdatePassword {
    /// Current password.
    #[debug(skip)]
    pub old_password: String,

    /// Desired password.
    #[debug(skip)]
    pub new_password: String,
}

/// Returns the [`User`] of the current session.
///
/// # Errors
///
/// If the caller is not authenticated.
pub async fn me(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<User>, Error> {
    state
        .service
        .execute(query::user::ById::by(user_id))
        .await
        .map_err(AsError::into_error)?
        .map(|u| Json(u.into()))
        .ok_or_else(|| UserError::NotExists.into())
}

/// Updates the username and email of the current [`User`].
///
/// # Errors
///
/// If the caller is not authenticated, the input is invalid or occupied.
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    WithRejection(Json(body), _): WithRejection<Json<UpdateProfile>, Error>,
) -> Result<Json<User>, Error> {
    let UpdateProfile { username, email } = body;
    let name = username.map(api::username).transpose()?;
    let email = email.as_deref().map(api::email).transpose()?;

    if name.is_none() && email.is_none() {
        return me(State(state), CurrentUser(user_id)).await;
    }

    let user = state
        .service
        .execute(command::UpdateUserProfile {
            user_id,
            name,
            email,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(user.into()))
}

/// Changes the password of the current [`User`].
///
/// # Errors
///
/// If the caller is not authenticated or the old password doesn't match.
pub async fn update_password(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    WithRejection(Json(body), _): WithRejection<Json<UpdatePassword>, Error>,
) -> Result<Json<User>, Error> {
    let UpdatePassword {
        old_password,
        new_password,
    } = body;

    let user = state
        .service
        .execute(command::UpdateUserPassword {
            user_id,
            new_password: api::password(new_password)?,
            old_password: api::password(old_password)
                .map_err(|_| PasswordError::Wrong)?,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(user.into()))
}

define_error! {
    enum UserError {
        #[code = "USER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "User does not exist"]
        NotExists,
    }
}

define_error! {
    enum PasswordError {
        #[code = "WRONG_PASSWORD"]
        #[status = FORBIDDEN]
        #[message = "Provided `old_password` does not match the current \
                     password"]
        Wrong,
    }
}

impl AsError for command::update_user_profile::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "USERNAME_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "Username is occupied by another account"]
                NameOccupied,

                #[code = "EMAIL_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "Email is occupied by another account"]
                EmailOccupied,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::UserNotExists(_) => Some(UserError::NotExists.into()),
            Self::NameOccupied(_) => Some(Error::NameOccupied.into()),
            Self::EmailOccupied(_) => Some(Error::EmailOccupied.into()),
        }
    }
}

impl AsError for command::update_user_password::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::PasswordHash(_) => None,
            Self::UserNotExists(_) => Some(UserError::NotExists.into()),
            Self::WrongPassword => Some(PasswordError::Wrong.into()),
        }
    }
}

#[cfg(test)]
mod spec {
    use common::DateTime;
    use service::{
        command::update_user_profile::ExecutionError,
        domain::{self, user},
    };

    use crate::AsError as _;

    use super::User;

    #[test]
    fn reports_occupied_profile_values_as_conflicts() {
        let email = ExecutionError::EmailOccupied(
            user::Email::new("bob@example.com").unwrap(),
        )
        .as_error();
        assert_eq!(email.status_code, http::StatusCode::CONFLICT);
        assert_eq!(email.code, "EMAIL_OCCUPIED");

        let name =
            ExecutionError::NameOccupied(user::Username::new("bob").unwrap())
                .as_error();
        assert_eq!(name.status_code, http::StatusCode::CONFLICT);
        assert_eq!(name.code, "USERNAME_OCCUPIED");

        let missing = ExecutionError::UserNotExists(3.into()).as_error();
        assert_eq!(missing.status_code, http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn renders_public_profile() {
        let user = User::from(domain::User {
            id: 3.into(),
            name: user::Username::new("nina").unwrap(),
            email: user::Email::new("nina@example.com").unwrap(),
            password_hash: user::PasswordHash::new(
                &user::Password::new("correct horse").unwrap(),
            )
            .unwrap(),
            created_at: DateTime::from_unix_timestamp(1_700_000_000)
                .unwrap()
                .coerce(),
        });

        assert_eq!(user.id, 3);
        assert_eq!(user.username, "nina");
        assert_eq!(user.email, "nina@example.com");
        assert_eq!(user.created_at, "2023-11-14T22:13:20Z");
    }
}
