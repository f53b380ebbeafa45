//! Authentication endpoints.

use axum::{extract::State, Json};
use axum_extra::extract::{cookie::CookieJar, WithRejection};
use derive_more::Debug;
use http::{HeaderValue, StatusCode};
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _},
    domain::user::{self as domain, session},
};

use crate::{
    api::{self, User},
    context::{AuthError, CurrentUser},
    define_error,
    middleware::csrf,
    AppState, AsError, Error,
};

/// Request body of [`sign_up`].
#[derive(Debug, Deserialize)]
pub struct SignUp {
    /// Username of the new account.
    pub username: String,

    /// Email of the new account.
    pub email: String,

    /// Password of the new account.
    #[debug(skip)]
    pub password: String,
}

/// Request body of [`log_in`].
#[derive(Debug, Deserialize)]
pub struct LogIn {
    /// Username of the account.
    pub username: String,

    /// Password of the account.
    #[debug(skip)]
    pub password: String,
}

/// Response body of [`csrf_token`].
#[derive(Debug, Serialize)]
pub struct CsrfToken {
    /// Token to send back in the `X-CSRF-Token` header.
    pub csrf_token: String,

    /// Unix timestamp the token expires at.
    pub expires_at: i64,
}

/// Registers a new account and logs into it.
///
/// # Errors
///
/// If the input is invalid, or the username or email is occupied.
pub async fn sign_up(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(body), _): WithRejection<Json<SignUp>, Error>,
) -> Result<(StatusCode, CookieJar, Json<User>), Error> {
    let SignUp {
        username,
        email,
        password,
    } = body;

    let user = state
        .service
        .execute(command::CreateUser {
            name: api::username(username)?,
            email: api::email(&email)?,
            password: api::password(password)?,
        })
        .await
        .map_err(AsError::into_error)?;
    let session = state
        .service
        .execute(command::CreateUserSession::ByUserId(user.id))
        .await
        .map_err(AsError::into_error)?;

    Ok((
        StatusCode::CREATED,
        jar.add(state.cookie.issue(&session.token, session.expires_at)),
        Json(user.into()),
    ))
}

/// Logs into an existing account.
///
/// # Errors
///
/// If the credentials don't match any account.
pub async fn log_in(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(body), _): WithRejection<Json<LogIn>, Error>,
) -> Result<(CookieJar, Json<User>), Error> {
    let LogIn { username, password } = body;

    // Malformed credentials are as wrong as unknown ones.
    let (Some(name), Some(password)) =
        (domain::Username::new(username), api::password(password).ok())
    else {
        return Err(CredentialsError::Wrong.into());
    };

    let session = state
        .service
        .execute(command::CreateUserSession::ByCredentials { name, password })
        .await
        .map_err(AsError::into_error)?;

    Ok((
        jar.add(state.cookie.issue(&session.token, session.expires_at)),
        Json(session.user.into()),
    ))
}

/// Deletes the current session and clears its cookie.
///
/// # Errors
///
/// If the session store is unavailable.
pub async fn log_out(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), Error> {
    if let Some(token) = state.cookie.read(&jar).and_then(session::Token::new)
    {
        state
            .service
            .execute(command::DeleteUserSession { token })
            .await
            .map_err(AsError::into_error)?;
    }

    Ok((jar.add(state.cookie.clear()), StatusCode::OK))
}

/// Issues a CSRF token bound to the current session.
///
/// # Errors
///
/// If the caller is not authenticated.
pub async fn csrf_token(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    jar: CookieJar,
) -> Result<([(http::HeaderName, HeaderValue); 1], Json<CsrfToken>), Error> {
    let session = state
        .cookie
        .read(&jar)
        .and_then(session::Token::new)
        .ok_or(AuthError::AuthorizationRequired)?;

    let command::issue_csrf_token::Output { token, expires_at } = state
        .service
        .execute(command::IssueCsrfToken { session })
        .await
        .map_err(AsError::into_error)?;
    let header =
        HeaderValue::try_from(token.as_ref()).map_err(|e| Error::internal(&e))?;

    Ok((
        [(csrf::HEADER, header)],
        Json(CsrfToken {
            csrf_token: token.into(),
            expires_at,
        }),
    ))
}

define_error! {
    enum CredentialsError {
        #[code = "WRONG_CREDENTIALS"]
        #[status = UNAUTHORIZED]
        #[message = "Wrong username or password"]
        Wrong,
    }
}

impl AsError for command::create_user::ExecutionError {
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
            Self::PasswordHash(_) => None,
            Self::NameOccupied(_) => Some(Error::NameOccupied.into()),
            Self::EmailOccupied(_) => Some(Error::EmailOccupied.into()),
        }
    }
}

impl AsError for command::create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Store(e) => e.try_as_error(),
            Self::UserNotExists(_) => None,
            Self::WrongCredentials => Some(CredentialsError::Wrong.into()),
        }
    }
}

impl AsError for command::delete_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Store(e) => e.try_as_error(),
        }
    }
}
