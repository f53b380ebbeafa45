//! HTTP API definitions.

pub mod auth;
pub mod user;

use axum::{
    routing::{get, post, put},
    Router,
};
use secrecy::SecretBox;
use service::domain::user as domain;

use crate::{define_error, AppState, Error};

pub use self::user::User;

/// Prefix of all the API routes.
pub const PREFIX: &str = "/api/v1";

/// Creates the [`Router`] of the whole API.
pub fn router() -> Router<AppState> {
    Router::new().nest(
        PREFIX,
        Router::new()
            .route("/auth/signup", post(auth::sign_up))
            .route("/auth/login", post(auth::log_in))
            .route("/auth/logout", post(auth::log_out))
            .route("/auth/csrf", get(auth::csrf_token))
            .route("/users/me", get(user::me).patch(user::update))
            .route("/users/me/password", put(user::update_password)),
    )
}

/// Parses a [`domain::Username`] provided by the client.
fn username(raw: String) -> Result<domain::Username, Error> {
    domain::Username::new(raw).ok_or_else(|| ValidationError::Username.into())
}

/// Parses a [`domain::Email`] provided by the client.
fn email(raw: &str) -> Result<domain::Email, Error> {
    domain::Email::new(raw).ok_or_else(|| ValidationError::Email.into())
}

/// Parses a [`domain::Password`] provided by the client.
fn password(raw: String) -> Result<SecretBox<domain::Password>, Error> {
    domain::Password::new(raw)
        .map(|p| SecretBox::new(Box::new(p)))
        .ok_or_else(|| ValidationError::Password.into())
}

define_error! {
    enum ValidationError {
        #[code = "INVALID_USERNAME"]
        #[status = BAD_REQUEST]
        #[message = "Username must be 3 to 32 letters, digits, `_`, `.` \
                     or `-`"]
        Username,

        #[code = "INVALID_EMAIL"]
        #[status = BAD_REQUEST]
        #[message = "Invalid email address"]
        Email,

        #[code = "INVALID_PASSWORD"]
        #[status = BAD_REQUEST]
        #[message = "Password must be 8 to 128 characters long"]
        Password,
    }
}

#[cfg(test)]
mod spec {
    #[test]
    fn validates_client_input() {
        assert!(super::username("a".to_owned()).is_err());
        assert!(super::username("dj.shadow_99".to_owned()).is_ok());
        assert!(super::email("not-an-email").is_err());
        assert_eq!(
            super::email("DJ@Example.com").unwrap().as_ref(),
            "dj@example.com",
        );
        assert!(super::password("short".to_owned()).is_err());
        assert!(super::password("long enough".to_owned()).is_ok());
    }
}
