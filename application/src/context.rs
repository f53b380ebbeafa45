//! Request-scoped context shared between the middleware and handlers.

use axum::{async_trait, extract::FromRequestParts};
use derive_more::Display;
use service::domain::user;
use uuid::Uuid;

#[cfg(doc)]
use crate::middleware;
use crate::{define_error, Error};

/// Identity of the caller of the current request.
///
/// Established by [`middleware::identity`] for every request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Identity {
    /// ID of the authenticated [`User`], if any.
    ///
    /// [`User`]: service::domain::User
    user_id: Option<user::Id>,
}

impl Identity {
    /// [`Identity`] of a caller without a valid session.
    pub const ANONYMOUS: Self = Self { user_id: None };

    /// Raw user ID reported for an [`Identity::ANONYMOUS`] caller.
    pub const ANONYMOUS_USER_ID: i64 = -1;

    /// Creates an [`Identity`] of the authenticated [`User`].
    ///
    /// [`User`]: service::domain::User
    #[must_use]
    pub fn authenticated(user_id: user::Id) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }

    /// Returns ID of the authenticated [`User`], if any.
    ///
    /// [`User`]: service::domain::User
    #[must_use]
    pub fn user_id(&self) -> Option<user::Id> {
        self.user_id
    }

    /// Indicates whether the caller presented a valid session.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Returns the raw user ID, [`Identity::ANONYMOUS_USER_ID`] for an
    /// anonymous caller.
    #[must_use]
    pub fn raw_user_id(&self) -> i64 {
        self.user_id.map_or(Self::ANONYMOUS_USER_ID, i64::from)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .copied()
            .ok_or_else(|| Error::internal(&"missing `Identity` extension"))
    }
}

/// Unique ID of the current request.
///
/// Assigned by [`middleware::access_log`] for every request.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a fresh random [`RequestId`].
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .copied()
            .ok_or_else(|| Error::internal(&"missing `RequestId` extension"))
    }
}

/// ID of the authenticated [`User`] performing the current request.
///
/// Rejects anonymous callers.
///
/// [`User`]: service::domain::User
#[derive(Clone, Copy, Debug)]
pub struct CurrentUser(pub user::Id);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        Identity::from_request_parts(parts, state)
            .await?
            .user_id()
            .map(Self)
            .ok_or_else(|| AuthError::AuthorizationRequired.into())
    }
}

define_error! {
    enum AuthError {
        #[code = "AUTHORIZATION_REQUIRED"]
        #[status = UNAUTHORIZED]
        #[message = "Authorization required"]
        AuthorizationRequired,
    }
}

#[cfg(test)]
mod spec {
    use service::domain::user;

    use super::{Identity, RequestId};

    #[test]
    fn anonymous_has_sentinel_id() {
        assert!(!Identity::ANONYMOUS.is_authenticated());
        assert_eq!(Identity::ANONYMOUS.raw_user_id(), -1);
    }

    #[test]
    fn authenticated_exposes_user_id() {
        let identity = Identity::authenticated(user::Id::from(7));

        assert!(identity.is_authenticated());
        assert_eq!(identity.raw_user_id(), 7);
        assert_eq!(identity.user_id(), Some(user::Id::from(7)));
    }

    #[test]
    fn request_ids_are_unique() {
        assert_ne!(RequestId::generate(), RequestId::generate());
    }
}
