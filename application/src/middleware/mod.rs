//! Request middleware pipeline.
//!
//! Every request passes the following stages strictly in order before
//! reaching a handler:
//! 1. [`identity`] resolves the session cookie into an [`Identity`];
//! 2. [`access_log`] assigns a [`RequestId`] and logs the request;
//! 3. [`csrf`] rejects mutating requests without a valid token;
//! 4. [`cors`] answers preflight requests.
//!
//! The CORS headers are set on the way out of the [`csrf`] stage, so every
//! response carries them, short-circuited ones included.
//!
//! [`Identity`]: crate::context::Identity
//! [`RequestId`]: crate::context::RequestId

pub mod access_log;
pub mod cors;
pub mod csrf;
pub mod identity;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    Router,
};
use tower::ServiceBuilder;

pub use self::{
    cors::CorsPolicy,
    csrf::CsrfGuard,
    identity::{AuthorizationError, Authorizer, IdentityResolver},
};

/// Configured stages of the request middleware pipeline.
#[derive(Clone, Debug)]
pub struct Pipeline<A> {
    /// State of the [`identity`] stage.
    pub identity: IdentityResolver<A>,

    /// State of the [`csrf`] stage.
    pub csrf: CsrfGuard,

    /// State of the [`cors`] stage.
    pub cors: CorsPolicy,
}

impl<A: Authorizer> Pipeline<A> {
    /// Wraps every route of the provided [`Router`] into this [`Pipeline`].
    #[must_use]
    pub fn wrap(self, router: Router) -> Router {
        let Self {
            identity: resolver,
            csrf: guard,
            cors: policy,
        } = self;

        router.layer(
            ServiceBuilder::new()
                .layer(from_fn_with_state(resolver, identity::resolve::<A>))
                .layer(from_fn(access_log::record))
                .layer(from_fn_with_state(policy, cors::decorate))
                .layer(from_fn_with_state(guard, csrf::enforce))
                .layer(from_fn(cors::preflight)),
        )
    }
}
