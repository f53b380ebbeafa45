//! [`Command`] for issuing a [`csrf::Token`].

use std::convert::Infallible;

use common::DateTime;

#[cfg(doc)]
use crate::domain::Session;
use crate::{
    domain::{csrf, user::session},
    Service,
};

use super::Command;

/// [`Command`] for issuing a [`csrf::Token`] bound to a [`Session`].
#[derive(Clone, Debug)]
pub struct IssueCsrfToken {
    /// [`session::Token`] the [`csrf::Token`] is bound to.
    pub session: session::Token,
}

/// Output of [`IssueCsrfToken`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Issued [`csrf::Token`].
    pub token: csrf::Token,

    /// Unix timestamp the [`csrf::Token`] expires at.
    pub expires_at: i64,
}

impl<Db, Sessions> Command<IssueCsrfToken> for Service<Db, Sessions> {
    type Ok = Output;
    type Err = Infallible;

    async fn execute(
        &self,
        cmd: IssueCsrfToken,
    ) -> Result<Self::Ok, Self::Err> {
        let IssueCsrfToken { session } = cmd;

        let expires_at =
            (DateTime::now() + self.config().csrf_ttl).unix_timestamp();
        Ok(Output {
            token: self.config().csrf.create(session.as_ref(), expires_at),
            expires_at,
        })
    }
}
