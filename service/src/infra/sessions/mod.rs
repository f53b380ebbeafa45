//! [`SessionStore`]-related implementations.
//!
//! A [`SessionStore`] maps a [`session::Token`] to the [`user::Id`] it was
//! issued for, until the [`Session`] is deleted or expires. Implementations
//! provide the following operations:
//! - [`Insert`]`<`[`Session`]`>`, overwriting an existing [`session::Token`];
//! - [`Select`]`<`[`By`]`<`[`Option`]`<`[`user::Id`]`>, &`[`session::Token`]`>>`,
//!   returning [`None`] for absent or expired [`Session`]s;
//! - [`Delete`]`<`[`By`]`<`[`Session`]`, &`[`session::Token`]`>>`, succeeding
//!   for absent [`Session`]s too.
//!
//! Every operation touches a single key, so callers need no extra locking.
//!
//! [`By`]: common::operations::By
//! [`Delete`]: common::operations::Delete
//! [`Insert`]: common::operations::Insert
//! [`Select`]: common::operations::Select
//! [`Session`]: crate::domain::Session
//! [`session::Token`]: crate::domain::user::session::Token
//! [`user::Id`]: crate::domain::user::Id

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

use derive_more::{Display, Error as StdError, From};

pub use self::memory::Memory;
#[cfg(feature = "redis")]
pub use self::redis::Redis;

/// Session store operation.
pub use common::Handler as SessionStore;

/// [`SessionStore`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    #[cfg(feature = "redis")]
    /// [`Redis`] error.
    Redis(redis::Error),
}
