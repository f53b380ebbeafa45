//! In-process [`SessionStore`] implementation.

use std::{collections::HashMap, sync::Arc};

use common::operations::{By, Delete, Insert, Select};
use tokio::sync::RwLock;
use tracerr::Traced;

use crate::{
    domain::{
        user::{self, session},
        Session,
    },
    infra::{sessions, SessionStore},
};

/// [`SessionStore`] keeping [`Session`]s in the process memory.
///
/// Clones share the same storage. Expired [`Session`]s are evicted when
/// looked up.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// Stored [`Session`]s by their [`session::Token`]s.
    sessions: Arc<RwLock<HashMap<session::Token, Entry>>>,
}

/// Value stored for a [`session::Token`].
#[derive(Clone, Copy, Debug)]
struct Entry {
    /// ID of the [`user::User`] owning the [`Session`].
    user_id: user::Id,

    /// [`session::ExpirationDateTime`] of the [`Session`].
    expires_at: session::ExpirationDateTime,
}

impl Memory {
    /// Creates a new empty [`Memory`] store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of [`Session`]s held, expired ones included.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Indicates whether no [`Session`]s are held.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl SessionStore<Insert<Session>> for Memory {
    type Ok = ();
    type Err = Traced<sessions::Error>;

    async fn execute(
        &self,
        Insert(session): Insert<Session>,
    ) -> Result<Self::Ok, Self::Err> {
        let Session {
            token,
            user_id,
            expires_at,
        } = session;
        drop(
            self.sessions
                .write()
                .await
                .insert(token, Entry { user_id, expires_at }),
        );
        Ok(())
    }
}

impl<'l> SessionStore<Select<By<Option<user::Id>, &'l session::Token>>>
    for Memory
{
    type Ok = Option<user::Id>;
    type Err = Traced<sessions::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<user::Id>, &'l session::Token>>,
    ) -> Result<Self::Ok, Self::Err> {
        let token = by.into_inner();

        let entry = self.sessions.read().await.get(token).copied();
        match entry {
            Some(e) if e.expires_at.is_past() => {
                let mut sessions = self.sessions.write().await;
                // Could be replaced while the lock was released.
                if sessions.get(token).is_some_and(|e| e.expires_at.is_past())
                {
                    drop(sessions.remove(token));
                }
                Ok(None)
            }
            Some(e) => Ok(Some(e.user_id)),
            None => Ok(None),
        }
    }
}

impl<'l> SessionStore<Delete<By<Session, &'l session::Token>>> for Memory {
    type Ok = ();
    type Err = Traced<sessions::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Session, &'l session::Token>>,
    ) -> Result<Self::Ok, Self::Err> {
        drop(self.sessions.write().await.remove(by.into_inner()));
        Ok(())
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{
        operations::{By, Delete, Insert, Select},
        DateTime,
    };

    use crate::{
        domain::{
            user::{self, session},
            Session,
        },
        infra::SessionStore as _,
    };

    use super::Memory;

    fn session(token: &str, user_id: i64, ttl: Duration) -> Session {
        Session {
            token: session::Token::new(token).unwrap(),
            user_id: user_id.into(),
            expires_at: (DateTime::now() + ttl).coerce(),
        }
    }

    async fn resolve(store: &Memory, token: &str) -> Option<user::Id> {
        let token = session::Token::new(token).unwrap();
        store
            .execute(Select(By::<Option<user::Id>, _>::new(&token)))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn resolves_created_until_deleted() {
        let store = Memory::new();
        let day = Duration::from_secs(24 * 60 * 60);
        store.execute(Insert(session("t1", 7, day))).await.unwrap();

        assert_eq!(resolve(&store, "t1").await, Some(7.into()));
        assert_eq!(resolve(&store, "t2").await, None);

        let token = session::Token::new("t1").unwrap();
        store
            .execute(Delete(By::<Session, _>::new(&token)))
            .await
            .unwrap();

        assert_eq!(resolve(&store, "t1").await, None);
    }

    #[tokio::test]
    async fn deletes_absent_idempotently() {
        let store = Memory::new();
        let token = session::Token::new("absent").unwrap();

        store
            .execute(Delete(By::<Session, _>::new(&token)))
            .await
            .unwrap();
        store
            .execute(Delete(By::<Session, _>::new(&token)))
            .await
            .unwrap();

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn overwrites_existing_token() {
        let store = Memory::new();
        let hour = Duration::from_secs(60 * 60);
        store.execute(Insert(session("t1", 7, hour))).await.unwrap();
        store.execute(Insert(session("t1", 8, hour))).await.unwrap();

        assert_eq!(resolve(&store, "t1").await, Some(8.into()));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn treats_expired_as_absent() {
        let store = Memory::new();
        let expired = Session {
            expires_at: (DateTime::now() - Duration::from_secs(1)).coerce(),
            ..session("t1", 7, Duration::ZERO)
        };
        store.execute(Insert(expired)).await.unwrap();

        assert_eq!(resolve(&store, "t1").await, None);
        assert!(store.is_empty().await);
    }
}
