//! [`Command`] definition.

pub mod authorize_user_session;
pub mod create_user;
pub mod create_user_session;
pub mod delete_user_session;
pub mod issue_csrf_token;
pub mod update_user_email;
pub mod update_user_name;
pub mod update_user_password;
pub mod update_user_profile;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    authorize_user_session::AuthorizeUserSession, create_user::CreateUser,
    create_user_session::CreateUserSession,
    delete_user_session::DeleteUserSession, issue_csrf_token::IssueCsrfToken,
    update_user_email::UpdateUserEmail, update_user_name::UpdateUserName,
    update_user_password::UpdateUserPassword,
    update_user_profile::UpdateUserProfile,
};

#[cfg(test)]
mod spec {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use common::operations::{By, Insert, Select, Update};
    use secrecy::SecretBox;
    use tracerr::Traced;

    use crate::{
        domain::{csrf, user, User},
        infra::{database, sessions::memory::Memory, Database},
        Config, Service,
    };

    use super::{
        authorize_user_session, create_user, create_user_session,
        update_user_email, update_user_name, update_user_password,
        update_user_profile, AuthorizeUserSession, Command as _, CreateUser,
        CreateUserSession, DeleteUserSession, IssueCsrfToken, UpdateUserEmail,
        UpdateUserName, UpdateUserPassword, UpdateUserProfile,
    };

    /// [`Database`] of [`User`]s held in memory.
    #[derive(Clone, Debug, Default)]
    struct Users(Arc<Mutex<Vec<User>>>);

    impl Database<Select<By<Option<User>, user::Id>>> for Users {
        type Ok = Option<User>;
        type Err = Traced<database::Error>;

        async fn execute(
            &self,
            Select(by): Select<By<Option<User>, user::Id>>,
        ) -> Result<Self::Ok, Self::Err> {
            let id = by.into_inner();
            Ok(self.0.lock().unwrap().iter().find(|u| u.id == id).cloned())
        }
    }

    impl<'l> Database<Select<By<Option<User>, &'l user::Username>>> for Users {
        type Ok = Option<User>;
        type Err = Traced<database::Error>;

        async fn execute(
            &self,
            Select(by): Select<By<Option<User>, &'l user::Username>>,
        ) -> Result<Self::Ok, Self::Err> {
            let name = by.into_inner();
            Ok(self
                .0
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.name == *name)
                .cloned())
        }
    }

    impl<'l> Database<Select<By<Option<User>, &'l user::Email>>> for Users {
        type Ok = Option<User>;
        type Err = Traced<database::Error>;

        async fn execute(
            &self,
            Select(by): Select<By<Option<User>, &'l user::Email>>,
        ) -> Result<Self::Ok, Self::Err> {
            let email = by.into_inner();
            Ok(self
                .0
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.email == *email)
                .cloned())
        }
    }

    impl Database<Insert<user::New>> for Users {
        type Ok = User;
        type Err = Traced<database::Error>;

        async fn execute(
            &self,
            Insert(new): Insert<user::New>,
        ) -> Result<Self::Ok, Self::Err> {
            let mut users = self.0.lock().unwrap();
            let id = i64::try_from(users.len()).unwrap() + 1;
            let user = new.with_id(id.into());
            users.push(user.clone());
            Ok(user)
        }
    }

    impl Database<Update<User>> for Users {
        type Ok = ();
        type Err = Traced<database::Error>;

        async fn execute(
            &self,
            Update(user): Update<User>,
        ) -> Result<Self::Ok, Self::Err> {
            let mut users = self.0.lock().unwrap();
            let stored = users.iter_mut().find(|u| u.id == user.id).unwrap();
            *stored = user;
            Ok(())
        }
    }

    fn service() -> Service<Users, Memory> {
        Service::new(
            Config {
                session_ttl: Duration::from_secs(60),
                csrf: csrf::Codec::new("test-secret"),
                csrf_ttl: Duration::from_secs(60),
            },
            Users::default(),
            Memory::new(),
        )
    }

    fn name(s: &str) -> user::Username {
        user::Username::new(s).unwrap()
    }

    fn password(s: &str) -> SecretBox<user::Password> {
        SecretBox::new(Box::new(user::Password::new(s).unwrap()))
    }

    async fn sign_up(svc: &Service<Users, Memory>, login: &str) -> User {
        svc.execute(CreateUser {
            name: name(login),
            email: user::Email::new(format!("{login}@example.com")).unwrap(),
            password: password("correct horse"),
        })
        .await
        .unwrap()
    }

    async fn log_in(
        svc: &Service<Users, Memory>,
        login: &str,
        pass: &str,
    ) -> Result<create_user_session::Output, create_user_session::ExecutionError>
    {
        svc.execute(CreateUserSession::ByCredentials {
            name: name(login),
            password: password(pass),
        })
        .await
        .map_err(Traced::into_inner)
    }

    #[tokio::test]
    async fn logs_in_and_out() {
        let svc = service();
        let user = sign_up(&svc, "alice").await;

        let out = log_in(&svc, "alice", "correct horse").await.unwrap();
        assert_eq!(out.user.id, user.id);
        assert!(!out.expires_at.is_past());

        let id = svc
            .execute(AuthorizeUserSession {
                token: out.token.clone(),
            })
            .await
            .unwrap();
        assert_eq!(id, user.id);

        svc.execute(DeleteUserSession {
            token: out.token.clone(),
        })
        .await
        .unwrap();
        let err = svc
            .execute(AuthorizeUserSession { token: out.token })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            authorize_user_session::ExecutionError::SessionNotFound,
        ));
    }

    #[tokio::test]
    async fn creates_session_by_user_id() {
        let svc = service();
        let user = sign_up(&svc, "alice").await;

        let out = svc
            .execute(CreateUserSession::ByUserId(user.id))
            .await
            .unwrap();
        assert_eq!(out.user.name, user.name);

        let err = svc
            .execute(CreateUserSession::ByUserId(42.into()))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            create_user_session::ExecutionError::UserNotExists(_),
        ));
    }

    #[tokio::test]
    async fn rejects_wrong_credentials() {
        let svc = service();
        drop(sign_up(&svc, "alice").await);

        for (login, pass) in
            [("alice", "wrong horse"), ("bob", "correct horse")]
        {
            let err = log_in(&svc, login, pass).await.unwrap_err();
            assert!(
                matches!(
                    err,
                    create_user_session::ExecutionError::WrongCredentials,
                ),
                "{login}:{pass}",
            );
        }
    }

    #[tokio::test]
    async fn rejects_occupied_name_and_email() {
        let svc = service();
        drop(sign_up(&svc, "alice").await);

        let err = svc
            .execute(CreateUser {
                name: name("alice"),
                email: user::Email::new("other@example.com").unwrap(),
                password: password("correct horse"),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            create_user::ExecutionError::NameOccupied(_),
        ));

        let err = svc
            .execute(CreateUser {
                name: name("bob"),
                email: user::Email::new("ALICE@example.com").unwrap(),
                password: password("correct horse"),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            create_user::ExecutionError::EmailOccupied(_),
        ));
    }

    #[tokio::test]
    async fn updates_password() {
        let svc = service();
        let user = sign_up(&svc, "alice").await;

        let err = svc
            .execute(UpdateUserPassword {
                user_id: user.id,
                new_password: password("battery staple"),
                old_password: password("wrong horse"),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            update_user_password::ExecutionError::WrongPassword,
        ));

        drop(
            svc.execute(UpdateUserPassword {
                user_id: user.id,
                new_password: password("battery staple"),
                old_password: password("correct horse"),
            })
            .await
            .unwrap(),
        );

        assert!(log_in(&svc, "alice", "battery staple").await.is_ok());
        assert!(log_in(&svc, "alice", "correct horse").await.is_err());
    }

    #[tokio::test]
    async fn updates_name_unless_occupied() {
        let svc = service();
        let alice = sign_up(&svc, "alice").await;
        drop(sign_up(&svc, "bob").await);

        let err = svc
            .execute(UpdateUserName {
                user_id: alice.id,
                name: name("bob"),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            update_user_name::ExecutionError::NameOccupied(_),
        ));

        let updated = svc
            .execute(UpdateUserName {
                user_id: alice.id,
                name: name("carol"),
            })
            .await
            .unwrap();
        assert_eq!(updated.name, name("carol"));
        assert!(log_in(&svc, "carol", "correct horse").await.is_ok());
    }

    fn email(s: &str) -> user::Email {
        user::Email::new(s).unwrap()
    }

    async fn stored(svc: &Service<Users, Memory>, id: user::Id) -> User {
        svc.database()
            .execute(Select(By::<Option<User>, _>::new(id)))
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn updates_email_unless_occupied() {
        let svc = service();
        let alice = sign_up(&svc, "alice").await;
        drop(sign_up(&svc, "bob").await);

        let err = svc
            .execute(UpdateUserEmail {
                user_id: alice.id,
                email: email("Bob@Example.com"),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            update_user_email::ExecutionError::EmailOccupied(_),
        ));
        assert_eq!(stored(&svc, alice.id).await.email, alice.email);

        let updated = svc
            .execute(UpdateUserEmail {
                user_id: alice.id,
                email: email("alice@music.example"),
            })
            .await
            .unwrap();
        assert_eq!(updated.email, email("alice@music.example"));
        assert_eq!(
            stored(&svc, alice.id).await.email,
            email("alice@music.example"),
        );

        let err = svc
            .execute(UpdateUserEmail {
                user_id: 42.into(),
                email: email("nobody@example.com"),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            update_user_email::ExecutionError::UserNotExists(_),
        ));
    }

    #[tokio::test]
    async fn updates_profile_in_one_write() {
        let svc = service();
        let alice = sign_up(&svc, "alice").await;

        let updated = svc
            .execute(UpdateUserProfile {
                user_id: alice.id,
                name: Some(name("carol")),
                email: Some(email("carol@example.com")),
            })
            .await
            .unwrap();

        assert_eq!(updated.name, name("carol"));
        assert_eq!(updated.email, email("carol@example.com"));
        let stored = stored(&svc, alice.id).await;
        assert_eq!(stored.name, name("carol"));
        assert_eq!(stored.email, email("carol@example.com"));
    }

    #[tokio::test]
    async fn keeps_name_when_email_is_occupied() {
        let svc = service();
        let alice = sign_up(&svc, "alice").await;
        drop(sign_up(&svc, "bob").await);

        let err = svc
            .execute(UpdateUserProfile {
                user_id: alice.id,
                name: Some(name("carol")),
                email: Some(email("bob@example.com")),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            update_user_profile::ExecutionError::EmailOccupied(_),
        ));
        let stored = stored(&svc, alice.id).await;
        assert_eq!(stored.name, name("alice"));
        assert_eq!(stored.email, email("alice@example.com"));
        assert!(log_in(&svc, "carol", "correct horse").await.is_err());
    }

    #[tokio::test]
    async fn keeps_email_when_name_is_occupied() {
        let svc = service();
        let alice = sign_up(&svc, "alice").await;
        drop(sign_up(&svc, "bob").await);

        let err = svc
            .execute(UpdateUserProfile {
                user_id: alice.id,
                name: Some(name("bob")),
                email: Some(email("carol@example.com")),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            update_user_profile::ExecutionError::NameOccupied(_),
        ));
        assert_eq!(
            stored(&svc, alice.id).await.email,
            email("alice@example.com"),
        );
    }

    #[tokio::test]
    async fn skips_write_of_unchanged_profile() {
        let svc = service();
        let alice = sign_up(&svc, "alice").await;

        let same = svc
            .execute(UpdateUserProfile {
                user_id: alice.id,
                name: Some(name("alice")),
                email: None,
            })
            .await
            .unwrap();
        assert_eq!(same.name, alice.name);

        let err = svc
            .execute(UpdateUserProfile {
                user_id: 42.into(),
                name: Some(name("carol")),
                email: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            update_user_profile::ExecutionError::UserNotExists(_),
        ));
    }

    #[tokio::test]
    async fn issues_csrf_token_bound_to_session() {
        let svc = service();
        drop(sign_up(&svc, "alice").await);
        let session = log_in(&svc, "alice", "correct horse").await.unwrap();

        let out = svc
            .execute(IssueCsrfToken {
                session: session.token.clone(),
            })
            .await
            .unwrap();

        let codec = &svc.config().csrf;
        assert_eq!(
            codec.verify(session.token.as_ref(), out.token.as_ref()),
            Ok(true),
        );
        assert_eq!(
            codec.verify("another-cookie", out.token.as_ref()),
            Ok(false),
        );
    }
}
