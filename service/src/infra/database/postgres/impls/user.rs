//! [`User`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{user, User},
    infra::{
        database::{self, postgres, Postgres},
        Database,
    },
};

/// Columns selected to build a [`User`].
const COLUMNS: &str = "id, name, email, password_hash, created_at";

/// Builds a [`User`] from a [`Row`] containing all the [`COLUMNS`].
fn from_row(row: &Row) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
    }
}

impl Database<Select<By<Option<User>, user::Id>>> for Postgres {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM users \
             WHERE id = $1::INT8",
        );
        Ok(self
            .client()
            .await
            .map_err(tracerr::wrap!())?
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)?
            .as_ref()
            .map(from_row))
    }
}

impl<'l> Database<Select<By<Option<User>, &'l user::Username>>> for Postgres {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'l user::Username>>,
    ) -> Result<Self::Ok, Self::Err> {
        let name = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM users \
             WHERE name = $1::VARCHAR \
             LIMIT 1",
        );
        Ok(self
            .client()
            .await
            .map_err(tracerr::wrap!())?
            .query_opt(&sql, &[name])
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)?
            .as_ref()
            .map(from_row))
    }
}

impl<'l> Database<Select<By<Option<User>, &'l user::Email>>> for Postgres {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'l user::Email>>,
    ) -> Result<Self::Ok, Self::Err> {
        let email = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM users \
             WHERE email = $1::VARCHAR \
             LIMIT 1",
        );
        Ok(self
            .client()
            .await
            .map_err(tracerr::wrap!())?
            .query_opt(&sql, &[email])
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)?
            .as_ref()
            .map(from_row))
    }
}

impl Database<Insert<user::New>> for Postgres {
    type Ok = User;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(new): Insert<user::New>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            INSERT INTO users (name, email, password_hash, created_at) \
            VALUES (\
                $1::VARCHAR, $2::VARCHAR, \
                $3::VARCHAR, $4::TIMESTAMPTZ\
            ) \
            RETURNING id";
        let row = self
            .client()
            .await
            .map_err(tracerr::wrap!())?
            .query_one(
                SQL,
                &[
                    &new.name,
                    &new.email,
                    &new.password_hash,
                    &new.created_at,
                ],
            )
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)?;

        Ok(new.with_id(row.get("id")))
    }
}

impl Database<Update<User>> for Postgres {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(user): Update<User>,
    ) -> Result<Self::Ok, Self::Err> {
        let User {
            id,
            name,
            email,
            password_hash,
            created_at: _,
        } = user;

        const SQL: &str = "\
            UPDATE users \
            SET name = $2::VARCHAR, \
                email = $3::VARCHAR, \
                password_hash = $4::VARCHAR \
            WHERE id = $1::INT8";
        self.client()
            .await
            .map_err(tracerr::wrap!())?
            .execute(SQL, &[&id, &name, &email, &password_hash])
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
            .map(drop)
    }
}
