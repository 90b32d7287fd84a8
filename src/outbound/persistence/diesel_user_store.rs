//! PostgreSQL-backed `UserStore` implementation using Diesel.
//!
//! A thin adapter: rows in, domain aggregates out, every Diesel error
//! funnelled into the port's error type. The embedded skill cache rides in
//! the `skills` jsonb column; the revision check rides in the update's
//! `WHERE` clause.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{UserStore, UserStoreError};
use crate::domain::{Identity, NewUser, Skill, User, Username};

use super::models::{NewUserRow, UserRow, UserRowUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the `UserStore` port.
#[derive(Clone)]
pub struct DieselUserStore {
    pool: DbPool,
}

impl DieselUserStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserStoreError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            UserStoreError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> UserStoreError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        other => debug!(error = %other, "diesel operation failed"),
    }

    match error {
        DieselError::NotFound => UserStoreError::NotFound,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            UserStoreError::DuplicateUsername
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            UserStoreError::connection("database connection error")
        }
        _ => UserStoreError::query("database error"),
    }
}

/// Convert a database row to the domain aggregate. Rows are written by this
/// adapter only, so a conversion failure means the table was edited by hand.
fn row_to_user(row: UserRow) -> Result<User, UserStoreError> {
    let id = Identity::parse(&row.id)
        .map_err(|err| UserStoreError::query(format!("stored user id invalid: {err}")))?;
    let username = Username::new(&row.username)
        .map_err(|err| UserStoreError::query(format!("stored username invalid: {err}")))?;
    let skills: Vec<Skill> = serde_json::from_value(row.skills)
        .map_err(|err| UserStoreError::query(format!("stored skill cache invalid: {err}")))?;

    #[expect(
        clippy::cast_sign_loss,
        reason = "revision is always non-negative in database"
    )]
    let revision = row.revision as u32;

    Ok(User {
        id,
        username,
        password_hash: row.password_hash,
        roles: row.roles,
        skills,
        revision,
    })
}

#[expect(
    clippy::cast_possible_wrap,
    reason = "revision values are always small positive integers"
)]
fn revision_for_db(revision: u32) -> i32 {
    revision as i32
}

fn encode_skills(skills: &[Skill]) -> Result<serde_json::Value, UserStoreError> {
    serde_json::to_value(skills)
        .map_err(|err| UserStoreError::query(format!("skill cache serialization failed: {err}")))
}

#[async_trait]
impl UserStore for DieselUserStore {
    async fn insert(&self, new_user: &NewUser) -> Result<Identity, UserStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let id = Identity::generate();
        let row = NewUserRow {
            id: id.to_hex(),
            username: new_user.username.as_ref().to_owned(),
            password_hash: new_user.password_hash.clone(),
            roles: new_user.roles.clone(),
            skills: serde_json::Value::Array(Vec::new()),
            revision: 1,
        };

        diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(id)
    }

    async fn get(&self, id: &Identity) -> Result<User, UserStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(users::id.eq(id.to_hex()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_user)
            .transpose()?
            .ok_or(UserStoreError::NotFound)
    }

    async fn update(&self, user: &User, expected_revision: u32) -> Result<(), UserStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let changes = UserRowUpdate {
            username: user.username.as_ref().to_owned(),
            password_hash: user.password_hash.clone(),
            roles: user.roles.clone(),
            skills: encode_skills(&user.skills)?,
            revision: revision_for_db(user.revision),
        };

        let updated = diesel::update(
            users::table
                .filter(users::id.eq(user.id.to_hex()))
                .filter(users::revision.eq(revision_for_db(expected_revision))),
        )
        .set(&changes)
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        if updated > 0 {
            return Ok(());
        }

        // Zero rows: the record is gone or the revision moved. Look again to
        // tell which.
        let current: Option<UserRow> = users::table
            .filter(users::id.eq(user.id.to_hex()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        match current {
            Some(row) => {
                #[expect(
                    clippy::cast_sign_loss,
                    reason = "revision is always non-negative in database"
                )]
                let actual = row.revision as u32;
                Err(UserStoreError::StaleRevision {
                    expected: expected_revision,
                    actual,
                })
            }
            None => Err(UserStoreError::NotFound),
        }
    }

    async fn delete(&self, id: &Identity) -> Result<(), UserStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(users::table.filter(users::id.eq(id.to_hex())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if deleted == 0 {
            return Err(UserStoreError::NotFound);
        }
        Ok(())
    }

    async fn find_by_username(&self, username: &str) -> Result<User, UserStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(users::username.eq(username))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_user)
            .transpose()?
            .ok_or(UserStoreError::NotFound)
    }
}
