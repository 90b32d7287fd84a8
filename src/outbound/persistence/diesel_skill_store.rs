//! PostgreSQL-backed `SkillStore` implementation using Diesel.
//!
//! The unique index on `skills.name` enforces global name uniqueness; this
//! adapter translates the violation into the port's `DuplicateName`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{SkillStore, SkillStoreError};
use crate::domain::{Identity, Skill, SkillDraft};

use super::models::{NewSkillRow, SkillRow, SkillRowUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::skills;

/// Diesel-backed implementation of the `SkillStore` port.
#[derive(Clone)]
pub struct DieselSkillStore {
    pool: DbPool,
}

impl DieselSkillStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> SkillStoreError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            SkillStoreError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> SkillStoreError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        other => debug!(error = %other, "diesel operation failed"),
    }

    match error {
        DieselError::NotFound => SkillStoreError::NotFound,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            SkillStoreError::DuplicateName
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            SkillStoreError::connection("database connection error")
        }
        _ => SkillStoreError::query("database error"),
    }
}

fn row_to_skill(row: SkillRow) -> Result<Skill, SkillStoreError> {
    let id = Identity::parse(&row.id)
        .map_err(|err| SkillStoreError::query(format!("stored skill id invalid: {err}")))?;
    Ok(Skill {
        id,
        name: row.name,
        proficiency: row.proficiency,
    })
}

#[async_trait]
impl SkillStore for DieselSkillStore {
    async fn insert(&self, draft: &SkillDraft) -> Result<Identity, SkillStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let id = Identity::generate();
        let row = NewSkillRow {
            id: id.to_hex(),
            name: draft.name().to_owned(),
            proficiency: draft.proficiency().to_owned(),
        };

        diesel::insert_into(skills::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(id)
    }

    async fn get(&self, id: &Identity) -> Result<Skill, SkillStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<SkillRow> = skills::table
            .filter(skills::id.eq(id.to_hex()))
            .select(SkillRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_skill)
            .transpose()?
            .ok_or(SkillStoreError::NotFound)
    }

    async fn update(&self, skill: &Skill) -> Result<(), SkillStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let changes = SkillRowUpdate {
            name: skill.name.clone(),
            proficiency: skill.proficiency.clone(),
        };

        let updated = diesel::update(skills::table.filter(skills::id.eq(skill.id.to_hex())))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(SkillStoreError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: &Identity) -> Result<(), SkillStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(skills::table.filter(skills::id.eq(id.to_hex())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if deleted == 0 {
            return Err(SkillStoreError::NotFound);
        }
        Ok(())
    }
}
