//! Internal Diesel row structs for database operations.
//!
//! Implementation details of the persistence layer, never exposed to the
//! domain. Conversions to and from domain types live in the store adapters.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::{skills, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub roles: Vec<String>,
    pub skills: serde_json::Value,
    pub revision: i32,
    #[expect(dead_code, reason = "schema field kept for audit queries")]
    pub created_at: DateTime<Utc>,
    #[expect(dead_code, reason = "schema field kept for audit queries")]
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating new user records. Timestamps come from
/// column defaults.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub roles: Vec<String>,
    pub skills: serde_json::Value,
    pub revision: i32,
}

/// Changeset struct for updating existing user records.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct UserRowUpdate {
    pub username: String,
    pub password_hash: String,
    pub roles: Vec<String>,
    pub skills: serde_json::Value,
    pub revision: i32,
}

/// Row struct for reading from the skills table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = skills)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SkillRow {
    pub id: String,
    pub name: String,
    pub proficiency: String,
    #[expect(dead_code, reason = "schema field kept for audit queries")]
    pub created_at: DateTime<Utc>,
    #[expect(dead_code, reason = "schema field kept for audit queries")]
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating new skill records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = skills)]
pub(crate) struct NewSkillRow {
    pub id: String,
    pub name: String,
    pub proficiency: String,
}

/// Changeset struct for overwriting a skill record in place.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = skills)]
pub(crate) struct SkillRowUpdate {
    pub name: String,
    pub proficiency: String,
}
