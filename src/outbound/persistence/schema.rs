//! Diesel table definitions for the PostgreSQL schema.
//!
//! These must match the SQL in `migrations/` exactly; regenerate with
//! `diesel print-schema` after a migration changes the layout.

diesel::table! {
    /// User accounts, each carrying its embedded skill cache.
    users (id) {
        /// Primary key: 24-character hex identity.
        id -> Varchar,
        /// Unique login name.
        username -> Varchar,
        /// bcrypt hash of the password; plain text is never stored.
        password_hash -> Varchar,
        /// Granted roles, in grant order.
        roles -> Array<Text>,
        /// Denormalized skill snapshots (JSON array) in insertion order.
        skills -> Jsonb,
        /// Optimistic-concurrency revision, starting at 1.
        revision -> Int4,
        created_at -> Timestamptz,
        /// Last modification timestamp (maintained by trigger).
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Authoritative skill records. Ownership is not stored here; it exists
    /// only as the embedded reference inside the owning user row.
    skills (id) {
        /// Primary key: 24-character hex identity.
        id -> Varchar,
        /// Unique across the whole table, case-sensitively.
        name -> Varchar,
        proficiency -> Varchar,
        created_at -> Timestamptz,
        /// Last modification timestamp (maintained by trigger).
        updated_at -> Timestamptz,
    }
}
