//! Persistence adapters for the two store ports.
//!
//! Two interchangeable backends:
//!
//! - **PostgreSQL via Diesel** (`diesel-async` + `bb8` pooling): thin
//!   adapters translating between row structs and domain types, with every
//!   database error mapped into the port's error enum. Business logic never
//!   lives here.
//! - **In-memory** (`Mutex<HashMap>`): used when no database is configured
//!   and by the integration tests; same observable contract.

mod diesel_skill_store;
mod diesel_user_store;
mod memory;
mod models;
mod pool;
mod schema;

pub use diesel_skill_store::DieselSkillStore;
pub use diesel_user_store::DieselUserStore;
pub use memory::{MemorySkillStore, MemoryUserStore};
pub use pool::{DbPool, PoolConfig, PoolError};
