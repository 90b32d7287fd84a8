//! Skill tracker backend library.
//!
//! Users and the skills they claim, behind an HTTP API with owner-only
//! access control. Each skill is stored both as an authoritative record and
//! as an embedded snapshot in its owner; the domain skill service keeps the
//! two representations coherent.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;

pub use doc::ApiDoc;
pub use middleware::Trace;
