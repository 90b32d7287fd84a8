//! Shared HTTP adapter state.
//!
//! Handlers receive this via `actix_web::web::Data`, so they depend only on
//! the domain's driving ports and remain testable without real persistence.

use std::sync::Arc;

use crate::domain::ports::{AccountService, SkillService};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn AccountService>,
    pub skills: Arc<dyn SkillService>,
}

impl HttpState {
    /// Construct state from the two driving ports.
    pub fn new(accounts: Arc<dyn AccountService>, skills: Arc<dyn SkillService>) -> Self {
        Self { accounts, skills }
    }
}
