//! Shared request validation helpers.

use serde_json::json;

use crate::domain::{Error, Identity};

/// Parse an identity from path text; malformed text is a 400, matching the
/// boundary contract for identifier serialization.
pub(crate) fn parse_identity(raw: &str) -> Result<Identity, Error> {
    Identity::parse(raw).map_err(|error| {
        Error::invalid_request(format!("malformed identifier: {error}"))
            .with_details(json!({ "value": raw, "code": "invalid_identity" }))
    })
}

/// Partial-update field semantics: an empty string means "no change".
pub(crate) fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}
