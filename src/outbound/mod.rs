//! Outbound adapters (driven side of the hexagon).

pub mod persistence;
pub mod security;
