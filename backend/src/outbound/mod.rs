//! Outbound adapters implementing the domain's driven ports.

pub mod mail;
pub mod persistence;
pub mod reset_tokens;
pub mod security;
