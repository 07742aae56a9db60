//! # Active Directory source
//!
//! Reads users, groups and member references from Active Directory over
//! LDAP, using paged searches, and normalizes `objectSid` at the boundary.

pub mod config;
pub mod entry;
pub mod source;

pub use config::AdConfig;
pub use source::{escape_filter_value, AdSource};
