//! `offerdesk-core`: shared vocabulary for the dashboard client core.
//!
//! This crate contains **pure data** primitives (no IO, no transport).

pub mod record;
pub mod role;

pub use record::{Record, as_record, is_blank};
pub use role::{Role, RoleInput, UnknownRole};
