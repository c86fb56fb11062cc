//! `offerdesk-normalize`: role-scoped translation between API and UI records.
//!
//! Pure transformations only: configuration and hidden fields are supplied by
//! the caller on every call and nothing is retained between calls.

pub mod casing;
pub mod config;
pub mod field_mapper;
pub mod normalize;

pub use casing::to_snake_case;
pub use config::{FieldConfigError, FieldMapConfig, RoleFieldMap};
pub use field_mapper::{CANDIDATE_RULES, CandidateRule, KeySource, map_fields, resolve_value};
pub use normalize::{HiddenFields, denormalize_data, normalize_data};
