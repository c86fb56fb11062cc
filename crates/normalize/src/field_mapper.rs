//! Resolve canonical values despite key-shape drift between API and UI.
//!
//! For each `api key → ui key` pair the record is searched with an explicit,
//! ordered list of candidate keys ([`CANDIDATE_RULES`]). The first candidate
//! that is present and not null wins. The order is part of the contract.

use serde_json::Value;

use offerdesk_core::Record;

use crate::casing::{lowercase, strip_underscores};

/// Which side of a mapping pair a candidate key is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Api,
    Ui,
}

/// One step of the probing pipeline.
#[derive(Debug, Clone, Copy)]
pub struct CandidateRule {
    pub name: &'static str,
    pub source: KeySource,
    pub transform: fn(&str) -> String,
}

impl CandidateRule {
    pub fn candidate(&self, api_key: &str, ui_key: &str) -> String {
        match self.source {
            KeySource::Api => (self.transform)(api_key),
            KeySource::Ui => (self.transform)(ui_key),
        }
    }
}

fn identity(key: &str) -> String {
    key.to_string()
}

/// Probing order: literal API key, lowercase API key, underscore-stripped API
/// key, literal UI key, lowercase UI key.
pub const CANDIDATE_RULES: [CandidateRule; 5] = [
    CandidateRule {
        name: "api",
        source: KeySource::Api,
        transform: identity,
    },
    CandidateRule {
        name: "api_lowercase",
        source: KeySource::Api,
        transform: lowercase,
    },
    CandidateRule {
        name: "api_without_underscores",
        source: KeySource::Api,
        transform: strip_underscores,
    },
    CandidateRule {
        name: "ui",
        source: KeySource::Ui,
        transform: identity,
    },
    CandidateRule {
        name: "ui_lowercase",
        source: KeySource::Ui,
        transform: lowercase,
    },
];

/// First non-null value found under any candidate key, in rule order.
pub fn resolve_value<'r>(record: &'r Record, api_key: &str, ui_key: &str) -> Option<&'r Value> {
    CANDIDATE_RULES.iter().find_map(|rule| {
        record
            .get(&rule.candidate(api_key, ui_key))
            .filter(|value| !value.is_null())
    })
}

/// Build a UI-keyed record from `record` using `pairs` (api key, ui key).
///
/// UI keys with no matching candidate are left out rather than set to null.
pub fn map_fields<'a, I>(record: &Record, pairs: I) -> Record
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut out = Record::new();
    for (api_key, ui_key) in pairs {
        if let Some(value) = resolve_value(record, api_key, ui_key) {
            out.insert(ui_key.to_string(), value.clone());
        }
    }
    out
}
