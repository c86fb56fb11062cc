//! Wire record ⇄ UI record translation.

use std::collections::{BTreeSet, HashMap};

use offerdesk_core::{Record, Role, is_blank};

use crate::casing::to_snake_case;
use crate::config::{FieldMapConfig, RoleFieldMap};
use crate::field_mapper::map_fields;

/// Record keys deliberately kept out of UI-facing output.
///
/// Matching is case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HiddenFields {
    folded: BTreeSet<String>,
}

impl HiddenFields {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            folded: fields
                .into_iter()
                .map(|field| field.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        !self.folded.is_empty() && self.folded.contains(&key.to_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.folded.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for HiddenFields {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Translate a backend record into the UI shape for `role`.
///
/// Only fields named in the role's `API_TO_UI` map survive; hidden fields are
/// removed afterwards. An unknown role yields an empty record.
pub fn normalize_data(
    record: &Record,
    role: Option<Role>,
    config: &FieldMapConfig,
    hidden_fields: &HiddenFields,
) -> Record {
    let map = config.for_role(role);
    let mut out = map_fields(record, map.api_to_ui_pairs());
    if !hidden_fields.is_empty() {
        out.retain(|key, _| !hidden_fields.contains(key));
    }
    out
}

/// Translate a UI record back into the wire shape for `role`.
///
/// Blank values (null, empty string) and hidden keys are skipped. If two UI
/// keys resolve to the same API key the first one (in key order) wins.
pub fn denormalize_data(
    ui_record: &Record,
    role: Option<Role>,
    config: &FieldMapConfig,
    hidden_fields: &HiddenFields,
) -> Record {
    let map = config.for_role(role);
    let mut out = Record::new();
    let mut sources: HashMap<String, &str> = HashMap::new();

    for (ui_key, value) in ui_record {
        if is_blank(value) || hidden_fields.contains(ui_key) {
            continue;
        }

        let api_key = resolve_api_key(map, ui_key);
        if let Some(first) = sources.get(&api_key) {
            tracing::warn!(
                api_key = %api_key,
                kept = %first,
                dropped = %ui_key,
                "two UI fields map to the same API field"
            );
            continue;
        }

        sources.insert(api_key.clone(), ui_key.as_str());
        out.insert(api_key, value.clone());
    }

    out
}

/// Direct lookup, then the snake_cased key, then a scan for a map key whose
/// snake_case form matches, then the snake_cased key itself.
///
/// A key that is already one of the role's API keys is kept verbatim before
/// falling back to snake_case, so wire-shaped input passes through unchanged.
fn resolve_api_key(map: &RoleFieldMap, ui_key: &str) -> String {
    if let Some(api_key) = map.ui_to_api.get(ui_key) {
        return api_key.clone();
    }

    let snake = to_snake_case(ui_key);
    if let Some(api_key) = map.ui_to_api.get(&snake) {
        return api_key.clone();
    }

    if let Some((_, api_key)) = map
        .ui_to_api
        .iter()
        .find(|(candidate, _)| to_snake_case(candidate) == snake)
    {
        return api_key.clone();
    }

    if is_api_key(map, ui_key) {
        return ui_key.to_string();
    }

    snake
}

fn is_api_key(map: &RoleFieldMap, key: &str) -> bool {
    map.api_to_ui.contains_key(key) || map.ui_to_api.values().any(|api_key| api_key == key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn record(value: Value) -> Record {
        offerdesk_core::as_record(value).unwrap()
    }

    fn buyer_config() -> FieldMapConfig {
        FieldMapConfig::new().with_role(
            Role::Buyer,
            RoleFieldMap::inverted([
                ("buyers_company_name", "buyersCompanyName"),
                ("id", "id"),
                ("country_code", "countryCode"),
            ]),
        )
    }

    #[test]
    fn round_trip_example() {
        let config = FieldMapConfig::new().with_role(
            Role::Buyer,
            RoleFieldMap {
                api_to_ui: [("buyers_company_name".into(), "buyersCompanyName".into())].into(),
                ui_to_api: [("buyersCompanyName".into(), "buyers_company_name".into())].into(),
            },
        );
        let input = record(json!({ "buyers_company_name": "Acme", "contactEmail": "a@b.com" }));

        let ui = normalize_data(&input, Some(Role::Buyer), &config, &HiddenFields::none());
        assert_eq!(ui, record(json!({ "buyersCompanyName": "Acme" })));

        let wire = denormalize_data(&ui, Some(Role::Buyer), &config, &HiddenFields::none());
        assert_eq!(wire, record(json!({ "buyers_company_name": "Acme" })));
    }

    #[test]
    fn hidden_fields_are_removed_case_insensitively() {
        let input = record(json!({ "id": 9, "buyers_company_name": "Acme" }));

        let ui = normalize_data(&input, Some(Role::Buyer), &buyer_config(), &HiddenFields::new(["ID"]));
        assert!(!ui.contains_key("id"));
        assert_eq!(ui["buyersCompanyName"], "Acme");
    }

    #[test]
    fn normalizing_twice_is_byte_identical() {
        let input = record(json!({ "id": 9, "buyers_company_name": "Acme", "CountryCode": "NG" }));
        let hidden = HiddenFields::new(["id"]);

        let first = normalize_data(&input, Some(Role::Buyer), &buyer_config(), &hidden);
        let second = normalize_data(&input, Some(Role::Buyer), &buyer_config(), &hidden);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn renormalizing_a_ui_record_is_stable() {
        let input = record(json!({ "id": 9, "buyers_company_name": "Acme", "countrycode": "NG" }));
        let once = normalize_data(&input, Some(Role::Buyer), &buyer_config(), &HiddenFields::none());
        let twice = normalize_data(&once, Some(Role::Buyer), &buyer_config(), &HiddenFields::none());
        assert_eq!(once, twice);
        assert_eq!(once["countryCode"], "NG");
    }

    #[test]
    fn denormalize_skips_blank_and_hidden_values() {
        let ui = record(json!({
            "buyersCompanyName": "",
            "countryCode": null,
            "id": 4,
            "notes": "keep"
        }));

        let wire = denormalize_data(&ui, Some(Role::Buyer), &buyer_config(), &HiddenFields::new(["Id"]));
        assert_eq!(wire, record(json!({ "notes": "keep" })));
    }

    #[test]
    fn denormalize_resolution_chain() {
        let config = FieldMapConfig::new().with_role(
            Role::Admin,
            RoleFieldMap {
                api_to_ui: Default::default(),
                ui_to_api: [
                    ("buyersCompanyName".to_string(), "company".to_string()),
                    ("contact_email".to_string(), "email".to_string()),
                    ("postalCode".to_string(), "zip".to_string()),
                ]
                .into(),
            },
        );
        let ui = record(json!({
            "buyersCompanyName": "direct",
            "contactEmail": "snake lookup",
            "postal_code": "reverse scan",
            "phoneNumber": "verbatim"
        }));

        let wire = denormalize_data(&ui, Some(Role::Admin), &config, &HiddenFields::none());
        assert_eq!(
            wire,
            record(json!({
                "company": "direct",
                "email": "snake lookup",
                "zip": "reverse scan",
                "phone_number": "verbatim"
            }))
        );
    }

    #[test]
    fn denormalizing_wire_output_again_is_a_no_op() {
        let config = FieldMapConfig::new().with_role(
            Role::Admin,
            RoleFieldMap {
                api_to_ui: Default::default(),
                ui_to_api: [
                    ("buyersCompanyName".to_string(), "company".to_string()),
                    ("contact_email".to_string(), "email".to_string()),
                    ("postalCode".to_string(), "zip".to_string()),
                    ("vat".to_string(), "VATNumber".to_string()),
                ]
                .into(),
            },
        );
        let ui = record(json!({
            "buyersCompanyName": "direct",
            "contactEmail": "snake lookup",
            "postal_code": "reverse scan",
            "vat": "DE123",
            "phoneNumber": "verbatim"
        }));
        let none = HiddenFields::none();

        let once = denormalize_data(&ui, Some(Role::Admin), &config, &none);
        let twice = denormalize_data(&once, Some(Role::Admin), &config, &none);

        assert_eq!(once["VATNumber"], "DE123");
        assert_eq!(twice, once);
    }

    #[test]
    fn colliding_ui_keys_keep_the_first_value() {
        let ui = record(json!({ "countryCode": "first", "country_code": "second" }));
        let wire = denormalize_data(&ui, None, &FieldMapConfig::new(), &HiddenFields::none());
        assert_eq!(wire, record(json!({ "country_code": "first" })));
    }

    #[test]
    fn unknown_role_degrades_gracefully() {
        let input = record(json!({ "buyers_company_name": "Acme" }));
        assert!(normalize_data(&input, None, &buyer_config(), &HiddenFields::none()).is_empty());

        let ui = record(json!({ "buyersCompanyName": "Acme" }));
        let wire = denormalize_data(&ui, Some(Role::Admin), &buyer_config(), &HiddenFields::none());
        assert_eq!(wire, record(json!({ "buyers_company_name": "Acme" })));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn camel(snake: &str) -> String {
            let mut out = String::new();
            let mut upper = false;
            for ch in snake.chars() {
                if ch == '_' {
                    upper = true;
                } else if upper {
                    out.extend(ch.to_uppercase());
                    upper = false;
                } else {
                    out.push(ch);
                }
            }
            out
        }

        fn api_keys() -> impl Strategy<Value = BTreeSet<String>> {
            prop::collection::btree_set(
                prop::collection::vec("[a-z]{1,6}", 1..4).prop_map(|parts| parts.join("_")),
                1..8,
            )
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: denormalize(normalize(r)) reproduces every mapped, non-blank field.
            #[test]
            fn round_trip_preserves_mapped_fields(
                keys in api_keys(),
                values in prop::collection::vec("[A-Za-z0-9 ]{1,12}", 8)
            ) {
                let config = FieldMapConfig::new().with_role(
                    Role::Buyer,
                    RoleFieldMap::inverted(keys.iter().map(|k| (k.clone(), camel(k)))),
                );
                let input: Record = keys
                    .iter()
                    .zip(values.iter())
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect();

                let ui = normalize_data(&input, Some(Role::Buyer), &config, &HiddenFields::none());
                let wire = denormalize_data(&ui, Some(Role::Buyer), &config, &HiddenFields::none());
                prop_assert_eq!(wire, input);
            }

            /// Property: denormalizing a wire-shaped record leaves it unchanged.
            #[test]
            fn denormalize_is_idempotent(
                keys in api_keys(),
                values in prop::collection::vec("[A-Za-z0-9 ]{1,12}", 8)
            ) {
                let config = FieldMapConfig::new().with_role(
                    Role::Buyer,
                    RoleFieldMap::inverted(keys.iter().map(|k| (k.clone(), camel(k)))),
                );
                let mut ui: Record = keys
                    .iter()
                    .zip(values.iter())
                    .map(|(k, v)| (camel(k), Value::String(v.clone())))
                    .collect();
                ui.insert("x9Note".to_string(), Value::String("unmapped".to_string()));
                let none = HiddenFields::none();

                let once = denormalize_data(&ui, Some(Role::Buyer), &config, &none);
                let twice = denormalize_data(&once, Some(Role::Buyer), &config, &none);
                prop_assert_eq!(twice, once);
            }

            /// Property: normalization is deterministic and keeps no state between calls.
            #[test]
            fn normalize_is_deterministic(
                keys in api_keys(),
                hidden_index in 0usize..8
            ) {
                let config = FieldMapConfig::new().with_role(
                    Role::Buyer,
                    RoleFieldMap::inverted(keys.iter().map(|k| (k.clone(), camel(k)))),
                );
                let input: Record = keys
                    .iter()
                    .map(|k| (k.clone(), Value::String(k.to_uppercase())))
                    .collect();
                let hidden: HiddenFields = keys
                    .iter()
                    .nth(hidden_index % keys.len())
                    .map(|k| camel(k).to_uppercase())
                    .into_iter()
                    .collect();

                let first = normalize_data(&input, Some(Role::Buyer), &config, &hidden);
                let second = normalize_data(&input, Some(Role::Buyer), &config, &hidden);
                prop_assert_eq!(
                    serde_json::to_string(&first).unwrap(),
                    serde_json::to_string(&second).unwrap()
                );
                prop_assert!(first.len() < keys.len());
            }
        }
    }
}
