//! Per-role field map configuration.
//!
//! The JSON shape mirrors what the dashboard ships:
//!
//! ```json
//! { "buyer": { "API_TO_UI": { "buyers_company_name": "buyersCompanyName" },
//!              "UI_TO_API": { "buyersCompanyName": "buyers_company_name" } } }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use offerdesk_core::Role;

#[derive(Debug, Error)]
pub enum FieldConfigError {
    #[error("failed to read field config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid field config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Bidirectional field map for one role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleFieldMap {
    #[serde(rename = "API_TO_UI", default)]
    pub api_to_ui: BTreeMap<String, String>,

    #[serde(rename = "UI_TO_API", default)]
    pub ui_to_api: BTreeMap<String, String>,
}

static EMPTY_ROLE_MAP: RoleFieldMap = RoleFieldMap {
    api_to_ui: BTreeMap::new(),
    ui_to_api: BTreeMap::new(),
};

impl RoleFieldMap {
    /// Map built from `API_TO_UI` alone; `UI_TO_API` is its inverse.
    pub fn inverted<I, A, U>(api_to_ui: I) -> Self
    where
        I: IntoIterator<Item = (A, U)>,
        A: Into<String>,
        U: Into<String>,
    {
        let api_to_ui: BTreeMap<String, String> = api_to_ui
            .into_iter()
            .map(|(api, ui)| (api.into(), ui.into()))
            .collect();
        let ui_to_api = api_to_ui
            .iter()
            .map(|(api, ui)| (ui.clone(), api.clone()))
            .collect();
        Self {
            api_to_ui,
            ui_to_api,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.api_to_ui.is_empty() && self.ui_to_api.is_empty()
    }

    /// `(api key, ui key)` pairs in a stable order.
    pub fn api_to_ui_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.api_to_ui
            .iter()
            .map(|(api, ui)| (api.as_str(), ui.as_str()))
    }
}

/// Field maps for every configured role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMapConfig {
    roles: BTreeMap<Role, RoleFieldMap>,
}

impl FieldMapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, role: Role, map: RoleFieldMap) -> Self {
        self.insert(role, map);
        self
    }

    pub fn insert(&mut self, role: Role, map: RoleFieldMap) {
        self.roles.insert(role, map);
    }

    /// Map for `role`; an unknown or unconfigured role gets an empty map.
    pub fn for_role(&self, role: Option<Role>) -> &RoleFieldMap {
        role.and_then(|role| self.roles.get(&role))
            .unwrap_or(&EMPTY_ROLE_MAP)
    }

    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.roles.keys().copied()
    }

    /// Parse the dashboard JSON shape.
    ///
    /// Role keys that do not name a known role are skipped with a warning. A
    /// role that only ships `API_TO_UI` gets the inverse as its `UI_TO_API`.
    pub fn from_json_str(raw: &str) -> Result<Self, FieldConfigError> {
        let parsed: BTreeMap<String, RoleFieldMap> = serde_json::from_str(raw)?;

        let mut config = Self::new();
        for (key, mut map) in parsed {
            let role = match key.parse::<Role>() {
                Ok(role) => role,
                Err(err) => {
                    tracing::warn!(role = %key, error = %err, "skipping field map for unknown role");
                    continue;
                }
            };
            if map.ui_to_api.is_empty() && !map.api_to_ui.is_empty() {
                map = RoleFieldMap::inverted(map.api_to_ui);
            }
            config.insert(role, map);
        }
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FieldConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| FieldConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }
}
