//! Dashboard collections (business owners, buyers, countries, locations,
//! products) exposed as UI-shaped records.
//!
//! Outgoing records are denormalized for the signed-in role before they hit
//! the wire and incoming records are normalized on the way back.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use offerdesk_auth::SessionStore;
use offerdesk_core::{Record, Role, as_record};
use offerdesk_normalize::{FieldMapConfig, HiddenFields, denormalize_data, normalize_data};

use crate::{ApiClient, ApiError, ApiRequest, ApiResponse, HttpTransport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    BusinessOwners,
    Buyers,
    Countries,
    Locations,
    Products,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::BusinessOwners,
        Resource::Buyers,
        Resource::Countries,
        Resource::Locations,
        Resource::Products,
    ];

    /// Collection path relative to the API base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Resource::BusinessOwners => "/business-owners",
            Resource::Buyers => "/buyers",
            Resource::Countries => "/countries",
            Resource::Locations => "/locations",
            Resource::Products => "/products",
        }
    }

    fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.path(), id)
    }
}

impl core::fmt::Display for Resource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.path().trim_start_matches('/'))
    }
}

impl core::str::FromStr for Resource {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let folded: String = raw
            .trim()
            .trim_start_matches('/')
            .chars()
            .filter(|ch| !matches!(ch, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        match folded.as_str() {
            "businessowners" | "businessowner" => Ok(Resource::BusinessOwners),
            "buyers" | "buyer" => Ok(Resource::Buyers),
            "countries" | "country" => Ok(Resource::Countries),
            "locations" | "location" => Ok(Resource::Locations),
            "products" | "product" => Ok(Resource::Products),
            _ => Err(format!("unknown resource '{raw}'")),
        }
    }
}

/// Paging and search parameters for collection listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    fn apply(&self, mut request: ApiRequest) -> ApiRequest {
        if let Some(page) = self.page {
            request = request.with_query("page", page);
        }
        if let Some(limit) = self.limit {
            request = request.with_query("limit", limit);
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            request = request.with_query("search", search);
        }
        request
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default, alias = "totalCount", alias = "total_count")]
    pub total: u64,
}

impl Pagination {
    /// Pagination for a response that carried none: one page holding `rows`.
    pub fn single_page(page: u32, rows: usize) -> Self {
        Self {
            page,
            limit: u32::try_from(rows).unwrap_or(u32::MAX),
            total: u64::try_from(rows).unwrap_or(u64::MAX),
        }
    }
}

/// One page of UI-shaped rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub rows: Vec<Record>,
    pub pagination: Pagination,
}

impl Page {
    pub fn total_pages(&self) -> u64 {
        match self.pagination.limit {
            0 => u64::from(!self.rows.is_empty()),
            limit => self.pagination.total.div_ceil(u64::from(limit)),
        }
    }
}

/// CRUD over [`Resource`] collections for the signed-in role.
pub struct ResourceClient<T, S> {
    api: Arc<ApiClient<T, S>>,
    fields: Arc<FieldMapConfig>,
    hidden: HiddenFields,
    role: Option<Role>,
}

impl<T, S> ResourceClient<T, S>
where
    T: HttpTransport + 'static,
    S: SessionStore + 'static,
{
    pub fn new(api: Arc<ApiClient<T, S>>, fields: Arc<FieldMapConfig>) -> Self {
        Self {
            api,
            fields,
            hidden: HiddenFields::none(),
            role: None,
        }
    }

    pub fn with_hidden_fields(mut self, hidden: HiddenFields) -> Self {
        self.hidden = hidden;
        self
    }

    /// Pin the role instead of reading it from the stored session.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn api(&self) -> &ApiClient<T, S> {
        &self.api
    }

    fn role(&self) -> Result<Option<Role>, ApiError> {
        match self.role {
            Some(role) => Ok(Some(role)),
            None => self.api.current_role(),
        }
    }

    pub async fn list(&self, resource: Resource, query: &ListQuery) -> Result<Page, ApiError> {
        let role = self.role()?;
        let response = self
            .api
            .execute(query.apply(ApiRequest::get(resource.path())))
            .await?;

        let rows: Vec<Record> = match response.data() {
            Value::Array(items) => items
                .iter()
                .cloned()
                .filter_map(as_record)
                .map(|row| normalize_data(&row, role, &self.fields, &self.hidden))
                .collect(),
            other => {
                return Err(ApiError::Decode(format!(
                    "expected a list of {resource}, got {}",
                    json_kind(other)
                )));
            }
        };

        let pagination = match response.body.get("pagination").filter(|raw| !raw.is_null()) {
            Some(raw) => serde_json::from_value(raw.clone())?,
            None => Pagination::single_page(query.page.unwrap_or(1), rows.len()),
        };

        tracing::debug!(%resource, rows = rows.len(), total = pagination.total, "listed resource");
        Ok(Page { rows, pagination })
    }

    pub async fn get(&self, resource: Resource, id: &str) -> Result<Record, ApiError> {
        let role = self.role()?;
        let response = self.api.execute(ApiRequest::get(resource.item_path(id))).await?;
        self.single(response, role)
    }

    /// Create from a UI-shaped record; returns the created record, UI-shaped.
    pub async fn create(&self, resource: Resource, ui_record: &Record) -> Result<Record, ApiError> {
        let role = self.role()?;
        let body = denormalize_data(ui_record, role, &self.fields, &self.hidden);
        let response = self
            .api
            .execute(ApiRequest::post(resource.path(), Value::Object(body)))
            .await?;
        self.single(response, role)
    }

    pub async fn update(
        &self,
        resource: Resource,
        id: &str,
        ui_record: &Record,
    ) -> Result<Record, ApiError> {
        let role = self.role()?;
        let body = denormalize_data(ui_record, role, &self.fields, &self.hidden);
        let response = self
            .api
            .execute(ApiRequest::put(resource.item_path(id), Value::Object(body)))
            .await?;
        self.single(response, role)
    }

    pub async fn delete(&self, resource: Resource, id: &str) -> Result<(), ApiError> {
        self.api
            .execute(ApiRequest::delete(resource.item_path(id)))
            .await?;
        Ok(())
    }

    fn single(&self, response: ApiResponse, role: Option<Role>) -> Result<Record, ApiError> {
        match response.data() {
            Value::Object(record) => Ok(normalize_data(record, role, &self.fields, &self.hidden)),
            other => Err(ApiError::Decode(format!(
                "expected a record, got {}",
                json_kind(other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
