//! `offerdesk-client`: authenticated HTTP access to the OfferDesk API.
//!
//! - [`ApiClient`] decorates requests with the bearer token and recovers from
//!   an expired access token with a single, shared refresh.
//! - [`RefreshCoordinator`] is the single-flight primitive behind that refresh.
//! - [`ResourceClient`] exposes the dashboard collections as UI-shaped records.
//!
//! The transport is pluggable through [`HttpTransport`]; [`ReqwestTransport`]
//! is the production implementation.

pub mod client;
pub mod config;
pub mod error;
pub mod refresh;
pub mod request;
pub mod resources;
pub mod transport;

pub use client::{ApiClient, Credentials, EXPIRED_TOKEN_MESSAGE, LOGIN_PATH, LOGOUT_PATH, REFRESH_PATH};
pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, RefreshError};
pub use refresh::RefreshCoordinator;
pub use request::{ApiRequest, ApiResponse, Envelope, Method};
pub use resources::{ListQuery, Page, Pagination, Resource, ResourceClient};
pub use transport::{HttpTransport, ReqwestTransport, TransportError};
