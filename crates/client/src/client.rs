//! Authenticated API client with single-flight token refresh.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use offerdesk_auth::{Session, SessionStore, TokenRefresh, UserRecord};
use offerdesk_core::Role;

use crate::request::AUTHORIZATION;
use crate::{
    ApiError, ApiRequest, ApiResponse, ClientConfig, Envelope, HttpTransport, RefreshCoordinator,
    RefreshError, ReqwestTransport, TransportError,
};

pub const LOGIN_PATH: &str = "/auth/login";
pub const LOGOUT_PATH: &str = "/auth/logout";
pub const REFRESH_PATH: &str = "/auth/refresh-token";

/// Body `message` the API sends when the access token is invalid or expired.
pub const EXPIRED_TOKEN_MESSAGE: &str = "Invalid or expired access token";
const EXPIRED_TOKEN_STATUS: u16 = 403;

const REQUEST_ID: &str = "x-request-id";

/// Login form payload.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginPayload {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    user: UserRecord,
}

type DefaultAuthorization = Arc<RwLock<Option<String>>>;

/// Executes API requests on behalf of the signed-in user.
///
/// Every request is decorated with `Authorization: Bearer <token>` from the
/// session store (falling back to the default authorization set on login or
/// refresh). A 403 carrying [`EXPIRED_TOKEN_MESSAGE`] triggers one shared
/// refresh and a single replay of the failed request.
pub struct ApiClient<T, S> {
    transport: Arc<T>,
    store: Arc<S>,
    default_authorization: DefaultAuthorization,
    refresh: RefreshCoordinator,
}

impl<S> ApiClient<ReqwestTransport, S>
where
    S: SessionStore + 'static,
{
    pub fn from_config(config: &ClientConfig, store: Arc<S>) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(config.base_url.clone())?;
        Ok(Self::new(transport, store).with_refresh_timeout(config.refresh_timeout))
    }
}

impl<T, S> ApiClient<T, S>
where
    T: HttpTransport + 'static,
    S: SessionStore + 'static,
{
    pub fn new(transport: T, store: Arc<S>) -> Self {
        Self {
            transport: Arc::new(transport),
            store,
            default_authorization: Arc::new(RwLock::new(None)),
            refresh: RefreshCoordinator::new(None),
        }
    }

    pub fn with_refresh_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.refresh = RefreshCoordinator::new(timeout);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn refresh_coordinator(&self) -> &RefreshCoordinator {
        &self.refresh
    }

    /// `Authorization` value applied when the store holds no access token.
    pub fn default_authorization(&self) -> Option<String> {
        self.default_authorization
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Send `request`, refreshing the access token once if it has expired.
    ///
    /// Non-success responses come back as [`ApiError::Status`]; a failed
    /// refresh comes back as [`ApiError::Refresh`] wrapping the original error.
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut request = request;

        loop {
            let response = self.dispatch(&request).await?;
            if response.is_success() {
                return Ok(response);
            }

            if request.is_retried() || !is_expired_access_token(&response) {
                return Err(ApiError::from_response(response));
            }

            request.mark_retried();
            tracing::debug!(
                method = %request.method,
                path = %request.path,
                "access token expired; refreshing before replay"
            );

            if let Err(cause) = self.refresh_session().await {
                return Err(ApiError::Refresh {
                    cause,
                    original: Box::new(ApiError::from_response(response)),
                });
            }
        }
    }

    /// Run (or join) the shared token refresh.
    pub async fn refresh_session(&self) -> Result<Session, RefreshError> {
        let transport = Arc::clone(&self.transport);
        let store = Arc::clone(&self.store);
        let default_authorization = Arc::clone(&self.default_authorization);

        self.refresh
            .run(move || perform_refresh(transport, store, default_authorization))
            .await
    }

    /// `POST /auth/login` and persist the resulting session.
    pub async fn login(&self, credentials: &Credentials, remember: bool) -> Result<Session, ApiError> {
        let body = serde_json::to_value(credentials)?;
        let response = self
            .execute(ApiRequest::post(LOGIN_PATH, body).with_credentials())
            .await?;

        let payload = response.json::<Envelope<LoginPayload>>()?.data;
        if payload.access_token.is_empty() {
            return Err(ApiError::Decode(
                "login response carried no access token".to_string(),
            ));
        }

        let session = Session {
            access_token: payload.access_token,
            refresh_token: payload.refresh_token,
            user: payload.user,
            remember,
        };
        self.store.persist_session(&session, remember)?;
        set_default_authorization(&self.default_authorization, Some(&session.access_token));

        tracing::info!(remember, role = ?session.role(), "signed in");
        Ok(session)
    }

    /// Best-effort `POST /auth/logout`, then drop all local session state.
    pub async fn logout(&self) -> Result<(), ApiError> {
        if self.store.access_token()?.is_some() {
            let request = ApiRequest::post(LOGOUT_PATH, json!({})).with_credentials();
            if let Err(err) = self.execute(request).await {
                tracing::warn!(error = %err, "logout request failed; clearing local session anyway");
            }
        }

        self.store.clear_session()?;
        set_default_authorization(&self.default_authorization, None);
        tracing::info!("signed out");
        Ok(())
    }

    pub fn current_session(&self) -> Result<Option<Session>, ApiError> {
        Ok(self.store.stored_session()?)
    }

    pub fn current_user(&self) -> Result<Option<UserRecord>, ApiError> {
        Ok(self.current_session()?.map(|session| session.user))
    }

    pub fn current_role(&self) -> Result<Option<Role>, ApiError> {
        Ok(self.current_session()?.and_then(|session| session.role()))
    }

    async fn dispatch(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let outbound = self.decorate(request)?;
        tracing::debug!(
            method = %outbound.method,
            path = %outbound.path,
            request_id = outbound.header(REQUEST_ID).unwrap_or_default(),
            retried = outbound.is_retried(),
            "dispatching request"
        );
        Ok(self.transport.send(&outbound).await?)
    }

    /// Copy of `request` with auth and correlation headers applied. The token
    /// is read at dispatch time so a replay always sees the latest one.
    ///
    /// A caller-supplied `Authorization` header is honoured on the first
    /// dispatch only; a replay after refresh always carries the current token.
    fn decorate(&self, request: &ApiRequest) -> Result<ApiRequest, ApiError> {
        let mut outbound = request.clone();

        if outbound.is_retried() || outbound.header(AUTHORIZATION).is_none() {
            let authorization = match self.store.access_token()? {
                Some(token) => Some(bearer(&token)),
                None => self.default_authorization(),
            };
            if let Some(value) = authorization {
                outbound.headers.insert(AUTHORIZATION.to_string(), value);
            }
        }

        outbound
            .headers
            .entry(REQUEST_ID.to_string())
            .or_insert_with(|| Uuid::now_v7().to_string());

        Ok(outbound)
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

fn set_default_authorization(slot: &RwLock<Option<String>>, token: Option<&str>) {
    let mut guard = slot.write().unwrap_or_else(PoisonError::into_inner);
    *guard = token.map(bearer);
}

/// Only this exact 403 signature triggers a refresh; other 401/403 shapes are
/// ordinary errors.
fn is_expired_access_token(response: &ApiResponse) -> bool {
    response.status == EXPIRED_TOKEN_STATUS && response.message() == Some(EXPIRED_TOKEN_MESSAGE)
}

/// Spend the stored refresh token. Any failure clears the session.
async fn perform_refresh<T, S>(
    transport: Arc<T>,
    store: Arc<S>,
    default_authorization: DefaultAuthorization,
) -> Result<Session, RefreshError>
where
    T: HttpTransport,
    S: SessionStore,
{
    match request_new_session(transport.as_ref(), store.as_ref()).await {
        Ok(session) => {
            set_default_authorization(&default_authorization, Some(&session.access_token));
            tracing::info!("access token refreshed");
            Ok(session)
        }
        Err(err) => {
            tracing::warn!(error = %err, "token refresh failed; clearing session");
            if let Err(clear_err) = store.clear_session() {
                tracing::error!(error = %clear_err, "failed to clear session after refresh failure");
            }
            set_default_authorization(&default_authorization, None);
            Err(err)
        }
    }
}

async fn request_new_session<T, S>(transport: &T, store: &S) -> Result<Session, RefreshError>
where
    T: HttpTransport,
    S: SessionStore,
{
    let store_error = |err: offerdesk_auth::SessionStoreError| RefreshError::Store(err.to_string());

    let refresh_token = store
        .refresh_token()
        .map_err(store_error)?
        .ok_or(RefreshError::MissingRefreshToken)?;

    let request =
        ApiRequest::post(REFRESH_PATH, json!({ "refreshToken": refresh_token })).with_credentials();
    let response = transport
        .send(&request)
        .await
        .map_err(|err| RefreshError::Transport(err.0))?;

    if !response.is_success() {
        return Err(RefreshError::Rejected {
            status: response.status,
            message: response.message().unwrap_or("refresh rejected").to_string(),
        });
    }

    let tokens = serde_json::from_value::<Envelope<TokenRefresh>>(response.body.clone())
        .map(|envelope| envelope.data)
        .map_err(|err| RefreshError::Rejected {
            status: response.status,
            message: format!("malformed refresh response: {err}"),
        })?;

    let previous = store.stored_session().map_err(store_error)?;
    let session = Session::after_refresh(previous.as_ref(), &refresh_token, &tokens)
        .ok_or(RefreshError::MissingAccessToken)?;
    store
        .persist_session(&session, session.remember)
        .map_err(store_error)?;

    Ok(session)
}
