//! In-process fake of the dashboard API.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use offerdesk_auth::{MemorySessionStore, Session};
use offerdesk_client::{
    ApiClient, ApiRequest, ApiResponse, EXPIRED_TOKEN_MESSAGE, HttpTransport, LOGIN_PATH,
    LOGOUT_PATH, Method, REFRESH_PATH, TransportError,
};
use offerdesk_core::as_record;

pub const FRESH_TOKEN: &str = "fresh";
pub const STALE_TOKEN: &str = "stale";
pub const PASSWORD: &str = "correct horse";

/// Accepts only bearer [`FRESH_TOKEN`] (unless told otherwise) and answers the
/// refresh endpoint with a canned reply after a short delay.
pub struct FakeApi {
    accepted_token: Mutex<String>,
    refresh_reply: Mutex<ApiResponse>,
    refresh_delay: Duration,
    forced: Mutex<HashMap<String, ApiResponse>>,
    unreachable: Mutex<HashSet<String>>,
    routes: Mutex<HashMap<(Method, String), Value>>,
    refresh_calls: AtomicUsize,
    seen: Mutex<Vec<ApiRequest>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            accepted_token: Mutex::new(FRESH_TOKEN.to_string()),
            refresh_reply: Mutex::new(ApiResponse::new(
                200,
                json!({ "data": { "accessToken": FRESH_TOKEN, "refreshToken": "refresh-2" } }),
            )),
            refresh_delay: Duration::from_millis(25),
            forced: Mutex::new(HashMap::new()),
            unreachable: Mutex::new(HashSet::new()),
            routes: Mutex::new(HashMap::new()),
            refresh_calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = delay;
        self
    }

    pub fn accept_only(&self, token: &str) {
        *self.accepted_token.lock().unwrap() = token.to_string();
    }

    pub fn reply_to_refresh(&self, response: ApiResponse) {
        *self.refresh_reply.lock().unwrap() = response;
    }

    /// Answer `path` with `response` whatever the credentials.
    pub fn force(&self, path: &str, response: ApiResponse) {
        self.forced.lock().unwrap().insert(path.to_string(), response);
    }

    /// Fail every request to `path` before a response is received.
    pub fn drop_connections_to(&self, path: &str) {
        self.unreachable.lock().unwrap().insert(path.to_string());
    }

    /// Body returned for an authorized `method path`.
    pub fn route(&self, method: Method, path: &str, body: Value) {
        self.routes
            .lock()
            .unwrap()
            .insert((method, path.to_string()), body);
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.path == path)
            .cloned()
            .collect()
    }

    fn expired() -> ApiResponse {
        ApiResponse::new(403, json!({ "message": EXPIRED_TOKEN_MESSAGE }))
    }

    fn login(request: &ApiRequest) -> ApiResponse {
        let body = request.body.clone().unwrap_or(Value::Null);
        if body.get("password").and_then(Value::as_str) != Some(PASSWORD) {
            return ApiResponse::new(401, json!({ "message": "Invalid credentials" }));
        }
        ApiResponse::new(
            200,
            json!({
                "data": {
                    "accessToken": FRESH_TOKEN,
                    "refreshToken": "refresh-1",
                    "user": { "id": 1, "email": body["email"], "userRole": "business_owner" }
                }
            }),
        )
    }
}

#[async_trait]
impl HttpTransport for FakeApi {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.seen.lock().unwrap().push(request.clone());

        if self.unreachable.lock().unwrap().contains(&request.path) {
            return Err(TransportError("connection reset by peer".to_string()));
        }

        if let Some(response) = self.forced.lock().unwrap().get(&request.path) {
            return Ok(response.clone());
        }

        match request.path.as_str() {
            LOGIN_PATH => return Ok(Self::login(request)),
            LOGOUT_PATH => return Ok(ApiResponse::new(200, json!({ "message": "ok" }))),
            REFRESH_PATH => {
                self.refresh_calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(self.refresh_delay).await;
                return Ok(self.refresh_reply.lock().unwrap().clone());
            }
            _ => {}
        }

        let accepted = self.accepted_token.lock().unwrap().clone();
        if request.bearer_token() != Some(accepted.as_str()) {
            return Ok(Self::expired());
        }

        let body = self
            .routes
            .lock()
            .unwrap()
            .get(&(request.method, request.path.clone()))
            .cloned()
            .unwrap_or_else(|| json!({ "data": { "ok": true } }));
        Ok(ApiResponse::new(200, body))
    }
}

pub fn stale_session(role: &str) -> Session {
    let user = as_record(json!({ "id": 1, "email": "ops@offerdesk.io", "userRole": role }))
        .unwrap();
    Session::new(STALE_TOKEN, "refresh-1", user)
}

pub fn client_with(
    api: FakeApi,
    session: Option<Session>,
) -> (ApiClient<FakeApi, MemorySessionStore>, Arc<MemorySessionStore>) {
    let store = Arc::new(match session {
        Some(session) => MemorySessionStore::with_session(session),
        None => MemorySessionStore::new(),
    });
    (ApiClient::new(api, Arc::clone(&store)), store)
}
