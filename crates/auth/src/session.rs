use serde::{Deserialize, Serialize};

use offerdesk_core::{Record, Role, RoleInput};

/// The signed-in user as returned by the backend (shape owned by the API).
pub type UserRecord = Record;

/// Authoritative authentication state.
///
/// Exactly one session is current at a time. It is replaced wholesale on
/// login and refresh and erased on logout or an unrecoverable refresh failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub user: UserRecord,
    #[serde(default)]
    pub remember: bool,
}

/// Token pair returned by the refresh endpoint. Either field may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRefresh {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl Session {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        user: UserRecord,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            user,
            remember: false,
        }
    }

    /// Build the session that follows a successful refresh.
    ///
    /// Fields the refresh response omits keep their previous values. Without a
    /// previous session the refresh token that was spent is kept and the user
    /// record starts empty. Returns `None` when no access token is available
    /// from either side.
    pub fn after_refresh(
        previous: Option<&Session>,
        spent_refresh_token: &str,
        tokens: &TokenRefresh,
    ) -> Option<Session> {
        let access_token = tokens
            .access_token
            .clone()
            .filter(|token| !token.is_empty())
            .or_else(|| previous.map(|s| s.access_token.clone()))
            .filter(|token| !token.is_empty())?;

        let refresh_token = tokens
            .refresh_token
            .clone()
            .filter(|token| !token.is_empty())
            .or_else(|| previous.map(|s| s.refresh_token.clone()))
            .unwrap_or_else(|| spent_refresh_token.to_string());

        Some(Session {
            access_token,
            refresh_token,
            user: previous.map(|s| s.user.clone()).unwrap_or_default(),
            remember: previous.is_some_and(|s| s.remember),
        })
    }

    /// Canonical role of the signed-in user, if the user record carries one.
    pub fn role(&self) -> Option<Role> {
        RoleInput::User(self.user.clone()).resolve()
    }
}
