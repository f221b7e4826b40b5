//! # Session Persistence
//!
//! Named accessors for the signed-in session, stored under three fixed keys:
//!
//! | key                        | value                    |
//! |----------------------------|--------------------------|
//! | `trailguide.auth_token`    | bearer token (string)    |
//! | `trailguide.refresh_token` | refresh token (string)   |
//! | `trailguide.user_data`     | [`UserProfile`] as JSON  |
//!
//! Everything here inherits the store's fail-soft contract: reads give
//! `None`, writes give `false`, nothing panics or returns `Err`.

use log::{debug, warn};

use crate::api::types::{AuthTokens, UserProfile};
use crate::storage::Storage;

pub const AUTH_TOKEN_KEY: &str = "trailguide.auth_token";
pub const REFRESH_TOKEN_KEY: &str = "trailguide.refresh_token";
pub const USER_DATA_KEY: &str = "trailguide.user_data";

#[derive(Clone)]
pub struct SessionStore {
    storage: Storage,
}

impl SessionStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// The underlying store, for callers that keep their own keys.
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub async fn get_auth_token(&self) -> Option<String> {
        self.storage.get_item(AUTH_TOKEN_KEY).await
    }

    pub async fn set_auth_token(&self, token: &str) -> bool {
        self.storage.set_item(AUTH_TOKEN_KEY, token).await
    }

    pub async fn remove_auth_token(&self) -> bool {
        self.storage.remove_item(AUTH_TOKEN_KEY).await
    }

    pub async fn get_refresh_token(&self) -> Option<String> {
        self.storage.get_item(REFRESH_TOKEN_KEY).await
    }

    pub async fn set_refresh_token(&self, token: &str) -> bool {
        self.storage.set_item(REFRESH_TOKEN_KEY, token).await
    }

    pub async fn remove_refresh_token(&self) -> bool {
        self.storage.remove_item(REFRESH_TOKEN_KEY).await
    }

    pub async fn get_user_data(&self) -> Option<UserProfile> {
        self.storage.get_item(USER_DATA_KEY).await
    }

    pub async fn set_user_data(&self, user: &UserProfile) -> bool {
        self.storage.set_item(USER_DATA_KEY, user).await
    }

    pub async fn remove_user_data(&self) -> bool {
        self.storage.remove_item(USER_DATA_KEY).await
    }

    /// True when a bearer token is stored. Says nothing about whether the
    /// backend still accepts it.
    pub async fn is_authenticated(&self) -> bool {
        self.get_auth_token().await.is_some()
    }

    /// Stores whatever a login or refresh returned. Fields absent from
    /// `tokens` keep their stored value. `true` only if every write landed.
    pub async fn store_tokens(&self, tokens: &AuthTokens) -> bool {
        let mut ok = self.set_auth_token(&tokens.access_token).await;
        if let Some(refresh) = &tokens.refresh_token {
            ok &= self.set_refresh_token(refresh).await;
        }
        if let Some(user) = &tokens.user {
            ok &= self.set_user_data(user).await;
        }
        ok
    }

    /// Removes all three session keys concurrently.
    ///
    /// Best-effort: every removal is attempted even if another fails, and
    /// nothing is rolled back. Returns `true` only if all three succeeded.
    pub async fn clear_auth_data(&self) -> bool {
        let (auth, refresh, user) = tokio::join!(
            self.remove_auth_token(),
            self.remove_refresh_token(),
            self.remove_user_data(),
        );

        if auth && refresh && user {
            debug!("Cleared auth data");
            true
        } else {
            warn!(
                "Clearing auth data was partial: auth_token={}, refresh_token={}, user_data={}",
                auth, refresh, user
            );
            false
        }
    }
}
