//! # Auth Flows
//!
//! Login, token refresh and logout, built from a [`RequestExecutor`] per
//! endpoint and the [`SessionStore`]. Successful responses are written to
//! the store; the executors keep the request state for anyone watching.

use log::{debug, info, warn};

use crate::api::client::ApiClient;
use crate::api::types::{ApiError, AuthTokens, LoginRequest, RefreshRequest, UserProfile};
use crate::core::executor::RequestExecutor;
use crate::core::session::SessionStore;

pub const LOGIN_PATH: &str = "auth/login";
pub const REFRESH_PATH: &str = "auth/refresh";

pub type AuthExecutor<A> = RequestExecutor<A, AuthTokens, ApiError>;

pub struct AuthService {
    session: SessionStore,
    login: AuthExecutor<LoginRequest>,
    refresh: AuthExecutor<RefreshRequest>,
}

impl AuthService {
    pub fn new(client: ApiClient, session: SessionStore) -> Self {
        let login_client = client.clone();
        let login: AuthExecutor<LoginRequest> = RequestExecutor::new(move |req: LoginRequest| {
            let client = login_client.clone();
            async move { client.post::<_, AuthTokens>(LOGIN_PATH, &req).await }
        });

        let refresh: AuthExecutor<RefreshRequest> = RequestExecutor::new(move |req: RefreshRequest| {
            let client = client.clone();
            async move { client.post::<_, AuthTokens>(REFRESH_PATH, &req).await }
        });

        Self {
            session,
            login,
            refresh,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Request state of the last login attempt.
    pub fn login_requests(&self) -> &AuthExecutor<LoginRequest> {
        &self.login
    }

    pub fn refresh_requests(&self) -> &AuthExecutor<RefreshRequest> {
        &self.refresh
    }

    /// Signs in and stores the returned tokens and profile.
    ///
    /// `None` on failure; the reason is in `login_requests().error()`.
    pub async fn login(&self, email: &str, password: &str) -> Option<AuthTokens> {
        let tokens = self
            .login
            .execute(LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;

        if !self.session.store_tokens(&tokens).await {
            warn!("Login succeeded but the session could not be fully stored");
        }
        info!("Logged in as {}", email);
        Some(tokens)
    }

    /// Trades the stored refresh token for a new access token.
    ///
    /// Without a stored refresh token nothing is sent. A 401 means the
    /// refresh token is dead, so the whole session is cleared.
    pub async fn refresh(&self) -> Option<AuthTokens> {
        let Some(refresh_token) = self.session.get_refresh_token().await else {
            debug!("No refresh token stored, skipping refresh");
            return None;
        };

        match self.refresh.execute(RefreshRequest { refresh_token }).await {
            Some(tokens) => {
                if !self.session.store_tokens(&tokens).await {
                    warn!("Token refresh succeeded but the new tokens could not be stored");
                }
                debug!("Access token refreshed");
                Some(tokens)
            }
            None => {
                if self.refresh.error().and_then(|e| e.status()) == Some(401) {
                    info!("Refresh token rejected, clearing session");
                    self.session.clear_auth_data().await;
                }
                None
            }
        }
    }

    /// Drops the local session. `false` if any key could not be removed.
    pub async fn logout(&self) -> bool {
        self.login.reset();
        self.refresh.reset();
        self.session.clear_auth_data().await
    }

    pub async fn current_user(&self) -> Option<UserProfile> {
        self.session.get_user_data().await
    }
}
