use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use crate::api::{AuthApi, SignUpRequest, LOGIN_FALLBACK, REGISTER_FALLBACK};
use crate::client::AuthClient;
use crate::config::SessionConfig;
use crate::models::{SessionSnapshot, User};
use crate::storage::{Storage, TOKEN_KEY, USER_KEY};

/// Query string appended to the login route when the session is evicted.
const SESSION_EXPIRED_QUERY: &str = "error=session_expired";

/// Callback invoked when an authorization failure evicts the session.
/// Receives the ready-made navigation target, e.g.
/// "/login?error=session_expired". Injected by the host so the core stays
/// testable without a router.
pub type SessionExpiredHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Owns the session and its transitions; the single source of truth for
/// who is signed in.
///
/// Durable storage (the `token` and `user` keys) is authoritative across
/// restarts; the in-memory snapshot is rehydrated from it once per
/// `initialize` and kept in sync on every mutation.
pub struct SessionManager {
    api: AuthApi,
    storage: Arc<dyn Storage>,
    config: SessionConfig,
    state: RwLock<SessionSnapshot>,
    on_session_expired: RwLock<Option<SessionExpiredHook>>,
}

impl SessionManager {
    /// Create a manager over the given endpoint client and storage. The
    /// session starts in the loading state until `initialize` settles it.
    pub fn new(api: AuthApi, storage: Arc<dyn Storage>, config: SessionConfig) -> Self {
        SessionManager {
            api,
            storage,
            config,
            state: RwLock::new(SessionSnapshot {
                loading: true,
                ..Default::default()
            }),
            on_session_expired: RwLock::new(None),
        }
    }

    /// Inject the navigation side effect fired on forced logout.
    pub fn set_session_expired_hook(&self, hook: SessionExpiredHook) {
        *self
            .on_session_expired
            .write()
            .expect("session hook lock poisoned") = Some(hook);
    }

    /// A point-in-time copy of the session state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state
            .read()
            .expect("session state lock poisoned")
            .clone()
    }

    /// The signed-in user, if any.
    pub fn current_user(&self) -> Option<User> {
        self.snapshot().user
    }

    /// True while initial validation or a login/register transition runs.
    pub fn loading(&self) -> bool {
        self.snapshot().loading
    }

    pub(crate) fn base_uri(&self) -> &str {
        self.api.base_uri()
    }

    fn update_state<F>(&self, mutate: F)
    where
        F: FnOnce(&mut SessionSnapshot),
    {
        let mut state = self.state.write().expect("session state lock poisoned");
        mutate(&mut state);
    }

    /// Rehydrate and validate any persisted session. Runs once per process
    /// start, before dependent consumers render protected content.
    ///
    /// A cached user is made visible immediately so the host can render
    /// without waiting on the network; the who-am-i result then reconciles
    /// or clears it. A non-401 validation failure keeps the cached identity
    /// rather than logging the user out over a transient outage.
    pub async fn initialize(&self) {
        self.update_state(|state| state.loading = true);

        let token = match self.storage.get_item(TOKEN_KEY).await {
            Ok(Some(token)) if !token.is_empty() => token,
            _ => {
                debug!("No persisted token; starting unauthenticated.");
                self.update_state(|state| state.loading = false);
                return;
            }
        };

        let cached_user = self.read_cached_user().await;
        if let Some(user) = &cached_user {
            let user = user.clone();
            let optimistic_token = token.clone();
            self.update_state(move |state| {
                state.user = Some(user);
                state.token = Some(optimistic_token);
            });
            debug!("Showing cached identity while validation is in flight.");
        }

        match self.api.who_am_i(&token).await {
            Ok(mut user) => {
                user.token = Some(token.clone());
                if let Err(e) = self.persist(&token, &user).await {
                    warn!("Failed to persist validated user: {}", e);
                }
                info!("Validated persisted session for '{}'.", user.username);
                self.update_state(move |state| {
                    state.user = Some(user);
                    state.token = Some(token);
                    state.loading = false;
                });
            }
            Err(failure) if failure.is_unauthorized() => {
                info!("Persisted token rejected; clearing session.");
                self.logout().await;
            }
            Err(failure) => {
                if cached_user.is_some() {
                    warn!(
                        "Session validation unreachable, keeping cached identity: {}",
                        failure
                    );
                    self.update_state(|state| state.loading = false);
                } else {
                    warn!("Session validation failed with no cached identity: {}", failure);
                    self.logout().await;
                }
            }
        }
    }

    /// Submit credentials and establish a session.
    ///
    /// Success persists the token and user together, then mirrors them in
    /// memory. Failure leaves the previous session untouched and returns the
    /// server's message (or a fixed fallback), never a panic.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, String> {
        self.update_state(|state| {
            state.loading = true;
            state.error = None;
        });

        let outcome = match self.api.sign_in(username, password).await {
            Ok(response) => {
                let token = response.token.clone();
                let user = response.into_user();
                match self.persist(&token, &user).await {
                    Ok(()) => {
                        info!("User '{}' signed in.", user.username);
                        let persisted = user.clone();
                        self.update_state(move |state| {
                            state.user = Some(persisted);
                            state.token = Some(token);
                            state.error = None;
                        });
                        Ok(user)
                    }
                    Err(e) => {
                        warn!("Failed to persist session after sign-in: {}", e);
                        Err(LOGIN_FALLBACK.to_string())
                    }
                }
            }
            Err(failure) => {
                let message = if failure.status.is_some() {
                    failure.message
                } else {
                    warn!("Sign-in request failed: {}", failure.message);
                    LOGIN_FALLBACK.to_string()
                };
                Err(message)
            }
        };

        let error = outcome.as_ref().err().cloned();
        self.update_state(move |state| {
            state.loading = false;
            if error.is_some() {
                state.error = error;
            }
        });

        outcome
    }

    /// Submit a sign-up request. Does not establish a session; the new
    /// identity must log in afterwards. `phone` defaults to empty and
    /// `role` to the configured baseline when omitted.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        full_name: &str,
        phone: Option<&str>,
        role: Option<&str>,
    ) -> Result<String, String> {
        self.update_state(|state| {
            state.loading = true;
            state.error = None;
        });

        let request = SignUpRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            full_name: full_name.to_string(),
            phone: phone.unwrap_or_default().to_string(),
            role: role.unwrap_or(&self.config.default_role).to_string(),
        };

        let outcome = match self.api.sign_up(&request).await {
            Ok(message) => {
                info!("Registered new account '{}'.", username);
                Ok(message)
            }
            Err(failure) => {
                let message = if failure.status.is_some() {
                    failure.message
                } else {
                    warn!("Sign-up request failed: {}", failure.message);
                    REGISTER_FALLBACK.to_string()
                };
                Err(message)
            }
        };

        let error = outcome.as_ref().err().cloned();
        self.update_state(move |state| {
            state.loading = false;
            if error.is_some() {
                state.error = error;
            }
        });

        outcome
    }

    /// Clear the session from storage and memory. No network call, and safe
    /// to call when already logged out.
    pub async fn logout(&self) {
        if let Err(e) = self.storage.remove_item(TOKEN_KEY).await {
            warn!("Failed to remove persisted token: {}", e);
        }
        if let Err(e) = self.storage.remove_item(USER_KEY).await {
            warn!("Failed to remove persisted user: {}", e);
        }
        self.update_state(|state| {
            state.user = None;
            state.token = None;
            state.error = None;
            state.loading = false;
        });
        debug!("Session cleared.");
    }

    /// True iff a non-empty token currently exists in durable storage. Says
    /// nothing about server-side validity; that is discovered lazily on the
    /// next authenticated request.
    pub async fn is_authenticated(&self) -> bool {
        matches!(
            self.storage.get_item(TOKEN_KEY).await,
            Ok(Some(token)) if !token.is_empty()
        )
    }

    /// Forced logout on an authorization failure: clear the session, then
    /// hand the host the login target carrying the session-expired marker.
    pub(crate) async fn expire(&self) {
        info!("Session expired by an authorization failure.");
        self.logout().await;

        let target = format!("{}?{}", self.config.login_path, SESSION_EXPIRED_QUERY);
        let hook = self
            .on_session_expired
            .read()
            .expect("session hook lock poisoned")
            .clone();
        if let Some(hook) = hook {
            hook(&target);
        }
    }

    /// Resolve the bearer token for an outgoing request: the primary
    /// storage slot first, falling back to the copy embedded in the cached
    /// user record when the slots have drifted.
    pub(crate) async fn resolve_token(&self) -> Option<String> {
        if let Ok(Some(token)) = self.storage.get_item(TOKEN_KEY).await {
            if !token.is_empty() {
                return Some(token);
            }
        }

        self.read_cached_user()
            .await
            .and_then(|user| user.token)
            .filter(|token| !token.is_empty())
    }

    /// Build a fresh authenticated client bound to this session. Call per
    /// logical request sequence so the default header reflects the current
    /// token; the client re-reads storage at dispatch either way.
    pub async fn authenticated_client(self: Arc<Self>) -> AuthClient {
        AuthClient::new(self).await
    }

    /// Decode the persisted user record, discarding a corrupt entry so the
    /// flow proceeds as if no cache existed.
    async fn read_cached_user(&self) -> Option<User> {
        let raw = self.storage.get_item(USER_KEY).await.ok().flatten()?;
        match serde_json::from_str::<User>(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("Discarding corrupt cached user record: {}", e);
                let _ = self.storage.remove_item(USER_KEY).await;
                None
            }
        }
    }

    /// Persist the token and serialized user together.
    async fn persist(&self, token: &str, user: &User) -> Result<(), String> {
        let serialized = serde_json::to_string(user)
            .map_err(|e| format!("Failed to serialize user record: {}", e))?;
        self.storage.set_item(TOKEN_KEY, token).await?;
        self.storage.set_item(USER_KEY, &serialized).await?;
        Ok(())
    }
}
