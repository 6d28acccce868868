//! Session store and bootstrap sequencer.
//!
//! [`SessionStore`] is the single source of truth for authentication state. It
//! owns the bearer credential, the authenticated user's profile and the only
//! [`GatewayAuthority`], so no other component can change what the gateway
//! sends. State changes are published on a `watch` channel so a view layer can
//! wait for the bootstrap to finish before choosing what to show.
//!
//! Lifecycle:
//!
//! ```text
//! Initializing --(no stored credential)--> Unauthenticated
//! Initializing --(stored credential)-----> Validating --(ok)------> Authenticated
//!                                                     --(failure)-> Unauthenticated
//! Authenticated   --logout-------------------------> Unauthenticated
//! Unauthenticated --login/register success---------> Authenticated
//! ```

mod credential;
mod forms;
mod storage;

pub use credential::Credential;
pub use forms::RegistrationForm;
pub use storage::{CredentialStore, FileCredentialStore, MemoryCredentialStore};

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::auth::{self, LoginForm, RegisterRequest, TokenResponse, UserProfile};
use crate::gateway::{GatewayAuthority, GatewayError};

const LOGIN_FAILED: &str = "Login failed";
const REGISTRATION_FAILED: &str = "Registration failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Bootstrap has not looked at persisted storage yet
    Initializing,
    /// A stored credential is being checked against the backend
    Validating,
    Unauthenticated,
    Authenticated,
}

/// Point-in-time view of the session, as published to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub loading: bool,
    /// A credential is held. It may not have a profile yet.
    pub authenticated: bool,
    pub profile: Option<UserProfile>,
}

impl SessionSnapshot {
    pub fn phase(&self) -> SessionPhase {
        match (self.loading, self.authenticated) {
            (true, false) => SessionPhase::Initializing,
            (true, true) => SessionPhase::Validating,
            (false, true) => SessionPhase::Authenticated,
            (false, false) => SessionPhase::Unauthenticated,
        }
    }
}

/// Login or registration failure, worded for the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AuthError {
    message: String,
}

impl AuthError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Use the backend's explanation when it gave one.
    fn from_gateway(err: &GatewayError, fallback: &str) -> Self {
        Self::new(err.detail().unwrap_or(fallback))
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub struct SessionStore {
    authority: GatewayAuthority,
    storage: Box<dyn CredentialStore>,
    credential: Option<Credential>,
    profile: Option<UserProfile>,
    loading: bool,
    bootstrapped: bool,
    updates: watch::Sender<SessionSnapshot>,
}

impl SessionStore {
    pub fn new(authority: GatewayAuthority, storage: Box<dyn CredentialStore>) -> Self {
        let (updates, _) = watch::channel(SessionSnapshot {
            loading: true,
            authenticated: false,
            profile: None,
        });
        Self {
            authority,
            storage,
            credential: None,
            profile: None,
            loading: true,
            bootstrapped: false,
            updates,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.updates.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            loading: self.loading,
            authenticated: self.is_authenticated(),
            profile: self.profile.clone(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.snapshot().phase()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    /// Determine the initial authentication state. Only the first call does
    /// anything.
    pub async fn bootstrap(&mut self) {
        if self.bootstrapped {
            return;
        }
        self.bootstrapped = true;

        let stored = self.storage.load().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read stored credential");
            None
        });

        let Some(credential) = stored else {
            debug!("No stored credential");
            self.loading = false;
            self.publish();
            return;
        };

        if let Err(e) = self.authority.authorize(&credential) {
            debug!(error = %e, "Stored credential unusable, clearing session");
            self.clear();
            self.loading = false;
            self.publish();
            return;
        }

        self.credential = Some(credential);
        self.publish();
        self.load_user().await;
    }

    /// Validate the held credential by fetching the profile. Any failure
    /// invalidates the session. Always ends the loading phase.
    async fn load_user(&mut self) {
        match auth::me(self.authority.gateway()).await {
            Ok(profile) => {
                info!(username = %profile.username, "Session restored");
                self.profile = Some(profile);
            }
            Err(e) => {
                debug!(error = %e, "Stored credential rejected, clearing session");
                self.clear();
            }
        }
        self.loading = false;
        self.publish();
    }

    pub async fn login(&mut self, identifier: &str, secret: &str) -> Result<UserProfile, AuthError> {
        let form = LoginForm {
            username: identifier.trim(),
            password: secret,
        };
        let result = auth::login(self.authority.gateway(), &form).await;
        self.accept(result, LOGIN_FAILED)
    }

    pub async fn register(
        &mut self,
        email: &str,
        username: &str,
        secret: &str,
        full_name: &str,
    ) -> Result<UserProfile, AuthError> {
        let full_name = full_name.trim();
        let request = RegisterRequest {
            email: email.trim(),
            username: username.trim(),
            password: secret,
            full_name: (!full_name.is_empty()).then_some(full_name),
        };
        let result = auth::register(self.authority.gateway(), &request).await;
        self.accept(result, REGISTRATION_FAILED)
    }

    /// Validate the registration form, then register. Nothing is sent if the
    /// form is invalid.
    pub async fn register_form(&mut self, form: &RegistrationForm) -> Result<UserProfile, AuthError> {
        form.validate().map_err(AuthError::new)?;
        self.register(&form.email, &form.username, &form.password, &form.full_name)
            .await
    }

    /// End the session. Safe to call when already logged out.
    pub fn logout(&mut self) {
        let was_authenticated = self.is_authenticated();
        self.clear();
        self.publish();
        if was_authenticated {
            info!("Logged out");
        }
    }

    fn accept(
        &mut self,
        result: Result<TokenResponse, GatewayError>,
        fallback: &str,
    ) -> Result<UserProfile, AuthError> {
        let response = result.map_err(|e| {
            debug!(error = %e, "Authentication request failed");
            AuthError::from_gateway(&e, fallback)
        })?;

        let credential =
            Credential::new(response.access_token).ok_or_else(|| AuthError::new(fallback))?;
        self.authority
            .authorize(&credential)
            .map_err(|_| AuthError::new(fallback))?;

        if let Err(e) = self.storage.save(&credential) {
            warn!(error = %e, "Failed to persist credential, session will not survive a restart");
        }

        info!(username = %response.user.username, "Authenticated");
        self.credential = Some(credential);
        self.profile = Some(response.user.clone());
        // An explicit login settles the session; a later bootstrap must not override it.
        self.bootstrapped = true;
        self.loading = false;
        self.publish();
        Ok(response.user)
    }

    fn clear(&mut self) {
        self.credential = None;
        self.profile = None;
        self.authority.revoke();
        if let Err(e) = self.storage.clear() {
            warn!(error = %e, "Failed to remove stored credential");
        }
    }

    fn publish(&self) {
        let next = self.snapshot();
        self.updates.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}
