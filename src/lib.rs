pub mod api;
pub mod busy;
pub mod chat;
pub mod cli;
pub mod config;
pub mod gateway;
pub mod router;
pub mod session;
pub mod wizard;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use config::Config;
use gateway::{Gateway, GatewayError};
use router::{View, ViewRouter};
use session::{CredentialStore, FileCredentialStore, SessionStore};

/// Everything a front end needs, built once at process start.
pub struct AppContext {
    pub config: Config,
    pub gateway: Arc<Gateway>,
    pub session: SessionStore,
    pub router: ViewRouter,
}

impl AppContext {
    /// Build the context with the credential persisted under the configured
    /// data directory.
    pub fn new(config: Config) -> Result<Self, GatewayError> {
        let storage = FileCredentialStore::new(config.storage.credential_path());
        Self::with_storage(config, Box::new(storage))
    }

    pub fn with_storage(
        config: Config,
        storage: Box<dyn CredentialStore>,
    ) -> Result<Self, GatewayError> {
        let (gateway, authority) = Gateway::new(&config.api)?;
        Ok(Self {
            session: SessionStore::new(authority, storage),
            router: ViewRouter::new(),
            gateway,
            config,
        })
    }

    /// Build the context and run the bootstrap sequence.
    pub async fn start(config: Config) -> Result<Self, GatewayError> {
        let mut context = Self::new(config)?;
        context.session.bootstrap().await;
        Ok(context)
    }

    pub fn view(&self) -> View {
        self.router.route(&self.session.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::Screen;
    use crate::session::{Credential, MemoryCredentialStore};
    use axum::{http::StatusCode, routing::get, Json, Router};
    use serde_json::json;

    fn config_for(base_url: &str) -> Config {
        let mut config = Config::default();
        config.api.base_url = base_url.to_string();
        config.api.timeout_secs = Some(5);
        config
    }

    #[tokio::test]
    async fn test_restored_session_reaches_main_view() {
        let backend = testing::spawn(Router::new().route(
            "/api/auth/me",
            get(|| async { Json(json!({"id": "u1", "username": "a"})) }),
        ))
        .await;
        let storage = MemoryCredentialStore::with_credential(Credential::new("t1").unwrap());

        let mut context =
            AppContext::with_storage(config_for(&backend.base_url), Box::new(storage)).unwrap();
        assert_eq!(context.view(), View::Loading);

        context.session.bootstrap().await;
        assert_eq!(context.view(), View::Main(Screen::Chat));
        assert!(context.gateway.is_authorized());
    }

    #[tokio::test]
    async fn test_rejected_session_shows_login() {
        let backend = testing::spawn(Router::new().route(
            "/api/auth/me",
            get(|| async { StatusCode::UNAUTHORIZED }),
        ))
        .await;
        let storage = MemoryCredentialStore::with_credential(Credential::new("old").unwrap());

        let mut context =
            AppContext::with_storage(config_for(&backend.base_url), Box::new(storage.clone()))
                .unwrap();
        context.router.open(Screen::DrugChecker);
        context.session.bootstrap().await;

        assert_eq!(context.view(), View::Login);
        assert_eq!(storage.current(), None);
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let result = AppContext::with_storage(
            config_for("ftp://example.com"),
            Box::new(MemoryCredentialStore::new()),
        );
        assert!(matches!(result, Err(GatewayError::InvalidBaseUrl { .. })));
    }
}
