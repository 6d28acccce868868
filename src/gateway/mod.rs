//! Authorized request gateway.
//!
//! Every outbound request goes through one shared [`Gateway`]. It knows the
//! backend base address and the current bearer credential; screens never set
//! authorization headers themselves. The credential can only be changed through
//! the [`GatewayAuthority`] handed out once at construction, which the session
//! store owns.

mod error;

pub use error::{extract_detail, GatewayError};

use parking_lot::RwLock;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::ApiConfig;
use crate::session::Credential;

pub struct Gateway {
    http: reqwest::Client,
    base_url: String,
    authorization: RwLock<Option<HeaderValue>>,
}

impl Gateway {
    /// Create the shared gateway and the single handle allowed to set its credential.
    pub fn new(config: &ApiConfig) -> Result<(Arc<Self>, GatewayAuthority), GatewayError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        let parsed = Url::parse(&base_url).map_err(|e| GatewayError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(GatewayError::InvalidBaseUrl {
                url: config.base_url.clone(),
                reason: "scheme must be http or https".to_string(),
            });
        }

        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("mediai/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().map_err(GatewayError::Client)?;

        let gateway = Arc::new(Self {
            http,
            base_url,
            authorization: RwLock::new(None),
        });
        let authority = GatewayAuthority {
            gateway: Arc::clone(&gateway),
        };
        Ok((gateway, authority))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether requests currently carry a bearer credential.
    pub fn is_authorized(&self) -> bool {
        self.authorization.read().is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        self.send(self.http.get(self.url(path)), path).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, GatewayError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.http.post(self.url(path)).json(body), path)
            .await
    }

    /// POST an `application/x-www-form-urlencoded` body.
    pub async fn post_form<B, T>(&self, path: &str, form: &B) -> Result<T, GatewayError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.http.post(self.url(path)).form(form), path)
            .await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        path: &str,
    ) -> Result<T, GatewayError> {
        let authorization = self.authorization.read().clone();
        let request = match authorization {
            Some(value) => request.header(AUTHORIZATION, value),
            None => request,
        };

        let response = request.send().await.map_err(GatewayError::Transport)?;
        let status = response.status();
        debug!(path, status = status.as_u16(), "API response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::from_response(status, &body));
        }

        response.json().await.map_err(GatewayError::Decode)
    }
}

/// Write access to the gateway's bearer credential. Not `Clone`: there is
/// exactly one per gateway.
pub struct GatewayAuthority {
    gateway: Arc<Gateway>,
}

impl GatewayAuthority {
    /// Attach `credential` to every subsequent request.
    pub fn authorize(&self, credential: &Credential) -> Result<(), GatewayError> {
        let mut value = HeaderValue::from_str(&credential.bearer())
            .map_err(|_| GatewayError::InvalidCredential)?;
        value.set_sensitive(true);
        *self.gateway.authorization.write() = Some(value);
        Ok(())
    }

    /// Stop attaching a credential. Safe to call when none is set.
    pub fn revoke(&self) {
        *self.gateway.authorization.write() = None;
    }

    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.gateway
    }
}
