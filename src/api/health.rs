//! Service health probe.

use serde::Deserialize;

use crate::gateway::{Gateway, GatewayError};

pub const HEALTH_PATH: &str = "/health";

#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

pub async fn check(gateway: &Gateway) -> Result<HealthStatus, GatewayError> {
    gateway.get(HEALTH_PATH).await
}
