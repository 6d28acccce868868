//! Drug interaction checker endpoints.

use serde::{Deserialize, Serialize};

use super::{blank_as_null, null_as_default, Catalog};
use crate::gateway::{Gateway, GatewayError};
use crate::wizard::severity::{InteractionSeverity, OverallRisk};

pub const COMMON_MEDICATIONS_PATH: &str = "/api/common-medications";
pub const CHECK_INTERACTIONS_PATH: &str = "/api/check-interactions";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MedicationEntry {
    pub name: String,
    #[serde(serialize_with = "blank_as_null")]
    pub dosage: String,
    #[serde(serialize_with = "blank_as_null")]
    pub frequency: String,
}

impl MedicationEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dosage: String::new(),
            frequency: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InteractionCheckRequest {
    pub medications: Vec<MedicationEntry>,
    pub include_food_interactions: bool,
    pub include_alcohol_interactions: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Interaction {
    pub drug1: String,
    pub drug2: String,
    pub severity: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub recommendation: String,
}

impl Interaction {
    pub fn severity(&self) -> InteractionSeverity {
        InteractionSeverity::parse(&self.severity)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InteractionCheckResponse {
    pub overall_risk: String,
    #[serde(default)]
    pub general_advice: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub interactions: Vec<Interaction>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub food_warnings: Vec<String>,
    #[serde(default)]
    pub alcohol_warning: Option<String>,
}

impl InteractionCheckResponse {
    pub fn risk(&self) -> OverallRisk {
        OverallRisk::parse(&self.overall_risk)
    }
}

pub async fn common_medications(gateway: &Gateway) -> Result<Catalog<String>, GatewayError> {
    gateway.get(COMMON_MEDICATIONS_PATH).await
}

pub async fn check_interactions(
    gateway: &Gateway,
    request: &InteractionCheckRequest,
) -> Result<InteractionCheckResponse, GatewayError> {
    gateway.post_json(CHECK_INTERACTIONS_PATH, request).await
}
