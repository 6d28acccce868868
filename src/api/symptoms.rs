//! Symptom checker endpoints.

use serde::{Deserialize, Serialize};

use super::{null_as_default, Catalog, Gender};
use crate::gateway::{Gateway, GatewayError};
use crate::wizard::severity::Urgency;

pub const COMMON_SYMPTOMS_PATH: &str = "/api/common-symptoms";
pub const CHECK_SYMPTOMS_PATH: &str = "/api/check-symptoms";

/// Severity slider range.
pub const SEVERITY_RANGE: std::ops::RangeInclusive<u8> = 1..=10;
/// Duration slider range, in days.
pub const DURATION_RANGE: std::ops::RangeInclusive<u32> = 1..=30;

pub const DEFAULT_SEVERITY: u8 = 5;
pub const DEFAULT_DURATION_DAYS: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymptomEntry {
    pub name: String,
    pub severity: u8,
    pub duration_days: u32,
}

impl SymptomEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            severity: DEFAULT_SEVERITY,
            duration_days: DEFAULT_DURATION_DAYS,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SymptomCheckRequest {
    pub symptoms: Vec<SymptomEntry>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub existing_conditions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PossibleCondition {
    pub name: String,
    #[serde(default)]
    pub probability: f64,
    #[serde(default)]
    pub description: String,
}

impl PossibleCondition {
    /// Probability as a whole percentage, clamped to 0..=100.
    pub fn likelihood_percent(&self) -> u32 {
        (self.probability.clamp(0.0, 1.0) * 100.0).round() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SymptomCheckResponse {
    pub urgency_level: String,
    #[serde(default)]
    pub emergency: bool,
    #[serde(default)]
    pub recommendation: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub conditions: Vec<PossibleCondition>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub next_steps: Vec<String>,
}

impl SymptomCheckResponse {
    pub fn urgency(&self) -> Urgency {
        Urgency::parse(&self.urgency_level)
    }
}

pub async fn common_symptoms(gateway: &Gateway) -> Result<Catalog<String>, GatewayError> {
    gateway.get(COMMON_SYMPTOMS_PATH).await
}

pub async fn check_symptoms(
    gateway: &Gateway,
    request: &SymptomCheckRequest,
) -> Result<SymptomCheckResponse, GatewayError> {
    gateway.post_json(CHECK_SYMPTOMS_PATH, request).await
}
