//! Lab result interpreter endpoints.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{blank_as_null, null_as_default, Catalog, Gender};
use crate::gateway::{Gateway, GatewayError};
use crate::wizard::severity::LabStatus;

pub const COMMON_LAB_TESTS_PATH: &str = "/api/common-lab-tests";
pub const INTERPRET_LABS_PATH: &str = "/api/interpret-labs";

/// A catalog entry: test name with its conventional unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabTestTemplate {
    pub name: String,
    #[serde(default)]
    pub unit: String,
}

/// A measured value. Numeric readings go over the wire as numbers, anything
/// else ("positive", "<0.5") as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabReading {
    Number(f64),
    Text(String),
}

impl LabReading {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<f64>() {
            Ok(number) if number.is_finite() => LabReading::Number(number),
            _ => LabReading::Text(raw.to_string()),
        }
    }
}

impl fmt::Display for LabReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabReading::Number(number) => write!(f, "{}", number),
            LabReading::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabValuePayload {
    pub test_name: String,
    pub value: LabReading,
    #[serde(serialize_with = "blank_as_null")]
    pub unit: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LabInterpretRequest {
    pub lab_values: Vec<LabValuePayload>,
    pub patient_age: Option<u32>,
    pub patient_gender: Option<Gender>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LabResult {
    pub test_name: String,
    pub value: LabReading,
    #[serde(default)]
    pub unit: String,
    pub status: String,
    #[serde(default)]
    pub reference_range: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub clinical_significance: String,
    #[serde(default)]
    pub recommendation: String,
}

impl LabResult {
    pub fn status(&self) -> LabStatus {
        LabStatus::parse(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LabInterpretResponse {
    #[serde(default)]
    pub overall_assessment: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub priority_concerns: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<LabResult>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recommended_actions: Vec<String>,
}

pub async fn common_lab_tests(gateway: &Gateway) -> Result<Catalog<LabTestTemplate>, GatewayError> {
    gateway.get(COMMON_LAB_TESTS_PATH).await
}

pub async fn interpret_labs(
    gateway: &Gateway,
    request: &LabInterpretRequest,
) -> Result<LabInterpretResponse, GatewayError> {
    gateway.post_json(INTERPRET_LABS_PATH, request).await
}
