//! Wire types and typed calls for the MediAI REST endpoints.
//!
//! Each submodule owns one endpoint family: the request/response shapes the
//! backend expects and thin async functions that issue the call through the
//! shared [`Gateway`](crate::gateway::Gateway).

pub mod auth;
pub mod chat;
pub mod drugs;
pub mod health;
pub mod labs;
pub mod symptoms;
pub mod validation;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Reference data returned by the `common-*` endpoints, grouped by category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Catalog<T> {
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<T>>,
}

impl<T> Default for Catalog<T> {
    fn default() -> Self {
        Self {
            categories: BTreeMap::new(),
        }
    }
}

impl<T> Catalog<T> {
    pub fn is_empty(&self) -> bool {
        self.categories.values().all(Vec::is_empty)
    }

    pub fn len(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    /// Entries in category order, each paired with its category name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.categories
            .iter()
            .flat_map(|(category, items)| items.iter().map(move |item| (category.as_str(), item)))
    }
}

/// Patient gender as accepted by the analysis endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            other => Err(format!(
                "Invalid gender '{}'. Must be one of: male, female, other",
                other
            )),
        }
    }
}

/// Serialize a blank string as JSON `null`.
pub(crate) fn blank_as_null<S: Serializer>(value: &str, serializer: S) -> Result<S::Ok, S::Error> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        serializer.serialize_none()
    } else {
        serializer.serialize_some(trimmed)
    }
}

/// Deserialize an explicit `null` as the type's default.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
