//! Guided data-collection wizards: symptom checker, drug interaction checker
//! and lab interpreter.
//!
//! Every wizard follows the same contract. The reference catalog is fetched
//! once at mount, entries are collected locally, minimum input is validated
//! before anything is sent, at most one submit is in flight, and a failed
//! submit leaves the input untouched for a retry.

pub mod drug;
pub mod lab;
pub mod severity;
pub mod symptom;

pub use drug::{DrugChecker, DrugStep};
pub use lab::{LabInterpreter, LabRow, LabStep};
pub use symptom::{SymptomChecker, SymptomStep};

use parking_lot::{Mutex, MutexGuard};
use std::future::Future;
use thiserror::Error;
use tracing::warn;

use crate::api::drugs::MedicationEntry;
use crate::api::symptoms::SymptomEntry;
use crate::api::Catalog;
use crate::busy::BusyFlag;
use crate::gateway::GatewayError;

#[derive(Debug, Error)]
pub enum WizardError {
    /// Input rejected before any request was issued
    #[error("{0}")]
    Validation(String),

    #[error("A request is already in progress")]
    Busy,

    #[error("Not available at this step")]
    InvalidStep,

    #[error("{notice}")]
    Request {
        notice: &'static str,
        #[source]
        source: GatewayError,
    },
}

/// Entries identified by a user-visible name.
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for SymptomEntry {
    fn key(&self) -> &str {
        &self.name
    }
}

impl Keyed for MedicationEntry {
    fn key(&self) -> &str {
        &self.name
    }
}

/// Ordered collection with at most one entry per name.
#[derive(Debug, Clone)]
pub struct Selection<E> {
    entries: Vec<E>,
}

impl<E> Default for Selection<E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<E: Keyed> Selection<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `entry` unless its name is already selected.
    pub fn add(&mut self, entry: E) -> bool {
        if self.contains(entry.key()) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Remove the entry named `key`, keeping the order of the rest. Names are
    /// compared exactly, never as patterns.
    pub fn remove(&mut self, key: &str) -> Option<E> {
        let index = self.entries.iter().position(|e| e.key() == key)?;
        Some(self.entries.remove(index))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|e| e.key() == key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut E> {
        self.entries.iter_mut().find(|e| e.key() == key)
    }

    pub fn entries(&self) -> &[E] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Fetch a reference catalog. A failure is logged and leaves the catalog empty;
/// the wizard stays usable with custom entries.
async fn load_catalog<T, F>(name: &str, fetch: F) -> Catalog<T>
where
    F: Future<Output = Result<Catalog<T>, GatewayError>>,
{
    match fetch.await {
        Ok(catalog) => catalog,
        Err(e) => {
            warn!(catalog = name, error = %e, "Failed to load catalog");
            Catalog::default()
        }
    }
}

/// Lock wizard state for editing. Input is frozen while a submit is in
/// flight, so the response never discards edits made after the request left.
fn lock_idle<'a, S>(
    state: &'a Mutex<S>,
    busy: &BusyFlag,
) -> Result<MutexGuard<'a, S>, WizardError> {
    let guard = state.lock();
    if busy.is_busy() {
        return Err(WizardError::Busy);
    }
    Ok(guard)
}

/// Trim a user-typed name. `None` when nothing is left.
fn clean_name(name: &str) -> Option<&str> {
    let name = name.trim();
    (!name.is_empty()).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(selection: &Selection<SymptomEntry>) -> Vec<&str> {
        selection.entries().iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_add_rejects_duplicates() {
        let mut selection = Selection::new();
        assert!(selection.add(SymptomEntry::new("Fever")));
        assert!(!selection.add(SymptomEntry::new("Fever")));
        assert!(selection.add(SymptomEntry::new("fever")));
        assert_eq!(selection.len(), 2);
    }

    #[test]
    fn test_remove_with_special_characters() {
        let mut selection = Selection::new();
        for name in ["Cough", "Pain (.*) [left]", "Pain", "Nausea & vomiting", "Pain (.*)"] {
            selection.add(SymptomEntry::new(name));
        }

        let removed = selection.remove("Pain (.*) [left]").unwrap();
        assert_eq!(removed.name, "Pain (.*) [left]");
        assert_eq!(
            names(&selection),
            vec!["Cough", "Pain", "Nausea & vomiting", "Pain (.*)"]
        );

        assert!(selection.remove("Pain (.*) [left]").is_none());
        assert!(selection.remove(".*").is_none());
        assert_eq!(selection.len(), 4);
    }

    #[test]
    fn test_get_mut_and_clear() {
        let mut selection = Selection::new();
        selection.add(SymptomEntry::new("Headache"));
        selection.get_mut("Headache").unwrap().severity = 8;
        assert_eq!(selection.entries()[0].severity, 8);
        assert!(selection.get_mut("Migraine").is_none());

        selection.clear();
        assert!(selection.is_empty());
    }

    #[test]
    fn test_lock_idle_rejects_while_busy() {
        let state = Mutex::new(0u32);
        let busy = BusyFlag::new();

        *lock_idle(&state, &busy).unwrap() += 1;
        let guard = busy.try_acquire().unwrap();
        assert!(matches!(lock_idle(&state, &busy), Err(WizardError::Busy)));
        drop(guard);
        assert_eq!(*lock_idle(&state, &busy).unwrap(), 1);
    }

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name("  Aspirin "), Some("Aspirin"));
        assert_eq!(clean_name("   "), None);
    }

    #[tokio::test]
    async fn test_catalog_failure_is_empty() {
        let catalog = load_catalog("symptoms", async {
            Err::<Catalog<String>, _>(GatewayError::InvalidCredential)
        })
        .await;
        assert!(catalog.is_empty());
    }
}
