//! Symptom checker wizard.

use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use tracing::{info, warn};

use super::{clean_name, load_catalog, lock_idle, Selection, WizardError};
use crate::api::symptoms::{
    self, SymptomCheckRequest, SymptomCheckResponse, SymptomEntry, DURATION_RANGE, SEVERITY_RANGE,
};
use crate::api::validation::validate_age;
use crate::api::{Catalog, Gender};
use crate::busy::BusyFlag;
use crate::gateway::Gateway;

const NO_SYMPTOMS: &str = "Please select at least one symptom";
const ANALYZE_FAILED: &str = "Failed to analyze symptoms. Please try again.";

#[derive(Debug, Clone, PartialEq)]
pub enum SymptomStep {
    SelectSymptoms,
    Details,
    Results(SymptomCheckResponse),
}

#[derive(Debug)]
struct State {
    step: SymptomStep,
    selection: Selection<SymptomEntry>,
    age: Option<u32>,
    gender: Option<Gender>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            step: SymptomStep::SelectSymptoms,
            selection: Selection::new(),
            age: None,
            gender: None,
        }
    }
}

impl State {
    fn editable(&self) -> Result<(), WizardError> {
        match self.step {
            SymptomStep::Results(_) => Err(WizardError::InvalidStep),
            _ => Ok(()),
        }
    }

    fn entry(&mut self, name: &str) -> Result<&mut SymptomEntry, WizardError> {
        self.editable()?;
        self.selection
            .get_mut(name)
            .ok_or_else(|| WizardError::Validation(format!("'{}' is not selected", name)))
    }
}

pub struct SymptomChecker {
    gateway: Arc<Gateway>,
    catalog: Catalog<String>,
    state: Mutex<State>,
    busy: BusyFlag,
}

impl SymptomChecker {
    /// Open the wizard, fetching the common-symptom catalog.
    pub async fn mount(gateway: Arc<Gateway>) -> Self {
        let catalog = load_catalog("symptoms", symptoms::common_symptoms(&gateway)).await;
        Self {
            gateway,
            catalog,
            state: Mutex::new(State::default()),
            busy: BusyFlag::new(),
        }
    }

    pub fn catalog(&self) -> &Catalog<String> {
        &self.catalog
    }

    pub fn step(&self) -> SymptomStep {
        self.state.lock().step.clone()
    }

    pub fn selected(&self) -> Vec<SymptomEntry> {
        self.state.lock().selection.entries().to_vec()
    }

    pub fn age(&self) -> Option<u32> {
        self.state.lock().age
    }

    pub fn gender(&self) -> Option<Gender> {
        self.state.lock().gender
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    fn edit(&self) -> Result<MutexGuard<'_, State>, WizardError> {
        lock_idle(&self.state, &self.busy)
    }

    /// Select a symptom with default severity and duration. Returns `false` if
    /// it was already selected or the name is blank.
    pub fn add_symptom(&self, name: &str) -> Result<bool, WizardError> {
        let mut state = self.edit()?;
        state.editable()?;
        Ok(match clean_name(name) {
            Some(name) => state.selection.add(SymptomEntry::new(name)),
            None => false,
        })
    }

    pub fn remove_symptom(&self, name: &str) -> Result<bool, WizardError> {
        let mut state = self.edit()?;
        state.editable()?;
        Ok(state.selection.remove(name).is_some())
    }

    pub fn set_severity(&self, name: &str, severity: u8) -> Result<(), WizardError> {
        if !SEVERITY_RANGE.contains(&severity) {
            return Err(WizardError::Validation(format!(
                "Severity must be between {} and {}",
                SEVERITY_RANGE.start(),
                SEVERITY_RANGE.end()
            )));
        }
        self.edit()?.entry(name)?.severity = severity;
        Ok(())
    }

    pub fn set_duration(&self, name: &str, days: u32) -> Result<(), WizardError> {
        if !DURATION_RANGE.contains(&days) {
            return Err(WizardError::Validation(format!(
                "Duration must be between {} and {} days",
                DURATION_RANGE.start(),
                DURATION_RANGE.end()
            )));
        }
        self.edit()?.entry(name)?.duration_days = days;
        Ok(())
    }

    pub fn set_age(&self, age: Option<u32>) -> Result<(), WizardError> {
        if let Some(age) = age {
            validate_age(age).map_err(WizardError::Validation)?;
        }
        let mut state = self.edit()?;
        state.editable()?;
        state.age = age;
        Ok(())
    }

    pub fn set_gender(&self, gender: Option<Gender>) -> Result<(), WizardError> {
        let mut state = self.edit()?;
        state.editable()?;
        state.gender = gender;
        Ok(())
    }

    /// Move from symptom selection to the details step.
    pub fn next(&self) -> Result<(), WizardError> {
        let mut state = self.edit()?;
        match state.step {
            SymptomStep::SelectSymptoms if state.selection.is_empty() => {
                Err(WizardError::Validation(NO_SYMPTOMS.to_string()))
            }
            SymptomStep::SelectSymptoms => {
                state.step = SymptomStep::Details;
                Ok(())
            }
            _ => Err(WizardError::InvalidStep),
        }
    }

    pub fn back(&self) -> Result<(), WizardError> {
        let mut state = self.edit()?;
        match state.step {
            SymptomStep::Details => {
                state.step = SymptomStep::SelectSymptoms;
                Ok(())
            }
            _ => Err(WizardError::InvalidStep),
        }
    }

    /// Submit the selected symptoms from the details step.
    pub async fn analyze(&self) -> Result<SymptomCheckResponse, WizardError> {
        let _busy = self.busy.try_acquire().ok_or(WizardError::Busy)?;

        let request = {
            let state = self.state.lock();
            if state.step != SymptomStep::Details {
                return Err(WizardError::InvalidStep);
            }
            if state.selection.is_empty() {
                return Err(WizardError::Validation(NO_SYMPTOMS.to_string()));
            }
            SymptomCheckRequest {
                symptoms: state.selection.entries().to_vec(),
                age: state.age,
                gender: state.gender,
                existing_conditions: Vec::new(),
            }
        };

        match symptoms::check_symptoms(&self.gateway, &request).await {
            Ok(response) => {
                info!(
                    urgency = %response.urgency_level,
                    conditions = response.conditions.len(),
                    "Symptom analysis received"
                );
                let mut state = self.state.lock();
                state.selection.clear();
                state.step = SymptomStep::Results(response.clone());
                Ok(response)
            }
            Err(e) => {
                warn!(error = %e, "Symptom analysis failed");
                Err(WizardError::Request {
                    notice: ANALYZE_FAILED,
                    source: e,
                })
            }
        }
    }

    /// Start over with nothing selected.
    pub fn reset(&self) -> Result<(), WizardError> {
        *self.edit()? = State::default();
        Ok(())
    }
}
