//! Lab result interpreter wizard.
//!
//! Rows are addressed by position because custom rows start without a name.

use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use tracing::{info, warn};

use super::{load_catalog, lock_idle, WizardError};
use crate::api::labs::{
    self, LabInterpretRequest, LabInterpretResponse, LabReading, LabTestTemplate, LabValuePayload,
};
use crate::api::validation::validate_age;
use crate::api::{Catalog, Gender};
use crate::busy::BusyFlag;
use crate::gateway::Gateway;

const NO_VALUES: &str = "Please add at least one lab value";
const INTERPRET_FAILED: &str = "Failed to interpret labs. Please try again.";

/// One editable row as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabRow {
    pub test_name: String,
    pub value: String,
    pub unit: String,
}

impl LabRow {
    /// Rows missing a name or a value are left out of the request.
    fn payload(&self) -> Option<LabValuePayload> {
        let test_name = self.test_name.trim();
        let value = self.value.trim();
        if test_name.is_empty() || value.is_empty() {
            return None;
        }
        Some(LabValuePayload {
            test_name: test_name.to_string(),
            value: LabReading::parse(value),
            unit: self.unit.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LabStep {
    Input,
    Results(LabInterpretResponse),
}

#[derive(Debug)]
struct State {
    step: LabStep,
    rows: Vec<LabRow>,
    age: Option<u32>,
    gender: Option<Gender>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            step: LabStep::Input,
            rows: Vec::new(),
            age: None,
            gender: None,
        }
    }
}

impl State {
    fn editable(&mut self) -> Result<&mut Self, WizardError> {
        match self.step {
            LabStep::Input => Ok(self),
            LabStep::Results(_) => Err(WizardError::InvalidStep),
        }
    }

    fn row(&mut self, index: usize) -> Result<&mut LabRow, WizardError> {
        self.editable()?
            .rows
            .get_mut(index)
            .ok_or_else(|| WizardError::Validation(format!("No lab value at row {}", index + 1)))
    }
}

pub struct LabInterpreter {
    gateway: Arc<Gateway>,
    catalog: Catalog<LabTestTemplate>,
    state: Mutex<State>,
    busy: BusyFlag,
}

impl LabInterpreter {
    pub async fn mount(gateway: Arc<Gateway>) -> Self {
        let catalog = load_catalog("lab tests", labs::common_lab_tests(&gateway)).await;
        Self {
            gateway,
            catalog,
            state: Mutex::new(State::default()),
            busy: BusyFlag::new(),
        }
    }

    pub fn catalog(&self) -> &Catalog<LabTestTemplate> {
        &self.catalog
    }

    /// Conventional unit for a catalog test, matched case-insensitively.
    pub fn unit_for(&self, test_name: &str) -> Option<&str> {
        let test_name = test_name.trim();
        self.catalog
            .iter()
            .find(|(_, template)| template.name.eq_ignore_ascii_case(test_name))
            .map(|(_, template)| template.unit.as_str())
    }

    pub fn step(&self) -> LabStep {
        self.state.lock().step.clone()
    }

    pub fn rows(&self) -> Vec<LabRow> {
        self.state.lock().rows.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    fn edit(&self) -> Result<MutexGuard<'_, State>, WizardError> {
        lock_idle(&self.state, &self.busy)
    }

    /// Add a row for a named test. Returns `false` if that test already has a
    /// row.
    pub fn add_test(&self, test_name: &str, unit: &str) -> Result<bool, WizardError> {
        let mut state = self.edit()?;
        let state = state.editable()?;
        let test_name = test_name.trim();
        if test_name.is_empty() || state.rows.iter().any(|row| row.test_name == test_name) {
            return Ok(false);
        }
        state.rows.push(LabRow {
            test_name: test_name.to_string(),
            value: String::new(),
            unit: unit.trim().to_string(),
        });
        Ok(true)
    }

    /// Add an empty row. Returns its index.
    pub fn add_custom(&self) -> Result<usize, WizardError> {
        let mut state = self.edit()?;
        let state = state.editable()?;
        state.rows.push(LabRow::default());
        Ok(state.rows.len() - 1)
    }

    pub fn remove_row(&self, index: usize) -> Result<LabRow, WizardError> {
        let mut state = self.edit()?;
        state.row(index)?;
        Ok(state.rows.remove(index))
    }

    pub fn set_test_name(&self, index: usize, test_name: &str) -> Result<(), WizardError> {
        self.edit()?.row(index)?.test_name = test_name.to_string();
        Ok(())
    }

    pub fn set_value(&self, index: usize, value: &str) -> Result<(), WizardError> {
        self.edit()?.row(index)?.value = value.to_string();
        Ok(())
    }

    pub fn set_unit(&self, index: usize, unit: &str) -> Result<(), WizardError> {
        self.edit()?.row(index)?.unit = unit.to_string();
        Ok(())
    }

    pub fn set_age(&self, age: Option<u32>) -> Result<(), WizardError> {
        if let Some(age) = age {
            validate_age(age).map_err(WizardError::Validation)?;
        }
        self.edit()?.editable()?.age = age;
        Ok(())
    }

    pub fn set_gender(&self, gender: Option<Gender>) -> Result<(), WizardError> {
        self.edit()?.editable()?.gender = gender;
        Ok(())
    }

    pub async fn interpret(&self) -> Result<LabInterpretResponse, WizardError> {
        let _busy = self.busy.try_acquire().ok_or(WizardError::Busy)?;

        let request = {
            let mut guard = self.state.lock();
            let state = guard.editable()?;
            let lab_values: Vec<_> = state.rows.iter().filter_map(LabRow::payload).collect();
            if lab_values.is_empty() {
                return Err(WizardError::Validation(NO_VALUES.to_string()));
            }
            LabInterpretRequest {
                lab_values,
                patient_age: state.age,
                patient_gender: state.gender,
            }
        };

        match labs::interpret_labs(&self.gateway, &request).await {
            Ok(response) => {
                info!(
                    values = request.lab_values.len(),
                    concerns = response.priority_concerns.len(),
                    "Lab interpretation received"
                );
                let mut state = self.state.lock();
                state.rows.clear();
                state.step = LabStep::Results(response.clone());
                Ok(response)
            }
            Err(e) => {
                warn!(error = %e, "Lab interpretation failed");
                Err(WizardError::Request {
                    notice: INTERPRET_FAILED,
                    source: e,
                })
            }
        }
    }

    pub fn reset(&self) -> Result<(), WizardError> {
        *self.edit()? = State::default();
        Ok(())
    }
}
