//! Drug interaction checker wizard.

use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use tracing::{info, warn};

use super::{clean_name, load_catalog, lock_idle, Selection, WizardError};
use crate::api::drugs::{self, InteractionCheckRequest, InteractionCheckResponse, MedicationEntry};
use crate::api::Catalog;
use crate::busy::BusyFlag;
use crate::gateway::Gateway;

/// Interactions need at least a pair.
pub const MIN_MEDICATIONS: usize = 2;

const TOO_FEW: &str = "Please select at least 2 medications to check interactions";
const CHECK_FAILED: &str = "Failed to check interactions. Please try again.";

#[derive(Debug, Clone, PartialEq)]
pub enum DrugStep {
    Input,
    Results(InteractionCheckResponse),
}

#[derive(Debug)]
struct State {
    step: DrugStep,
    selection: Selection<MedicationEntry>,
    include_food: bool,
    include_alcohol: bool,
}

impl Default for State {
    fn default() -> Self {
        Self {
            step: DrugStep::Input,
            selection: Selection::new(),
            include_food: true,
            include_alcohol: true,
        }
    }
}

impl State {
    fn editable(&mut self) -> Result<&mut Self, WizardError> {
        match self.step {
            DrugStep::Input => Ok(self),
            DrugStep::Results(_) => Err(WizardError::InvalidStep),
        }
    }

    fn entry(&mut self, name: &str) -> Result<&mut MedicationEntry, WizardError> {
        self.editable()?
            .selection
            .get_mut(name)
            .ok_or_else(|| WizardError::Validation(format!("'{}' is not selected", name)))
    }
}

pub struct DrugChecker {
    gateway: Arc<Gateway>,
    catalog: Catalog<String>,
    state: Mutex<State>,
    busy: BusyFlag,
}

impl DrugChecker {
    pub async fn mount(gateway: Arc<Gateway>) -> Self {
        let catalog = load_catalog("medications", drugs::common_medications(&gateway)).await;
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

    pub fn step(&self) -> DrugStep {
        self.state.lock().step.clone()
    }

    pub fn selected(&self) -> Vec<MedicationEntry> {
        self.state.lock().selection.entries().to_vec()
    }

    pub fn include_food(&self) -> bool {
        self.state.lock().include_food
    }

    pub fn include_alcohol(&self) -> bool {
        self.state.lock().include_alcohol
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    fn edit(&self) -> Result<MutexGuard<'_, State>, WizardError> {
        lock_idle(&self.state, &self.busy)
    }

    pub fn add_medication(&self, name: &str) -> Result<bool, WizardError> {
        let mut state = self.edit()?;
        let state = state.editable()?;
        Ok(match clean_name(name) {
            Some(name) => state.selection.add(MedicationEntry::new(name)),
            None => false,
        })
    }

    pub fn remove_medication(&self, name: &str) -> Result<bool, WizardError> {
        let mut state = self.edit()?;
        Ok(state.editable()?.selection.remove(name).is_some())
    }

    pub fn set_dosage(&self, name: &str, dosage: &str) -> Result<(), WizardError> {
        self.edit()?.entry(name)?.dosage = dosage.to_string();
        Ok(())
    }

    pub fn set_frequency(&self, name: &str, frequency: &str) -> Result<(), WizardError> {
        self.edit()?.entry(name)?.frequency = frequency.to_string();
        Ok(())
    }

    pub fn set_include_food(&self, include: bool) -> Result<(), WizardError> {
        self.edit()?.editable()?.include_food = include;
        Ok(())
    }

    pub fn set_include_alcohol(&self, include: bool) -> Result<(), WizardError> {
        self.edit()?.editable()?.include_alcohol = include;
        Ok(())
    }

    pub async fn check(&self) -> Result<InteractionCheckResponse, WizardError> {
        let _busy = self.busy.try_acquire().ok_or(WizardError::Busy)?;

        let request = {
            let mut guard = self.state.lock();
            let state = guard.editable()?;
            if state.selection.len() < MIN_MEDICATIONS {
                return Err(WizardError::Validation(TOO_FEW.to_string()));
            }
            InteractionCheckRequest {
                medications: state.selection.entries().to_vec(),
                include_food_interactions: state.include_food,
                include_alcohol_interactions: state.include_alcohol,
            }
        };

        match drugs::check_interactions(&self.gateway, &request).await {
            Ok(response) => {
                info!(
                    risk = %response.overall_risk,
                    interactions = response.interactions.len(),
                    "Interaction check received"
                );
                let mut state = self.state.lock();
                state.selection.clear();
                state.step = DrugStep::Results(response.clone());
                Ok(response)
            }
            Err(e) => {
                warn!(error = %e, "Interaction check failed");
                Err(WizardError::Request {
                    notice: CHECK_FAILED,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, MockBackend};
    use axum::{
        http::StatusCode,
        response::IntoResponse,
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};

    async fn drug_backend(bodies: Arc<Mutex<Vec<Value>>>) -> MockBackend {
        let router = Router::new()
            .route(
                "/api/common-medications",
                get(|| async {
                    Json(json!({
                        "categories": {
                            "Pain Relief": ["Aspirin", "Ibuprofen"],
                            "Blood Thinners": ["Warfarin"]
                        }
                    }))
                }),
            )
            .route(
                "/api/check-interactions",
                post(move |Json(body): Json<Value>| {
                    let bodies = bodies.clone();
                    async move {
                        bodies.lock().push(body.clone());
                        if body["medications"][0]["name"] == "Broken" {
                            return (
                                StatusCode::SERVICE_UNAVAILABLE,
                                Json(json!({"detail": "Model unavailable"})),
                            )
                                .into_response();
                        }
                        Json(json!({
                            "overall_risk": "dangerous",
                            "general_advice": "Avoid combining",
                            "interactions": [{
                                "drug1": "Aspirin",
                                "drug2": "Warfarin",
                                "severity": "major",
                                "description": "Bleeding risk",
                                "recommendation": "Consult your doctor"
                            }],
                            "food_warnings": [],
                            "alcohol_warning": null
                        }))
                        .into_response()
                    }
                }),
            );
        testing::spawn(router).await
    }

    async fn mounted(backend: &MockBackend) -> DrugChecker {
        let (gateway, _authority) = testing::gateway_for(backend);
        DrugChecker::mount(gateway).await
    }

    #[tokio::test]
    async fn test_defaults() {
        let backend = drug_backend(Arc::default()).await;
        let wizard = mounted(&backend).await;

        assert_eq!(wizard.catalog().len(), 3);
        assert_eq!(wizard.step(), DrugStep::Input);
        assert!(wizard.include_food());
        assert!(wizard.include_alcohol());
    }

    #[tokio::test]
    async fn test_fewer_than_two_never_sends() {
        let backend = drug_backend(Arc::default()).await;
        let wizard = mounted(&backend).await;

        let err = wizard.check().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Please select at least 2 medications to check interactions"
        );

        wizard.add_medication("Aspirin").unwrap();
        assert!(!wizard.add_medication("Aspirin").unwrap());
        assert!(matches!(
            wizard.check().await,
            Err(WizardError::Validation(_))
        ));

        assert_eq!(backend.log.count("/api/check-interactions"), 0);
        assert!(!wizard.is_busy());
    }

    #[tokio::test]
    async fn test_check_success() {
        let bodies = Arc::new(Mutex::new(Vec::new()));
        let backend = drug_backend(bodies.clone()).await;
        let wizard = mounted(&backend).await;

        wizard.add_medication("Aspirin").unwrap();
        wizard.add_medication("Warfarin").unwrap();
        wizard.set_dosage("Aspirin", "81mg").unwrap();
        wizard.set_frequency("Aspirin", "daily").unwrap();
        wizard.set_include_alcohol(false).unwrap();

        let response = wizard.check().await.unwrap();
        assert_eq!(response.interactions.len(), 1);
        assert_eq!(response.alcohol_warning, None);

        assert_eq!(
            bodies.lock()[0],
            json!({
                "medications": [
                    {"name": "Aspirin", "dosage": "81mg", "frequency": "daily"},
                    {"name": "Warfarin", "dosage": null, "frequency": null}
                ],
                "include_food_interactions": true,
                "include_alcohol_interactions": false
            })
        );
        assert!(matches!(wizard.step(), DrugStep::Results(_)));
        assert!(wizard.selected().is_empty());
        assert!(matches!(
            wizard.set_include_food(false),
            Err(WizardError::InvalidStep)
        ));

        wizard.reset().unwrap();
        assert_eq!(wizard.step(), DrugStep::Input);
        assert!(wizard.include_alcohol());
    }

    #[tokio::test]
    async fn test_check_failure_keeps_input() {
        let backend = drug_backend(Arc::default()).await;
        let wizard = mounted(&backend).await;

        wizard.add_medication("Broken").unwrap();
        wizard.add_medication("Aspirin").unwrap();
        wizard.set_dosage("Aspirin", "81mg").unwrap();

        let err = wizard.check().await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to check interactions. Please try again.");
        match err {
            WizardError::Request { source, .. } => {
                assert_eq!(source.detail(), Some("Model unavailable"));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        assert_eq!(wizard.step(), DrugStep::Input);
        let selected = wizard.selected();
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[1].dosage, "81mg");
    }

    #[tokio::test]
    async fn test_input_frozen_while_checking() {
        let backend = drug_backend(Arc::default()).await;
        let wizard = mounted(&backend).await;
        wizard.add_medication("Aspirin").unwrap();
        wizard.add_medication("Warfarin").unwrap();

        let (response, (reset, added)) = tokio::join!(wizard.check(), async {
            (wizard.reset(), wizard.add_medication("Ibuprofen"))
        });

        assert!(matches!(reset, Err(WizardError::Busy)));
        assert!(matches!(added, Err(WizardError::Busy)));
        let response = response.unwrap();
        assert_eq!(wizard.step(), DrugStep::Results(response));
        assert!(wizard.selected().is_empty());

        wizard.reset().unwrap();
        assert!(wizard.add_medication("Ibuprofen").unwrap());
    }

    #[tokio::test]
    async fn test_remove_unknown_and_edit_unknown() {
        let backend = drug_backend(Arc::default()).await;
        let wizard = mounted(&backend).await;

        assert!(!wizard.remove_medication("Aspirin").unwrap());
        assert!(matches!(
            wizard.set_dosage("Aspirin", "81mg"),
            Err(WizardError::Validation(_))
        ));
    }
}
