use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::draft::DraftQuote;
use crate::domain::request::Port;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Request,
    Containers,
    Haulage,
    Seafreight,
    Services,
    Finalize,
}

impl WizardStep {
    pub const ALL: [WizardStep; 6] = [
        Self::Request,
        Self::Containers,
        Self::Haulage,
        Self::Seafreight,
        Self::Services,
        Self::Finalize,
    ];

    pub fn number(self) -> u8 {
        match self {
            Self::Request => 1,
            Self::Containers => 3,
            Self::Haulage => 4,
            Self::Seafreight => 5,
            Self::Services => 6,
            Self::Finalize => 7,
        }
    }

    /// Wizard numbering skips 2.
    pub fn from_number(number: u8) -> Option<WizardStep> {
        Self::ALL.into_iter().find(|step| step.number() == number)
    }

    pub fn next(self) -> Option<WizardStep> {
        let position = Self::ALL.iter().position(|step| *step == self)?;
        Self::ALL.get(position + 1).copied()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepViolation {
    pub step: WizardStep,
    pub code: String,
    pub message: String,
    pub suggestion: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepValidation {
    pub valid: bool,
    pub violations: Vec<StepViolation>,
}

impl Default for StepValidation {
    fn default() -> Self {
        Self { valid: true, violations: Vec::new() }
    }
}

impl StepValidation {
    fn push(&mut self, step: WizardStep, code: &str, message: String, suggestion: &str) {
        self.valid = false;
        self.violations.push(StepViolation {
            step,
            code: code.to_string(),
            message,
            suggestion: Some(suggestion.to_string()),
        });
    }

    fn extend(&mut self, other: StepValidation) {
        self.valid &= other.valid;
        self.violations.extend(other.violations);
    }

    pub fn codes(&self) -> Vec<&str> {
        self.violations.iter().map(|violation| violation.code.as_str()).collect()
    }
}

pub fn validate_step(draft: &DraftQuote, step: WizardStep) -> StepValidation {
    match step {
        WizardStep::Request => validate_request(draft),
        WizardStep::Containers => validate_containers(draft),
        WizardStep::Haulage => validate_haulage(draft),
        WizardStep::Seafreight => validate_seafreight(draft),
        WizardStep::Services => validate_services(draft),
        WizardStep::Finalize => validate_finalize(draft),
    }
}

pub fn validate_draft(draft: &DraftQuote) -> StepValidation {
    let mut result = StepValidation::default();
    for step in WizardStep::ALL {
        result.extend(validate_step(draft, step));
    }
    result
}

fn validate_request(draft: &DraftQuote) -> StepValidation {
    let step = WizardStep::Request;
    let step1 = &draft.step1;
    let mut result = StepValidation::default();

    if step1.customer.name.trim().is_empty() {
        result.push(
            step,
            "MISSING_CUSTOMER",
            "Request has no customer".to_string(),
            "Pick the customer the quote is for",
        );
    }

    let has_port = |port: &Option<Port>| {
        port.as_ref().is_some_and(|port| !port.port_id.trim().is_empty())
    };
    if !has_port(&step1.departure_port) {
        result.push(
            step,
            "MISSING_DEPARTURE_PORT",
            "Departure port is required".to_string(),
            "Choose the port of loading",
        );
    }
    if !has_port(&step1.destination_port) {
        result.push(
            step,
            "MISSING_DESTINATION_PORT",
            "Destination port is required".to_string(),
            "Choose the port of discharge",
        );
    }

    result
}

fn validate_containers(draft: &DraftQuote) -> StepValidation {
    let step = WizardStep::Containers;
    let mut result = StepValidation::default();

    if draft.containers().is_empty() {
        result.push(
            step,
            "EMPTY_CONTAINER_LIST",
            "Draft must contain at least one container line".to_string(),
            "Add a container type and quantity",
        );
        return result;
    }

    let mut seen_ids: HashSet<&str> = HashSet::new();
    for line in draft.containers() {
        let id = line.id.trim();
        if !seen_ids.insert(id) {
            result.push(
                step,
                "DUPLICATE_CONTAINER_ID",
                format!("Container line id `{id}` appears more than once"),
                "Merge the duplicate lines",
            );
        }

        if line.container_type.is_blank() {
            result.push(
                step,
                "MISSING_CONTAINER_TYPE",
                format!("Container line `{id}` has no container type"),
                "Select a container type such as 20GP or 40HC",
            );
        }

        if line.quantity == 0 {
            result.push(
                step,
                "ZERO_QUANTITY",
                format!("Container line `{id}` has zero quantity"),
                "Use a positive container count",
            );
        }
    }

    result
}

fn validate_haulage(draft: &DraftQuote) -> StepValidation {
    let mut result = StepValidation::default();
    if let Some(selection) = &draft.step4.selection {
        if selection.offer_id.trim().is_empty() {
            result.push(
                WizardStep::Haulage,
                "MISSING_HAULAGE_OFFER",
                "Selected haulage has no offer id".to_string(),
                "Pick a haulage offer or skip the haulage leg",
            );
        }
    }
    result
}

fn validate_seafreight(draft: &DraftQuote) -> StepValidation {
    let step = WizardStep::Seafreight;
    let mut result = StepValidation::default();

    if draft.step5.selections.is_empty() {
        result.push(
            step,
            "NO_SEAFREIGHT_SELECTED",
            "At least one sea-freight offer must be selected".to_string(),
            "Select a carrier offer for the route",
        );
    }

    for (index, offer) in draft.step5.selections.iter().enumerate() {
        if offer.carrier.name.trim().is_empty() {
            result.push(
                step,
                "MISSING_CARRIER",
                format!("Sea-freight offer #{} has no carrier", index + 1),
                "Choose an offer that names its carrier",
            );
        }
    }

    result
}

fn validate_services(draft: &DraftQuote) -> StepValidation {
    let mut result = StepValidation::default();
    for (index, service) in draft.step6.selections.iter().enumerate() {
        if service.service_name.trim().is_empty() {
            result.push(
                WizardStep::Services,
                "MISSING_SERVICE_NAME",
                format!("Service #{} has no name", index + 1),
                "Remove the empty service row",
            );
        }
    }
    result
}

fn validate_finalize(draft: &DraftQuote) -> StepValidation {
    let mut result = StepValidation::default();
    if draft.step7.margin.value < Decimal::ZERO {
        result.push(
            WizardStep::Finalize,
            "NEGATIVE_MARGIN",
            format!("Margin {} is negative", draft.step7.margin.value),
            "Use a margin of zero or more",
        );
    }
    result
}
