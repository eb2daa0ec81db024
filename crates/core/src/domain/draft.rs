use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::container::{total_teu, ContainerLine, Step3};
use crate::domain::finalize::Step7;
use crate::domain::haulage::Step4;
use crate::domain::request::{RequestId, Step1};
use crate::domain::seafreight::Step5;
use crate::domain::services::Step6;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DraftId(pub String);

/// In-progress quotation assembled step by step by the request wizard.
///
/// Each `stepN` record has exactly one writer: the matching [`StepUpdate`]
/// variant. `total_teu` is derived from `step3` and is never set directly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftQuote {
    #[serde(default)]
    pub id: Option<DraftId>,
    pub request_id: RequestId,
    #[serde(default)]
    pub step1: Step1,
    #[serde(default)]
    pub step3: Step3,
    #[serde(default)]
    pub step4: Step4,
    #[serde(default)]
    pub step5: Step5,
    #[serde(default)]
    pub step6: Step6,
    #[serde(default)]
    pub step7: Step7,
    #[serde(rename = "totalTEU", default)]
    pub total_teu: Decimal,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepUpdate {
    Request(Step1),
    Containers(Step3),
    Haulage(Step4),
    Seafreight(Step5),
    Services(Step6),
    Finalize(Step7),
}

impl StepUpdate {
    pub fn step_number(&self) -> u8 {
        match self {
            Self::Request(_) => 1,
            Self::Containers(_) => 3,
            Self::Haulage(_) => 4,
            Self::Seafreight(_) => 5,
            Self::Services(_) => 6,
            Self::Finalize(_) => 7,
        }
    }
}

impl DraftQuote {
    pub fn new(request_id: RequestId) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            request_id,
            step1: Step1::default(),
            step3: Step3::default(),
            step4: Step4::default(),
            step5: Step5::default(),
            step6: Step6::default(),
            step7: Step7::default(),
            total_teu: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }

    pub fn containers(&self) -> &[ContainerLine] {
        &self.step3.containers
    }

    /// Returns a copy of the draft with one step replaced.
    pub fn apply(&self, update: StepUpdate) -> DraftQuote {
        let mut next = self.clone();
        match update {
            StepUpdate::Request(step1) => next.step1 = step1,
            StepUpdate::Containers(step3) => {
                next.total_teu = total_teu(&step3.containers);
                next.step3 = step3;
            }
            StepUpdate::Haulage(step4) => next.step4 = step4,
            StepUpdate::Seafreight(step5) => next.step5 = step5,
            StepUpdate::Services(step6) => next.step6 = step6,
            StepUpdate::Finalize(step7) => next.step7 = step7,
        }
        next.updated_at = Utc::now();
        next
    }

    /// Recomputes derived fields after the draft was read from outside.
    pub fn normalized(mut self) -> Self {
        self.total_teu = total_teu(&self.step3.containers);
        self
    }
}
