use std::collections::BTreeMap;

use chrono::Utc;
use rust_decimal::Decimal;

use crate::domain::draft::{DraftQuote, StepUpdate};
use crate::domain::finalize::{Margin, OptionId, QuoteOption};
use crate::errors::DomainError;
use crate::pricing::{DraftPricer, PriceBreakdown, PricingInput};
use crate::wizard::validate_draft;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionRequest {
    pub name: String,
    pub description: Option<String>,
    pub margin: Margin,
    pub container_quantities: BTreeMap<String, u32>,
}

impl OptionRequest {
    pub fn new(name: impl Into<String>, margin: Margin) -> Self {
        Self {
            name: name.into(),
            description: None,
            margin,
            container_quantities: BTreeMap::new(),
        }
    }
}

fn ensure_margin(margin: &Margin) -> Result<(), DomainError> {
    if margin.value < Decimal::ZERO {
        return Err(DomainError::InvariantViolation(format!(
            "margin {} must not be negative",
            margin.value
        )));
    }
    Ok(())
}

/// Prices the draft with the requested margin and appends it as a named option.
pub fn create_option<P>(
    draft: &DraftQuote,
    pricer: &P,
    currency: &str,
    request: OptionRequest,
) -> Result<(DraftQuote, OptionId), DomainError>
where
    P: DraftPricer + ?Sized,
{
    let name = request.name.trim().to_string();
    if name.is_empty() {
        return Err(DomainError::InvariantViolation("option name must not be blank".to_string()));
    }
    let folded = name.to_lowercase();
    if draft.step7.options.iter().any(|option| option.name.trim().to_lowercase() == folded) {
        return Err(DomainError::DuplicateOptionName(name));
    }
    ensure_margin(&request.margin)?;

    let breakdown = pricer.price(
        &PricingInput::new(draft, request.margin, currency)
            .with_quantities(request.container_quantities),
    );
    let option = QuoteOption {
        id: OptionId::generate(),
        name,
        description: request.description,
        margin: request.margin,
        breakdown,
        created_at: Utc::now(),
    };
    let option_id = option.id.clone();

    let mut step7 = draft.step7.clone();
    step7.options.push(option);
    Ok((draft.apply(StepUpdate::Finalize(step7)), option_id))
}

pub fn select_option(draft: &DraftQuote, option_id: &OptionId) -> Result<DraftQuote, DomainError> {
    if draft.step7.option(option_id).is_none() {
        return Err(DomainError::UnknownOption(option_id.clone()));
    }

    let mut step7 = draft.step7.clone();
    step7.selected_option = Some(option_id.clone());
    Ok(draft.apply(StepUpdate::Finalize(step7)))
}

/// Validates every wizard step and records the final margin and totals.
pub fn finalize<P>(
    draft: &DraftQuote,
    pricer: &P,
    currency: &str,
    margin: Margin,
    container_quantities: BTreeMap<String, u32>,
) -> Result<(DraftQuote, PriceBreakdown), DomainError>
where
    P: DraftPricer + ?Sized,
{
    ensure_margin(&margin)?;

    let mut step7 = draft.step7.clone();
    step7.margin = margin;
    let candidate = draft.apply(StepUpdate::Finalize(step7.clone()));

    let validation = validate_draft(&candidate);
    if !validation.valid {
        let first_step = validation.violations.first().map(|violation| violation.step.number());
        return Err(DomainError::StepValidationFailed {
            step: first_step.unwrap_or_default(),
            codes: validation.codes().join(","),
        });
    }

    let breakdown = pricer.price(
        &PricingInput::new(&candidate, margin, currency).with_quantities(container_quantities),
    );
    step7.totals = Some(breakdown.clone());
    step7.finalized_at = Some(Utc::now());

    Ok((candidate.apply(StepUpdate::Finalize(step7)), breakdown))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rust_decimal::Decimal;

    use super::{create_option, finalize, select_option, OptionRequest};
    use crate::domain::{
        container::{ContainerLine, ContainerType, Step3},
        draft::{DraftQuote, StepUpdate},
        finalize::{Margin, OptionId},
        request::{Party, Port, RequestId, Step1},
        seafreight::{Carrier, SeafreightContainer, SeafreightSelection, Step5},
    };
    use crate::errors::DomainError;
    use crate::pricing::DeterministicDraftPricer;

    fn priced_draft() -> DraftQuote {
        let port =
            |id: &str| Some(Port { port_id: id.to_owned(), name: id.to_owned(), country: None });
        DraftQuote::new(RequestId("REQ-20".to_owned()))
            .apply(StepUpdate::Request(Step1 {
                customer: Party { name: "Acme Imports".to_owned(), ..Party::default() },
                departure_port: port("NLRTM"),
                destination_port: port("USNYC"),
                ..Step1::default()
            }))
            .apply(StepUpdate::Containers(Step3 {
                containers: vec![ContainerLine {
                    id: "c-1".to_owned(),
                    container_type: ContainerType::new("40HC"),
                    quantity: 2,
                }],
            }))
            .apply(StepUpdate::Seafreight(Step5 {
                selections: vec![SeafreightSelection {
                    carrier: Carrier { id: None, name: "Blue Line".to_owned() },
                    container: SeafreightContainer {
                        unit_price: Some(Decimal::from(3600)),
                        ..SeafreightContainer::default()
                    },
                    ..SeafreightSelection::default()
                }],
            }))
    }

    #[test]
    fn create_option_appends_priced_variant() {
        let draft = priced_draft();
        let (next, option_id) = create_option(
            &draft,
            &DeterministicDraftPricer,
            "EUR",
            OptionRequest::new("Standard", Margin::percentage(Decimal::from(15))),
        )
        .expect("option should be created");

        let option = next.step7.option(&option_id).expect("option is stored on step7");
        assert_eq!(option.breakdown.grand_total, Decimal::from(8280));
        assert!(draft.step7.options.is_empty(), "source draft is not mutated");
        assert_eq!(next.step5, draft.step5);
    }

    #[test]
    fn option_names_must_be_unique_and_present() {
        let (draft, _) = create_option(
            &priced_draft(),
            &DeterministicDraftPricer,
            "EUR",
            OptionRequest::new("Express", Margin::amount(Decimal::from(300))),
        )
        .expect("first option");

        let duplicate = create_option(
            &draft,
            &DeterministicDraftPricer,
            "EUR",
            OptionRequest::new("express", Margin::amount(Decimal::from(100))),
        );
        assert_eq!(duplicate, Err(DomainError::DuplicateOptionName("express".to_owned())));

        let (draft, _) = create_option(
            &draft,
            &DeterministicDraftPricer,
            "EUR",
            OptionRequest::new("Ëxpress", Margin::amount(Decimal::from(350))),
        )
        .expect("accented name is a different option");
        let accented_duplicate = create_option(
            &draft,
            &DeterministicDraftPricer,
            "EUR",
            OptionRequest::new(" ëxpress ", Margin::amount(Decimal::from(100))),
        );
        assert_eq!(
            accented_duplicate,
            Err(DomainError::DuplicateOptionName("ëxpress".to_owned()))
        );

        let blank = create_option(
            &draft,
            &DeterministicDraftPricer,
            "EUR",
            OptionRequest::new("  ", Margin::amount(Decimal::from(100))),
        );
        assert!(matches!(blank, Err(DomainError::InvariantViolation(_))));
    }

    #[test]
    fn select_option_rejects_unknown_ids() {
        let (draft, option_id) = create_option(
            &priced_draft(),
            &DeterministicDraftPricer,
            "EUR",
            OptionRequest::new("Standard", Margin::percentage(Decimal::from(10))),
        )
        .expect("option");

        let selected = select_option(&draft, &option_id).expect("known option");
        assert_eq!(selected.step7.selected_option, Some(option_id));

        let unknown = OptionId("missing".to_owned());
        assert_eq!(select_option(&draft, &unknown), Err(DomainError::UnknownOption(unknown)));
    }

    #[test]
    fn finalize_records_totals_for_a_complete_draft() {
        let mut quantities = BTreeMap::new();
        quantities.insert("c-1".to_owned(), 3);

        let (finalized, breakdown) = finalize(
            &priced_draft(),
            &DeterministicDraftPricer,
            "EUR",
            Margin::amount(Decimal::from(400)),
            quantities,
        )
        .expect("complete draft finalizes");

        assert_eq!(breakdown.subtotal, Decimal::from(10800));
        assert_eq!(breakdown.grand_total, Decimal::from(11200));
        assert_eq!(finalized.step7.totals, Some(breakdown));
        assert!(finalized.step7.finalized_at.is_some());
    }

    #[test]
    fn finalize_rejects_incomplete_drafts_and_negative_margins() {
        let incomplete = DraftQuote::new(RequestId("REQ-21".to_owned()));
        let error = finalize(
            &incomplete,
            &DeterministicDraftPricer,
            "EUR",
            Margin::percentage(Decimal::from(5)),
            BTreeMap::new(),
        )
        .expect_err("incomplete draft must not finalize");
        assert!(matches!(error, DomainError::StepValidationFailed { step: 1, .. }));

        let negative = finalize(
            &priced_draft(),
            &DeterministicDraftPricer,
            "EUR",
            Margin::percentage(Decimal::from(-5)),
            BTreeMap::new(),
        );
        assert!(matches!(negative, Err(DomainError::InvariantViolation(_))));
    }
}
