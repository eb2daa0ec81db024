//! Price lookups over offers whose upstream shape is not consistent.
//!
//! Every lookup walks an ordered list of candidate fields and reports which
//! one produced the amount, so callers can surface the source in the trace.
//! A lookup that finds nothing yields zero with [`PriceSource::Missing`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::container::ContainerType;
use crate::domain::haulage::Step4;
use crate::domain::seafreight::SeafreightSelection;
use crate::domain::services::MiscService;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    HaulageSubtotal,
    HaulageCalculationUnitPrice,
    HaulageTariffUnitPrice,
    ContainerUnitPrice,
    ChargesBasePrice,
    PricingBasePrice,
    PricingTotal,
    HistoricalRate,
    SurchargeValue,
    ServiceUnitPrice,
    ServiceTotalPrice,
    ServicePricingPrice,
    ServicePrice,
    Margin,
    Missing,
}

impl PriceSource {
    pub fn is_missing(self) -> bool {
        matches!(self, Self::Missing)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolved {
    pub amount: Decimal,
    pub source: PriceSource,
}

impl Resolved {
    fn found(amount: Decimal, source: PriceSource) -> Self {
        Self { amount, source }
    }

    fn missing() -> Self {
        Self { amount: Decimal::ZERO, source: PriceSource::Missing }
    }
}

fn first_of(candidates: &[(Option<Decimal>, PriceSource)]) -> Resolved {
    candidates
        .iter()
        .find_map(|(amount, source)| amount.map(|amount| Resolved::found(amount, *source)))
        .unwrap_or_else(Resolved::missing)
}

/// Haulage leg total. Returns `None` when no haulage offer was chosen.
pub fn haulage_total(step4: &Step4, total_teu: Decimal) -> Option<Resolved> {
    let selection = step4.selection.as_ref()?;
    let calculation = step4.calculation.as_ref();

    if let Some(subtotal) = calculation.and_then(|calculation| calculation.subtotal) {
        return Some(Resolved::found(subtotal, PriceSource::HaulageSubtotal));
    }

    let unit_price = first_of(&[
        (
            calculation.and_then(|calculation| calculation.unit_price),
            PriceSource::HaulageCalculationUnitPrice,
        ),
        (selection.tariff.unit_price, PriceSource::HaulageTariffUnitPrice),
    ]);
    if unit_price.source.is_missing() {
        return Some(unit_price);
    }

    match unit_price.amount.checked_mul(total_teu) {
        Some(amount) => Some(Resolved::found(amount, unit_price.source)),
        None => {
            warn!(
                event_name = "pricing.price_overflow",
                component = "haulage",
                "haulage unit price times TEU overflows, counting as zero"
            );
            Some(Resolved::missing())
        }
    }
}

/// Unit price of one container of `container_type` on a sea-freight offer.
///
/// With no container type the offer's generic base price is returned.
pub fn seafreight_unit_price(
    offer: &SeafreightSelection,
    container_type: Option<&ContainerType>,
) -> Resolved {
    let offer_container_matches = match (offer.container.container_type.as_ref(), container_type)
    {
        (Some(offered), Some(requested)) => offered.same_as(requested),
        _ => true,
    };
    let container_unit_price =
        if offer_container_matches { offer.container.unit_price } else { None };

    let historical_rate = match container_type {
        Some(requested) => offer
            .rates
            .iter()
            .find(|rate| rate.container_type.same_as(requested))
            .and_then(|rate| rate.unit_price),
        None => offer.rates.iter().find_map(|rate| rate.unit_price),
    };

    first_of(&[
        (container_unit_price, PriceSource::ContainerUnitPrice),
        (offer.charges.base_price, PriceSource::ChargesBasePrice),
        (offer.pricing.base_price, PriceSource::PricingBasePrice),
        (offer.pricing.total, PriceSource::PricingTotal),
        (historical_rate, PriceSource::HistoricalRate),
    ])
}

pub fn service_price(service: &MiscService) -> Resolved {
    first_of(&[
        (service.pricing.unit_price, PriceSource::ServiceUnitPrice),
        (service.pricing.total_price, PriceSource::ServiceTotalPrice),
        (service.pricing.price, PriceSource::ServicePricingPrice),
        (service.price, PriceSource::ServicePrice),
    ])
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{haulage_total, seafreight_unit_price, service_price, PriceSource};
    use crate::domain::{
        container::ContainerType,
        haulage::{HaulageCalculation, HaulageSelection, HaulageTariff, Step4},
        seafreight::{
            ContainerRate, SeafreightCharges, SeafreightContainer, SeafreightPricing,
            SeafreightSelection,
        },
        services::{MiscService, ServicePricing},
    };

    fn haulage(unit_price: Option<i64>) -> HaulageSelection {
        HaulageSelection {
            offer_id: "H-1".to_owned(),
            haulier_id: None,
            haulier_name: "Road Co".to_owned(),
            tariff: HaulageTariff {
                unit_price: unit_price.map(Decimal::from),
                ..HaulageTariff::default()
            },
            route: Default::default(),
            validity: Default::default(),
        }
    }

    #[test]
    fn haulage_prefers_persisted_subtotal() {
        let step4 = Step4 {
            selection: Some(haulage(Some(300))),
            calculation: Some(HaulageCalculation {
                subtotal: Some(Decimal::from(950)),
                ..HaulageCalculation::default()
            }),
        };

        let resolved = haulage_total(&step4, Decimal::from(4)).expect("haulage selected");
        assert_eq!(resolved.amount, Decimal::from(950));
        assert_eq!(resolved.source, PriceSource::HaulageSubtotal);
    }

    #[test]
    fn haulage_falls_back_to_tariff_times_teu() {
        let step4 = Step4 { selection: Some(haulage(Some(300))), calculation: None };

        let resolved = haulage_total(&step4, Decimal::new(45, 1)).expect("haulage selected");
        assert_eq!(resolved.amount, Decimal::from(1350));
        assert_eq!(resolved.source, PriceSource::HaulageTariffUnitPrice);
    }

    #[test]
    fn haulage_without_any_price_degrades_to_zero() {
        let step4 = Step4 { selection: Some(haulage(None)), calculation: None };

        let resolved = haulage_total(&step4, Decimal::from(2)).expect("haulage selected");
        assert_eq!(resolved.amount, Decimal::ZERO);
        assert!(resolved.source.is_missing());
        assert!(haulage_total(&Step4::default(), Decimal::from(2)).is_none());
    }

    #[test]
    fn haulage_uses_calculated_unit_price_before_tariff() {
        let step4 = Step4 {
            selection: Some(haulage(Some(300))),
            calculation: Some(HaulageCalculation {
                unit_price: Some(Decimal::from(275)),
                subtotal: None,
                ..HaulageCalculation::default()
            }),
        };

        let resolved = haulage_total(&step4, Decimal::from(4)).expect("haulage selected");
        assert_eq!(resolved.amount, Decimal::from(1100));
        assert_eq!(resolved.source, PriceSource::HaulageCalculationUnitPrice);
    }

    #[test]
    fn haulage_overflow_degrades_to_zero() {
        let mut selection = haulage(None);
        selection.tariff.unit_price = Some(Decimal::MAX);
        let step4 = Step4 { selection: Some(selection), calculation: None };

        let resolved = haulage_total(&step4, Decimal::from(2)).expect("haulage selected");
        assert_eq!(resolved.amount, Decimal::ZERO);
        assert!(resolved.source.is_missing());
    }

    #[test]
    fn offer_without_container_type_takes_first_priced_rate() {
        let offer = SeafreightSelection {
            rates: vec![
                ContainerRate { container_type: ContainerType::new("40HC"), unit_price: None },
                ContainerRate {
                    container_type: ContainerType::new("20GP"),
                    unit_price: Some(Decimal::from(1800)),
                },
                ContainerRate {
                    container_type: ContainerType::new("45HC"),
                    unit_price: Some(Decimal::from(4100)),
                },
            ],
            ..SeafreightSelection::default()
        };

        let resolved = seafreight_unit_price(&offer, None);
        assert_eq!(resolved.amount, Decimal::from(1800));
        assert_eq!(resolved.source, PriceSource::HistoricalRate);
    }

    #[test]
    fn seafreight_lookup_walks_fallback_chain_in_order() {
        let mut offer = SeafreightSelection {
            container: SeafreightContainer {
                container_type: Some(ContainerType::new("40HC")),
                unit_price: Some(Decimal::from(3600)),
                ..SeafreightContainer::default()
            },
            charges: SeafreightCharges {
                base_price: Some(Decimal::from(3500)),
                surcharges: Vec::new(),
            },
            pricing: SeafreightPricing {
                base_price: Some(Decimal::from(3400)),
                total: Some(Decimal::from(3300)),
            },
            rates: vec![ContainerRate {
                container_type: ContainerType::new("20GP"),
                unit_price: Some(Decimal::from(1800)),
            }],
            ..SeafreightSelection::default()
        };
        let forty = ContainerType::new("40hc");

        let source =
            |offer: &SeafreightSelection| seafreight_unit_price(offer, Some(&forty)).source;

        assert_eq!(source(&offer), PriceSource::ContainerUnitPrice);

        offer.container.unit_price = None;
        assert_eq!(source(&offer), PriceSource::ChargesBasePrice);

        offer.charges.base_price = None;
        assert_eq!(source(&offer), PriceSource::PricingBasePrice);

        offer.pricing.base_price = None;
        assert_eq!(seafreight_unit_price(&offer, Some(&forty)).amount, Decimal::from(3300));

        offer.pricing.total = None;
        let twenty = ContainerType::new("20GP");
        let resolved = seafreight_unit_price(&offer, Some(&twenty));
        assert_eq!(resolved.amount, Decimal::from(1800));
        assert_eq!(resolved.source, PriceSource::HistoricalRate);

        assert!(seafreight_unit_price(&offer, Some(&forty)).source.is_missing());
    }

    #[test]
    fn offer_container_price_is_ignored_for_other_container_types() {
        let offer = SeafreightSelection {
            container: SeafreightContainer {
                container_type: Some(ContainerType::new("20GP")),
                unit_price: Some(Decimal::from(1800)),
                ..SeafreightContainer::default()
            },
            ..SeafreightSelection::default()
        };

        let resolved = seafreight_unit_price(&offer, Some(&ContainerType::new("40HC")));
        assert_eq!(resolved.amount, Decimal::ZERO);
        assert!(resolved.source.is_missing());
    }

    #[test]
    fn service_price_prefers_unit_price_then_totals() {
        let mut service = MiscService {
            service_name: "Insurance".to_owned(),
            price: Some(Decimal::from(40)),
            pricing: ServicePricing {
                unit_price: None,
                total_price: Some(Decimal::from(120)),
                price: Some(Decimal::from(80)),
                quantity: Some(2),
            },
            ..MiscService::default()
        };

        assert_eq!(service_price(&service).amount, Decimal::from(120));

        service.pricing.total_price = None;
        service.pricing.price = None;
        assert_eq!(service_price(&service).source, PriceSource::ServicePrice);

        service.price = None;
        assert!(service_price(&service).source.is_missing());
    }
}
