pub mod resolve;

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::draft::DraftQuote;
use crate::domain::finalize::{Margin, MarginType};

use self::resolve::{haulage_total, seafreight_unit_price, service_price, PriceSource, Resolved};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineCategory {
    Haulage,
    Seafreight,
    Surcharge,
    Service,
    Margin,
}

/// One row of the price recap shown to the user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecapLine {
    pub category: LineCategory,
    pub label: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub amount: Decimal,
    pub source: PriceSource,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTraceStep {
    pub stage: String,
    pub detail: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub currency: String,
    pub haulage_total: Decimal,
    pub seafreight_base_total: Decimal,
    pub surcharge_total: Decimal,
    pub seafreight_total: Decimal,
    pub misc_total: Decimal,
    pub subtotal: Decimal,
    pub margin: Margin,
    pub margin_amount: Decimal,
    pub grand_total: Decimal,
    pub lines: Vec<RecapLine>,
    pub trace: Vec<PricingTraceStep>,
}

impl PriceBreakdown {
    /// Copy with every amount rounded half away from zero to `scale` places.
    pub fn rounded(&self, scale: u32) -> PriceBreakdown {
        let round = |value: Decimal| {
            value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
        };
        let mut rounded = self.clone();
        rounded.haulage_total = round(self.haulage_total);
        rounded.seafreight_base_total = round(self.seafreight_base_total);
        rounded.surcharge_total = round(self.surcharge_total);
        rounded.seafreight_total = round(self.seafreight_total);
        rounded.misc_total = round(self.misc_total);
        rounded.subtotal = round(self.subtotal);
        rounded.margin_amount = round(self.margin_amount);
        rounded.grand_total = round(self.grand_total);
        for line in &mut rounded.lines {
            line.unit_price = round(line.unit_price);
            line.amount = round(line.amount);
        }
        for step in &mut rounded.trace {
            step.amount = round(step.amount);
        }
        rounded
    }

    pub fn missing_prices(&self) -> usize {
        self.lines.iter().filter(|line| line.source.is_missing()).count()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PricingInput<'a> {
    pub draft: &'a DraftQuote,
    /// Per container line id, overrides the line's own quantity.
    pub container_quantities: BTreeMap<String, u32>,
    pub margin: Margin,
    pub currency: &'a str,
}

impl<'a> PricingInput<'a> {
    pub fn new(draft: &'a DraftQuote, margin: Margin, currency: &'a str) -> Self {
        Self { draft, container_quantities: BTreeMap::new(), margin, currency }
    }

    pub fn with_quantity(mut self, container_id: impl Into<String>, quantity: u32) -> Self {
        self.container_quantities.insert(container_id.into(), quantity);
        self
    }

    pub fn with_quantities(mut self, quantities: BTreeMap<String, u32>) -> Self {
        self.container_quantities.extend(quantities);
        self
    }
}

pub trait DraftPricer: Send + Sync {
    fn price(&self, input: &PricingInput<'_>) -> PriceBreakdown;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DeterministicDraftPricer;

impl DraftPricer for DeterministicDraftPricer {
    fn price(&self, input: &PricingInput<'_>) -> PriceBreakdown {
        price_draft(input)
    }
}

/// `None` when the margin cannot be represented for this subtotal.
pub fn margin_amount(subtotal: Decimal, margin: Margin) -> Option<Decimal> {
    match margin.kind {
        MarginType::Percentage => {
            subtotal.checked_mul(margin.value)?.checked_div(Decimal::ONE_HUNDRED)
        }
        MarginType::Amount => Some(margin.value),
    }
}

/// Running component totals. Every update is checked as a whole, so either
/// all totals containing a line move or none do.
#[derive(Clone, Copy, Debug, Default)]
struct Totals {
    haulage: Decimal,
    seafreight_base: Decimal,
    surcharge: Decimal,
    seafreight: Decimal,
    misc: Decimal,
    subtotal: Decimal,
}

impl Totals {
    fn with(self, category: LineCategory, amount: Decimal) -> Option<Totals> {
        let mut next = self;
        next.subtotal = next.subtotal.checked_add(amount)?;
        match category {
            LineCategory::Haulage => next.haulage = next.haulage.checked_add(amount)?,
            LineCategory::Seafreight => {
                next.seafreight_base = next.seafreight_base.checked_add(amount)?;
                next.seafreight = next.seafreight.checked_add(amount)?;
            }
            LineCategory::Surcharge => {
                next.surcharge = next.surcharge.checked_add(amount)?;
                next.seafreight = next.seafreight.checked_add(amount)?;
            }
            LineCategory::Service => next.misc = next.misc.checked_add(amount)?,
            // applied on top of the subtotal, never booked as a line total
            LineCategory::Margin => return None,
        }
        Some(next)
    }
}

struct LineBook<'a> {
    draft: &'a DraftQuote,
    totals: Totals,
    lines: Vec<RecapLine>,
}

impl<'a> LineBook<'a> {
    fn new(draft: &'a DraftQuote) -> Self {
        Self { draft, totals: Totals::default(), lines: Vec::new() }
    }

    fn book(&mut self, line: RecapLine) {
        match self.totals.with(line.category, line.amount) {
            Some(totals) => {
                self.totals = totals;
                self.lines.push(line);
            }
            None => self.book_overflowed(line),
        }
    }

    /// Keeps the line visible at zero, like any other unpriced line.
    fn book_overflowed(&mut self, mut line: RecapLine) {
        warn!(
            event_name = "pricing.price_overflow",
            request_id = %self.draft.request_id.0,
            label = %line.label,
            "line amount overflows the running totals, counting as zero"
        );
        line.unit_price = Decimal::ZERO;
        line.amount = Decimal::ZERO;
        line.source = PriceSource::Missing;
        self.lines.push(line);
    }
}

pub fn price_draft(input: &PricingInput<'_>) -> PriceBreakdown {
    let draft = input.draft;
    let mut book = LineBook::new(draft);

    if let Some(resolved) = haulage_total(&draft.step4, draft.total_teu) {
        note_missing(draft, "haulage", &resolved);
        let haulier = draft
            .step4
            .selection
            .as_ref()
            .map(|selection| selection.haulier_name.trim())
            .filter(|name| !name.is_empty())
            .unwrap_or("haulier");
        let (quantity, unit_price) = if resolved.source == PriceSource::HaulageSubtotal {
            (Decimal::ONE, resolved.amount)
        } else if draft.total_teu.is_zero() {
            (Decimal::ZERO, Decimal::ZERO)
        } else {
            (
                draft.total_teu,
                resolved.amount.checked_div(draft.total_teu).unwrap_or_default(),
            )
        };
        book.book(RecapLine {
            category: LineCategory::Haulage,
            label: format!("Haulage ({haulier})"),
            quantity,
            unit_price,
            amount: resolved.amount,
            source: resolved.source,
        });
    }

    let containers = draft.containers();

    for (index, offer) in draft.step5.selections.iter().enumerate() {
        let offer_label = offer.label(index);

        if containers.is_empty() {
            let resolved = seafreight_unit_price(offer, None);
            note_missing(draft, "seafreight", &resolved);
            book.book(RecapLine {
                category: LineCategory::Seafreight,
                label: offer_label.clone(),
                quantity: Decimal::ONE,
                unit_price: resolved.amount,
                amount: resolved.amount,
                source: resolved.source,
            });
        }

        for container in containers {
            let quantity = Decimal::from(
                input
                    .container_quantities
                    .get(&container.id)
                    .copied()
                    .unwrap_or(container.quantity),
            );
            let resolved = seafreight_unit_price(offer, Some(&container.container_type));
            note_missing(draft, "seafreight", &resolved);

            let line = RecapLine {
                category: LineCategory::Seafreight,
                label: format!("{offer_label} {}", container.container_type.as_str()),
                quantity,
                unit_price: resolved.amount,
                amount: Decimal::ZERO,
                source: resolved.source,
            };
            match resolved.amount.checked_mul(quantity) {
                Some(amount) => book.book(RecapLine { amount, ..line }),
                None => book.book_overflowed(line),
            }
        }

        for surcharge in &offer.charges.surcharges {
            let (value, source) = match surcharge.value {
                Some(value) => (value, PriceSource::SurchargeValue),
                None => (Decimal::ZERO, PriceSource::Missing),
            };
            book.book(RecapLine {
                category: LineCategory::Surcharge,
                label: format!("{offer_label} {}", surcharge.name.trim()),
                quantity: Decimal::ONE,
                unit_price: value,
                amount: value,
                source,
            });
        }
    }

    for service in &draft.step6.selections {
        let resolved = service_price(service);
        note_missing(draft, "service", &resolved);
        book.book(RecapLine {
            category: LineCategory::Service,
            label: service.service_name.trim().to_string(),
            quantity: Decimal::ONE,
            unit_price: resolved.amount,
            amount: resolved.amount,
            source: resolved.source,
        });
    }

    let LineBook { totals, mut lines, .. } = book;
    let subtotal = totals.subtotal;
    let margined = margin_amount(subtotal, input.margin)
        .and_then(|margin| Some((margin, subtotal.checked_add(margin)?)));
    let (margin_amount, grand_total, margin_source) = match margined {
        Some((margin, grand_total)) => (margin, grand_total, PriceSource::Margin),
        None => {
            warn!(
                event_name = "pricing.price_overflow",
                request_id = %draft.request_id.0,
                component = "margin",
                "margin overflows the subtotal, counting as zero"
            );
            (Decimal::ZERO, subtotal, PriceSource::Missing)
        }
    };

    lines.push(RecapLine {
        category: LineCategory::Margin,
        label: match input.margin.kind {
            MarginType::Percentage => format!("Margin ({}%)", input.margin.value.normalize()),
            MarginType::Amount => "Margin".to_string(),
        },
        quantity: Decimal::ONE,
        unit_price: margin_amount,
        amount: margin_amount,
        source: margin_source,
    });

    let trace = vec![
        trace_step("haulage", "calculation subtotal, else unit price * total TEU", totals.haulage),
        trace_step(
            "seafreight_base",
            "sum(unit price * resolved quantity) per offer and container",
            totals.seafreight_base,
        ),
        trace_step("surcharges", "flat sum per offer", totals.surcharge),
        trace_step("misc", "sum(service price)", totals.misc),
        trace_step("subtotal", "haulage + seafreight + misc", subtotal),
        trace_step(
            "margin",
            match input.margin.kind {
                MarginType::Percentage => "subtotal * margin / 100",
                MarginType::Amount => "fixed amount",
            },
            margin_amount,
        ),
        trace_step("grand_total", "subtotal + margin", grand_total),
    ];

    PriceBreakdown {
        currency: input.currency.to_string(),
        haulage_total: totals.haulage,
        seafreight_base_total: totals.seafreight_base,
        surcharge_total: totals.surcharge,
        seafreight_total: totals.seafreight,
        misc_total: totals.misc,
        subtotal,
        margin: input.margin,
        margin_amount,
        grand_total,
        lines,
        trace,
    }
}

fn trace_step(stage: &str, detail: &str, amount: Decimal) -> PricingTraceStep {
    PricingTraceStep { stage: stage.to_string(), detail: detail.to_string(), amount }
}

fn note_missing(draft: &DraftQuote, component: &'static str, resolved: &Resolved) {
    if resolved.source.is_missing() {
        warn!(
            event_name = "pricing.price_missing",
            request_id = %draft.request_id.0,
            component,
            "no price field found, counting as zero"
        );
    }
}
