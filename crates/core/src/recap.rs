//! Plain-text recap of a price breakdown, rendered with Tera.
//!
//! The built-in template can be replaced by a file configured under
//! `recap.template_path`; custom templates see the same context and filters.

use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};
use tera::{Context, Tera};
use thiserror::Error;

use crate::domain::draft::DraftQuote;
use crate::domain::request::Port;
use crate::pricing::PriceBreakdown;

const RECAP_TEMPLATE_NAME: &str = "recap.txt";

const DEFAULT_RECAP_TEMPLATE: &str = r#"Quote recap for request {{ request_id }}{% if draft_id %} (draft {{ draft_id }}){% endif %}
{%- if route %}
Route: {{ route }}
{%- endif %}
Total TEU: {{ total_teu }}

{% for line in lines -%}
{{ line.category | upper | pad(width=10) }} {{ line.label }}: {{ line.quantity }} x {{ line.unitPrice | money }} = {{ line.amount | money }} {{ currency }}{% if line.source == "missing" %} [no price]{% endif %}
{% endfor %}
Haulage:    {{ haulage_total | money }} {{ currency }}
Seafreight: {{ seafreight_total | money }} {{ currency }} (surcharges {{ surcharge_total | money }})
Services:   {{ misc_total | money }} {{ currency }}
Subtotal:   {{ subtotal | money }} {{ currency }}
Margin:     {{ margin_amount | money }} {{ currency }}
Total:      {{ grand_total | money }} {{ currency }}
"#;

#[derive(Debug, Error)]
pub enum RecapError {
    #[error("recap template error: {0}")]
    Template(String),
    #[error("could not read recap template `{path}`: {source}")]
    ReadTemplate { path: String, source: std::io::Error },
}

/// Register the filters recap templates rely on.
///
/// - `money`: two-decimal formatting of numbers or decimal strings, half away
///   from zero; anything else is a render error
/// - `pad`: left-aligns a string in a column, e.g. `label | pad(width=12)`
pub fn register_recap_filters(tera: &mut Tera) {
    tera.register_filter("money", money_filter);
    tera.register_filter("pad", pad_filter);
}

fn money_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let amount = match value {
        tera::Value::Null => Decimal::ZERO,
        tera::Value::String(raw) => parse_money(raw.trim())?,
        tera::Value::Number(number) => parse_money(&number.to_string())?,
        other => {
            return Err(tera::Error::msg(format!("money filter expects a number, got {other}")))
        }
    };
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    Ok(tera::Value::String(format!("{rounded:.2}")))
}

fn parse_money(raw: &str) -> tera::Result<Decimal> {
    raw.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| tera::Error::msg(format!("money filter expects a number, got `{raw}`")))
}

fn pad_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let text = value.as_str().ok_or_else(|| tera::Error::msg("pad filter expects a string"))?;
    let width = args.get("width").and_then(tera::Value::as_u64).unwrap_or(0) as usize;
    Ok(tera::Value::String(format!("{text:<width$}")))
}

pub struct RecapRenderer {
    tera: Tera,
}

impl RecapRenderer {
    pub fn new() -> Result<Self, RecapError> {
        Self::from_template(DEFAULT_RECAP_TEMPLATE)
    }

    pub fn from_template(template: &str) -> Result<Self, RecapError> {
        let mut tera = Tera::default();
        register_recap_filters(&mut tera);
        tera.add_raw_template(RECAP_TEMPLATE_NAME, template)
            .map_err(|error| RecapError::Template(error.to_string()))?;
        Ok(Self { tera })
    }

    pub fn from_path(path: &std::path::Path) -> Result<Self, RecapError> {
        let template = std::fs::read_to_string(path).map_err(|source| {
            RecapError::ReadTemplate { path: path.display().to_string(), source }
        })?;
        Self::from_template(&template)
    }

    pub fn render(
        &self,
        draft: &DraftQuote,
        breakdown: &PriceBreakdown,
    ) -> Result<String, RecapError> {
        let mut context = Context::from_serialize(breakdown)
            .map_err(|error| RecapError::Template(error.to_string()))?;
        context.insert("request_id", &draft.request_id.0);
        context.insert("draft_id", &draft.id.as_ref().map(|id| id.0.clone()));
        context.insert("total_teu", &draft.total_teu.normalize().to_string());
        context.insert("route", &route_label(draft));
        context.insert("haulage_total", &breakdown.haulage_total);
        context.insert("seafreight_total", &breakdown.seafreight_total);
        context.insert("surcharge_total", &breakdown.surcharge_total);
        context.insert("misc_total", &breakdown.misc_total);
        context.insert("margin_amount", &breakdown.margin_amount);
        context.insert("grand_total", &breakdown.grand_total);

        self.tera
            .render(RECAP_TEMPLATE_NAME, &context)
            .map_err(|error| RecapError::Template(error.to_string()))
    }
}

fn route_label(draft: &DraftQuote) -> Option<String> {
    let departure = draft.step1.departure_port.as_ref()?;
    let destination = draft.step1.destination_port.as_ref()?;
    let name = |port: &Port| {
        if port.name.trim().is_empty() {
            port.port_id.clone()
        } else {
            port.name.trim().to_string()
        }
    };
    Some(format!("{} -> {}", name(departure), name(destination)))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::RecapRenderer;
    use crate::domain::{
        container::{ContainerLine, ContainerType, Step3},
        draft::{DraftQuote, StepUpdate},
        finalize::Margin,
        request::{Port, RequestId, Step1},
        seafreight::{Carrier, SeafreightContainer, SeafreightSelection, Step5},
        services::{MiscService, Step6},
    };
    use crate::pricing::{price_draft, PricingInput};

    fn draft() -> DraftQuote {
        DraftQuote::new(RequestId("REQ-40".to_owned()))
            .apply(StepUpdate::Request(Step1 {
                departure_port: Some(Port {
                    port_id: "BEANR".to_owned(),
                    name: "Antwerp".to_owned(),
                    country: None,
                }),
                destination_port: Some(Port {
                    port_id: "CNSHA".to_owned(),
                    name: String::new(),
                    country: None,
                }),
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
            .apply(StepUpdate::Services(Step6 {
                selections: vec![MiscService {
                    service_name: "Survey".to_owned(),
                    ..MiscService::default()
                }],
            }))
    }

    #[test]
    fn default_template_lists_lines_and_totals() {
        let draft = draft();
        let breakdown =
            price_draft(&PricingInput::new(&draft, Margin::percentage(Decimal::from(15)), "EUR"));

        let text =
            RecapRenderer::new().expect("template").render(&draft, &breakdown).expect("render");

        assert!(text.contains("Quote recap for request REQ-40"));
        assert!(text.contains("Route: Antwerp -> CNSHA"));
        assert!(text.contains("Total TEU: 4"));
        assert!(text.contains("Blue Line 40HC: 2 x 3600.00 = 7200.00 EUR"));
        assert!(text.contains("Survey: 1 x 0.00 = 0.00 EUR [no price]"));
        assert!(text.contains("Total:      8280.00 EUR"));
    }

    #[test]
    fn custom_template_receives_breakdown_context() {
        let draft = draft();
        let breakdown =
            price_draft(&PricingInput::new(&draft, Margin::amount(Decimal::new(5, 1)), "USD"));

        let renderer = RecapRenderer::from_template("{{ grand_total | money }} {{ currency }}")
            .expect("template parses");
        assert_eq!(renderer.render(&draft, &breakdown).expect("render"), "7200.50 USD");
    }

    #[test]
    fn money_rounds_half_away_from_zero_and_rejects_text() {
        let draft = draft();
        let mut breakdown =
            price_draft(&PricingInput::new(&draft, Margin::percentage(Decimal::ZERO), "EUR"));
        breakdown.grand_total = Decimal::new(125, 3);
        breakdown.margin_amount = Decimal::new(-125, 3);

        let renderer =
            RecapRenderer::from_template("{{ grand_total | money }} {{ margin_amount | money }}")
                .expect("template parses");
        assert_eq!(renderer.render(&draft, &breakdown).expect("render"), "0.13 -0.13");

        let renderer =
            RecapRenderer::from_template("{{ currency | money }}").expect("template parses");
        assert!(renderer.render(&draft, &breakdown).is_err());
    }

    #[test]
    fn broken_template_is_reported() {
        assert!(RecapRenderer::from_template("{{ unclosed").is_err());
    }
}
