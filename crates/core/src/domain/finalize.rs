use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pricing::PriceBreakdown;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginType {
    #[default]
    Percentage,
    Amount,
}

impl std::str::FromStr for MarginType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "percentage" | "percent" | "pct" | "%" => Ok(Self::Percentage),
            "amount" | "flat" => Ok(Self::Amount),
            other => Err(format!("unsupported margin type `{other}` (expected percentage|amount)")),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Margin {
    #[serde(rename = "type", default)]
    pub kind: MarginType,
    #[serde(default)]
    pub value: Decimal,
}

impl Margin {
    pub fn percentage(value: Decimal) -> Self {
        Self { kind: MarginType::Percentage, value }
    }

    pub fn amount(value: Decimal) -> Self {
        Self { kind: MarginType::Amount, value }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OptionId(pub String);

impl OptionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for OptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Named pricing variant of a draft that can be attached to the final quote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteOption {
    pub id: OptionId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub margin: Margin,
    pub breakdown: PriceBreakdown,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step7 {
    #[serde(default)]
    pub margin: Margin,
    #[serde(default)]
    pub totals: Option<PriceBreakdown>,
    #[serde(default)]
    pub options: Vec<QuoteOption>,
    #[serde(default)]
    pub selected_option: Option<OptionId>,
    #[serde(default)]
    pub finalized_at: Option<DateTime<Utc>>,
}

impl Step7 {
    pub fn option(&self, id: &OptionId) -> Option<&QuoteOption> {
        self.options.iter().find(|option| &option.id == id)
    }
}
