use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::container::ContainerType;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Carrier {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeaRoute {
    #[serde(default)]
    pub departure_port: Option<String>,
    #[serde(default)]
    pub destination_port: Option<String>,
    #[serde(default)]
    pub transit_days: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeafreightContainer {
    #[serde(default)]
    pub container_type: Option<ContainerType>,
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub subtotal: Option<Decimal>,
}

/// Flat fee attached to an offer, e.g. bunker or currency adjustment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Surcharge {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeafreightCharges {
    #[serde(default)]
    pub base_price: Option<Decimal>,
    #[serde(default)]
    pub surcharges: Vec<Surcharge>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeafreightPricing {
    #[serde(default)]
    pub base_price: Option<Decimal>,
    #[serde(default)]
    pub total: Option<Decimal>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRate {
    pub container_type: ContainerType,
    #[serde(default)]
    pub unit_price: Option<Decimal>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeafreightSelection {
    #[serde(default)]
    pub offer_id: Option<String>,
    #[serde(default)]
    pub carrier: Carrier,
    #[serde(default)]
    pub route: SeaRoute,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub container: SeafreightContainer,
    #[serde(default)]
    pub charges: SeafreightCharges,
    #[serde(default)]
    pub pricing: SeafreightPricing,
    /// Older offers carry one rate per container type instead of a single price.
    #[serde(default)]
    pub rates: Vec<ContainerRate>,
}

impl SeafreightSelection {
    pub fn label(&self, index: usize) -> String {
        if self.carrier.name.trim().is_empty() {
            format!("seafreight #{}", index + 1)
        } else {
            self.carrier.name.trim().to_string()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step5 {
    #[serde(default)]
    pub selections: Vec<SeafreightSelection>,
}
