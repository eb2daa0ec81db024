use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HaulageTariff {
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
    /// Free loading time in hours.
    #[serde(default)]
    pub free_time: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HaulageRoute {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validity {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HaulageSelection {
    pub offer_id: String,
    #[serde(default)]
    pub haulier_id: Option<String>,
    #[serde(default)]
    pub haulier_name: String,
    #[serde(default)]
    pub tariff: HaulageTariff,
    #[serde(default)]
    pub route: HaulageRoute,
    #[serde(default)]
    pub validity: Validity,
}

/// Calculation persisted alongside the haulage choice by earlier saves.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HaulageCalculation {
    #[serde(default)]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub subtotal: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step4 {
    #[serde(default)]
    pub selection: Option<HaulageSelection>,
    #[serde(default)]
    pub calculation: Option<HaulageCalculation>,
}
