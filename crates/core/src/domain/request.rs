use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Port {
    pub port_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
}

/// Request details captured on the first wizard screen.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step1 {
    #[serde(default)]
    pub customer: Party,
    #[serde(default)]
    pub origin: Location,
    #[serde(default)]
    pub destination: Location,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub incoterm: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub departure_port: Option<Port>,
    #[serde(default)]
    pub destination_port: Option<Port>,
}
