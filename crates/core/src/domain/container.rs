use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContainerType(pub String);

impl ContainerType {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Twenty-foot equivalent units for one container of this type.
    ///
    /// Unrecognized types count as zero TEU.
    pub fn teu(&self) -> Decimal {
        let code = self.0.trim();
        if code.contains("45") {
            Decimal::new(225, 2)
        } else if code.contains("40") {
            Decimal::TWO
        } else if code.contains("20") {
            Decimal::ONE
        } else {
            Decimal::ZERO
        }
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn same_as(&self, other: &ContainerType) -> bool {
        self.0.trim().eq_ignore_ascii_case(other.0.trim())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerLine {
    pub id: String,
    pub container_type: ContainerType,
    pub quantity: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step3 {
    #[serde(default)]
    pub containers: Vec<ContainerLine>,
}

pub fn total_teu(containers: &[ContainerLine]) -> Decimal {
    containers
        .iter()
        .map(|line| line.container_type.teu() * Decimal::from(line.quantity))
        .sum()
}
