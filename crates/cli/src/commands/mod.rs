pub mod config;
pub mod doctor;
pub mod finalize;
pub mod option;
pub mod price;
pub mod recap;
pub mod teu;
pub mod validate;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use clap::Args;
use freightdesk_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use freightdesk_core::domain::draft::DraftQuote;
use freightdesk_core::domain::finalize::MarginType;
use rust_decimal::Decimal;
use serde::Serialize;

pub const EXIT_INTERNAL: u8 = 1;
pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_INPUT: u8 = 3;
pub const EXIT_VALIDATION: u8 = 4;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data: None,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: &impl Serialize,
    ) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => {
                let payload = CommandOutcome {
                    command: command.to_string(),
                    status: "ok".to_string(),
                    error_class: None,
                    message: message.into(),
                    data: Some(data),
                };
                Self { exit_code: 0, output: serialize_payload(payload) }
            }
            Err(error) => Self::failure(command, "serialization", error.to_string(), EXIT_INTERNAL),
        }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn failure_with_data(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
        data: &impl Serialize,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: serde_json::to_value(data).ok(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Plain output for human-facing commands.
    pub fn text(output: impl Into<String>) -> Self {
        Self { exit_code: 0, output: output.into() }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Pricing knobs shared by every command that prices a draft. Unset values
/// fall back to the `[pricing]` config section.
#[derive(Debug, Clone, Default, Args)]
pub struct PricingArgs {
    #[arg(long, help = "Margin value, a percentage or a flat amount depending on --margin-type")]
    pub margin: Option<Decimal>,
    #[arg(long = "margin-type", help = "percentage | amount")]
    pub margin_type: Option<MarginType>,
    #[arg(
        long = "quantity",
        value_name = "CONTAINER_ID=N",
        value_parser = parse_quantity,
        help = "Override the quantity of one container line (repeatable)"
    )]
    pub quantities: Vec<(String, u32)>,
    #[arg(long, help = "Three-letter currency code for the breakdown")]
    pub currency: Option<String>,
}

impl PricingArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            currency: self.currency.as_deref().map(|code| code.trim().to_ascii_uppercase()),
            margin_type: self.margin_type,
            margin_value: self.margin,
            ..ConfigOverrides::default()
        }
    }

    pub fn container_quantities(&self) -> BTreeMap<String, u32> {
        self.quantities.iter().cloned().collect()
    }
}

fn parse_quantity(raw: &str) -> Result<(String, u32), String> {
    let (id, quantity) =
        raw.split_once('=').ok_or_else(|| format!("expected CONTAINER_ID=N, got `{raw}`"))?;
    let id = id.trim();
    if id.is_empty() {
        return Err(format!("container id is missing in `{raw}`"));
    }
    let quantity = quantity
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("quantity must be a non-negative integer in `{raw}`"))?;
    Ok((id.to_string(), quantity))
}

pub fn load_options(config_path: Option<&Path>, overrides: ConfigOverrides) -> LoadOptions {
    LoadOptions {
        config_path: config_path.map(Path::to_path_buf),
        require_file: config_path.is_some(),
        overrides,
    }
}

pub(crate) fn load_config(
    command: &str,
    config_path: Option<&Path>,
    overrides: ConfigOverrides,
) -> Result<AppConfig, CommandResult> {
    AppConfig::load(load_options(config_path, overrides)).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            EXIT_CONFIG,
        )
    })
}

pub(crate) fn load_draft(command: &str, path: &Path) -> Result<DraftQuote, CommandResult> {
    read_draft(path).map_err(|error| {
        CommandResult::failure(command, "draft_input", format!("{error:#}"), EXIT_INPUT)
    })
}

pub(crate) fn store_draft(
    command: &str,
    path: &Path,
    draft: &DraftQuote,
) -> Result<(), CommandResult> {
    write_draft(path, draft).map_err(|error| {
        CommandResult::failure(command, "draft_output", format!("{error:#}"), EXIT_INPUT)
    })
}

fn read_draft(path: &Path) -> anyhow::Result<DraftQuote> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read draft `{}`", path.display()))?;
    let draft: DraftQuote = serde_json::from_str(&raw)
        .with_context(|| format!("could not parse draft `{}`", path.display()))?;
    Ok(draft.normalized())
}

fn write_draft(path: &Path, draft: &DraftQuote) -> anyhow::Result<()> {
    let raw = serde_json::to_string_pretty(draft).context("could not serialize draft")?;
    fs::write(path, raw).with_context(|| format!("could not write draft `{}`", path.display()))
}
