use std::path::{Path, PathBuf};

use clap::Args;
use freightdesk_core::recap::RecapRenderer;
use serde::Serialize;

use crate::commands::{
    load_config, load_draft, price::price, CommandResult, PricingArgs, EXIT_CONFIG,
};

const COMMAND: &str = "recap";

#[derive(Debug, Clone, Args)]
pub struct RecapArgs {
    #[arg(help = "Path to a draft quote JSON document")]
    pub draft: PathBuf,
    #[command(flatten)]
    pub pricing: PricingArgs,
    #[arg(long, help = "Tera template used instead of recap.template_path")]
    pub template: Option<PathBuf>,
    #[arg(long, help = "Wrap the recap text in a JSON payload")]
    pub json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecapPayload {
    recap: String,
    grand_total: String,
    currency: String,
}

pub fn run(config_path: Option<&Path>, args: &RecapArgs) -> CommandResult {
    execute(config_path, args).unwrap_or_else(|failure| failure)
}

fn execute(config_path: Option<&Path>, args: &RecapArgs) -> Result<CommandResult, CommandResult> {
    let mut overrides = args.pricing.overrides();
    overrides.recap_template_path = args.template.clone();
    let config = load_config(COMMAND, config_path, overrides)?;
    let draft = load_draft(COMMAND, &args.draft)?;
    let breakdown = price(&config, &draft, &args.pricing);

    let renderer = match &config.recap.template_path {
        Some(path) => RecapRenderer::from_path(path),
        None => RecapRenderer::new(),
    }
    .map_err(|error| {
        CommandResult::failure(COMMAND, "recap_template", error.to_string(), EXIT_CONFIG)
    })?;
    let recap = renderer.render(&draft, &breakdown).map_err(|error| {
        CommandResult::failure(COMMAND, "recap_template", error.to_string(), EXIT_CONFIG)
    })?;

    if !args.json {
        return Ok(CommandResult::text(recap));
    }
    let payload = RecapPayload {
        recap,
        grand_total: breakdown.grand_total.to_string(),
        currency: breakdown.currency.clone(),
    };
    Ok(CommandResult::success_with_data(COMMAND, "recap rendered", &payload))
}
