use std::path::{Path, PathBuf};

use clap::Args;
use freightdesk_core::config::AppConfig;
use freightdesk_core::domain::draft::DraftQuote;
use freightdesk_core::pricing::{
    DeterministicDraftPricer, DraftPricer, PriceBreakdown, PricingInput,
};
use tracing::info;

use crate::commands::{load_config, load_draft, CommandResult, PricingArgs};

const COMMAND: &str = "price";

#[derive(Debug, Clone, Args)]
pub struct PriceArgs {
    #[arg(help = "Path to a draft quote JSON document")]
    pub draft: PathBuf,
    #[command(flatten)]
    pub pricing: PricingArgs,
}

pub fn run(config_path: Option<&Path>, args: &PriceArgs) -> CommandResult {
    execute(config_path, args).unwrap_or_else(|failure| failure)
}

fn execute(config_path: Option<&Path>, args: &PriceArgs) -> Result<CommandResult, CommandResult> {
    let config = load_config(COMMAND, config_path, args.pricing.overrides())?;
    let draft = load_draft(COMMAND, &args.draft)?;
    let breakdown = price(&config, &draft, &args.pricing);

    let missing = breakdown.missing_prices();
    info!(
        event_name = "cli.price.completed",
        correlation_id = %draft.request_id.0,
        grand_total = %breakdown.grand_total,
        currency = %breakdown.currency,
        missing_prices = missing,
        "draft priced"
    );

    let mut message = format!("grand total {} {}", breakdown.grand_total, breakdown.currency);
    if missing > 0 {
        message.push_str(&format!(" ({missing} line(s) without a price)"));
    }
    Ok(CommandResult::success_with_data(COMMAND, message, &breakdown))
}

/// Prices with the configured margin and currency, rounded for display.
pub(crate) fn price(config: &AppConfig, draft: &DraftQuote, args: &PricingArgs) -> PriceBreakdown {
    let input = PricingInput::new(draft, config.pricing.default_margin(), &config.pricing.currency)
        .with_quantities(args.container_quantities());
    DeterministicDraftPricer.price(&input).rounded(config.pricing.rounding_scale)
}
