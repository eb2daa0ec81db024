use std::path::{Path, PathBuf};

use clap::Args;
use freightdesk_core::audit::AuditContext;
use freightdesk_core::pricing::PriceBreakdown;
use serde::Serialize;

use crate::commands::option::{rejected, session};
use crate::commands::{load_config, load_draft, store_draft, CommandResult, PricingArgs};

const COMMAND: &str = "finalize";

#[derive(Debug, Clone, Args)]
pub struct FinalizeArgs {
    #[arg(help = "Path to a draft quote JSON document")]
    pub draft: PathBuf,
    #[command(flatten)]
    pub pricing: PricingArgs,
    #[arg(long, help = "Write the finalized draft to this path")]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FinalizePayload {
    finalized_at: Option<String>,
    totals: PriceBreakdown,
}

pub fn run(config_path: Option<&Path>, args: &FinalizeArgs) -> CommandResult {
    execute(config_path, args).unwrap_or_else(|failure| failure)
}

fn execute(
    config_path: Option<&Path>,
    args: &FinalizeArgs,
) -> Result<CommandResult, CommandResult> {
    let config = load_config(COMMAND, config_path, args.pricing.overrides())?;
    let draft = load_draft(COMMAND, &args.draft)?;
    let session = session(&config.pricing.currency);
    let audit = AuditContext::new(draft.request_id.clone(), draft.request_id.0.clone(), "cli");

    let (finalized, breakdown) = session
        .finalize(
            &draft,
            config.pricing.default_margin(),
            args.pricing.container_quantities(),
            &audit,
        )
        .map_err(|error| rejected(COMMAND, error))?;

    if let Some(path) = &args.out {
        store_draft(COMMAND, path, &finalized)?;
    }

    let totals = breakdown.rounded(config.pricing.rounding_scale);
    let message = format!("finalized at {} {}", totals.grand_total, totals.currency);
    let payload = FinalizePayload {
        finalized_at: finalized.step7.finalized_at.map(|at| at.to_rfc3339()),
        totals,
    };
    Ok(CommandResult::success_with_data(COMMAND, message, &payload))
}
