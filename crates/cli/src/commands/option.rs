use std::path::{Path, PathBuf};

use clap::Args;
use freightdesk_core::audit::{AuditContext, NoopAuditSink};
use freightdesk_core::domain::draft::DraftQuote;
use freightdesk_core::errors::DomainError;
use freightdesk_core::options::OptionRequest;
use freightdesk_core::pricing::DeterministicDraftPricer;
use freightdesk_core::session::DraftSession;
use freightdesk_core::store::InMemoryDraftStore;
use serde::Serialize;

use crate::commands::{
    load_config, load_draft, store_draft, CommandResult, PricingArgs, EXIT_VALIDATION,
};

const COMMAND: &str = "option";

#[derive(Debug, Clone, Args)]
pub struct OptionArgs {
    #[arg(help = "Path to a draft quote JSON document")]
    pub draft: PathBuf,
    #[arg(long, help = "Option name, unique per draft")]
    pub name: String,
    #[arg(long)]
    pub description: Option<String>,
    #[command(flatten)]
    pub pricing: PricingArgs,
    #[arg(long, help = "Mark the new option as the selected one")]
    pub select: bool,
    #[arg(long, help = "Write the updated draft here instead of returning it in the payload")]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OptionPayload {
    option_id: String,
    grand_total: String,
    currency: String,
    selected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    draft: Option<DraftQuote>,
}

pub(crate) type CliSession =
    DraftSession<DeterministicDraftPricer, InMemoryDraftStore, NoopAuditSink>;

pub(crate) fn session(currency: &str) -> CliSession {
    DraftSession::new(
        DeterministicDraftPricer,
        InMemoryDraftStore::default(),
        NoopAuditSink,
        currency,
    )
}

pub(crate) fn rejected(command: &str, error: DomainError) -> CommandResult {
    let error_class = match error {
        DomainError::StepValidationFailed { .. } => "step_validation",
        DomainError::DuplicateOptionName(_) => "duplicate_option",
        DomainError::UnknownOption(_) => "unknown_option",
        DomainError::InvariantViolation(_) => "invariant_violation",
    };
    CommandResult::failure(command, error_class, error.to_string(), EXIT_VALIDATION)
}

pub fn run(config_path: Option<&Path>, args: &OptionArgs) -> CommandResult {
    execute(config_path, args).unwrap_or_else(|failure| failure)
}

fn execute(config_path: Option<&Path>, args: &OptionArgs) -> Result<CommandResult, CommandResult> {
    let config = load_config(COMMAND, config_path, args.pricing.overrides())?;
    let draft = load_draft(COMMAND, &args.draft)?;
    let session = session(&config.pricing.currency);
    let audit = AuditContext::new(draft.request_id.clone(), draft.request_id.0.clone(), "cli");

    let request = OptionRequest {
        description: args.description.clone(),
        container_quantities: args.pricing.container_quantities(),
        ..OptionRequest::new(args.name.clone(), config.pricing.default_margin())
    };
    let (mut draft, option_id) = session
        .create_option(&draft, request, &audit)
        .map_err(|error| rejected(COMMAND, error))?;
    if args.select {
        draft = session
            .select_option(&draft, &option_id, &audit)
            .map_err(|error| rejected(COMMAND, error))?;
    }

    let breakdown = draft
        .step7
        .option(&option_id)
        .map(|option| option.breakdown.rounded(config.pricing.rounding_scale));
    let (grand_total, currency) = breakdown
        .map(|breakdown| (breakdown.grand_total.to_string(), breakdown.currency))
        .unwrap_or_default();

    let inline_draft = match &args.out {
        Some(path) => {
            store_draft(COMMAND, path, &draft)?;
            None
        }
        None => Some(draft),
    };
    let message = format!("created option `{}` at {grand_total} {currency}", args.name.trim());
    let payload = OptionPayload {
        option_id: option_id.to_string(),
        grand_total,
        currency,
        selected: args.select,
        draft: inline_draft,
    };
    Ok(CommandResult::success_with_data(COMMAND, message, &payload))
}
