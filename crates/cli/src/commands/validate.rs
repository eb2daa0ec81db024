use std::path::{Path, PathBuf};

use clap::Args;
use freightdesk_core::config::ConfigOverrides;
use freightdesk_core::wizard::{validate_draft, validate_step, WizardStep};
use tracing::warn;

use crate::commands::{load_config, load_draft, CommandResult, EXIT_INPUT, EXIT_VALIDATION};

const COMMAND: &str = "validate";

#[derive(Debug, Clone, Args)]
pub struct ValidateArgs {
    #[arg(help = "Path to a draft quote JSON document")]
    pub draft: PathBuf,
    #[arg(long, help = "Only validate one wizard step (1, 3, 4, 5, 6 or 7)")]
    pub step: Option<u8>,
}

pub fn run(config_path: Option<&Path>, args: &ValidateArgs) -> CommandResult {
    execute(config_path, args).unwrap_or_else(|failure| failure)
}

fn execute(
    config_path: Option<&Path>,
    args: &ValidateArgs,
) -> Result<CommandResult, CommandResult> {
    load_config(COMMAND, config_path, ConfigOverrides::default())?;
    let draft = load_draft(COMMAND, &args.draft)?;

    let validation = match args.step {
        Some(number) => {
            let step = WizardStep::from_number(number).ok_or_else(|| {
                CommandResult::failure(
                    COMMAND,
                    "invalid_step",
                    format!("unknown wizard step {number} (expected 1, 3, 4, 5, 6 or 7)"),
                    EXIT_INPUT,
                )
            })?;
            validate_step(&draft, step)
        }
        None => validate_draft(&draft),
    };

    if validation.valid {
        return Ok(CommandResult::success_with_data(COMMAND, "draft is valid", &validation));
    }

    let codes = validation.codes().join(",");
    warn!(
        event_name = "cli.validate.failed",
        correlation_id = %draft.request_id.0,
        codes = %codes,
        "draft failed wizard validation"
    );
    Ok(CommandResult::failure_with_data(
        COMMAND,
        "step_validation",
        format!("draft failed validation: {codes}"),
        EXIT_VALIDATION,
        &validation,
    ))
}
