use std::path::{Path, PathBuf};

use clap::Args;
use freightdesk_core::domain::container::ContainerType;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::commands::{load_draft, CommandResult, EXIT_INPUT};

const COMMAND: &str = "teu";

#[derive(Debug, Clone, Args)]
pub struct TeuArgs {
    #[arg(help = "Container type codes, e.g. 20GP 40HC 45HC")]
    pub container_types: Vec<String>,
    #[arg(long, help = "Also count every container line of this draft")]
    pub draft: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TeuEntry {
    container_type: String,
    quantity: u32,
    teu: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TeuReport {
    containers: Vec<TeuEntry>,
    total_teu: Decimal,
}

pub fn run(args: &TeuArgs) -> CommandResult {
    execute(args).unwrap_or_else(|failure| failure)
}

fn execute(args: &TeuArgs) -> Result<CommandResult, CommandResult> {
    if args.container_types.is_empty() && args.draft.is_none() {
        return Err(CommandResult::failure(
            COMMAND,
            "missing_input",
            "pass at least one container type or --draft",
            EXIT_INPUT,
        ));
    }

    let mut containers: Vec<TeuEntry> = args
        .container_types
        .iter()
        .map(|code| {
            let container_type = ContainerType::new(code);
            TeuEntry { teu: container_type.teu(), container_type: code.clone(), quantity: 1 }
        })
        .collect();

    if let Some(path) = args.draft.as_deref() {
        containers.extend(draft_entries(path)?);
    }

    let total_teu: Decimal =
        containers.iter().map(|entry| entry.teu * Decimal::from(entry.quantity)).sum();
    let message = format!("total TEU {}", total_teu.normalize());
    Ok(CommandResult::success_with_data(
        COMMAND,
        message,
        &TeuReport { containers, total_teu: total_teu.normalize() },
    ))
}

fn draft_entries(path: &Path) -> Result<Vec<TeuEntry>, CommandResult> {
    let draft = load_draft(COMMAND, path)?;
    Ok(draft
        .containers()
        .iter()
        .map(|line| TeuEntry {
            container_type: line.container_type.as_str().to_string(),
            quantity: line.quantity,
            teu: line.container_type.teu(),
        })
        .collect())
}
