use std::path::Path;

use freightdesk_core::config::{AppConfig, ConfigOverrides};
use freightdesk_core::domain::container::{ContainerLine, ContainerType, Step3};
use freightdesk_core::domain::draft::{DraftQuote, StepUpdate};
use freightdesk_core::domain::finalize::Margin;
use freightdesk_core::domain::request::RequestId;
use freightdesk_core::domain::seafreight::{
    Carrier, SeafreightContainer, SeafreightSelection, Step5,
};
use freightdesk_core::pricing::{price_draft, PricingInput};
use freightdesk_core::recap::RecapRenderer;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::commands::{load_options, CommandResult, EXIT_CONFIG};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(config_path: Option<&Path>, json_output: bool) -> CommandResult {
    let report = build_report(config_path);
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { EXIT_CONFIG };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report(config_path: Option<&Path>) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(load_options(config_path, ConfigOverrides::default())) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_recap_template(&config));
            checks.push(check_pricing());
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck {
                name: "recap_template",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
            checks.push(check_pricing());
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_recap_template(config: &AppConfig) -> DoctorCheck {
    let (renderer, origin) = match &config.recap.template_path {
        Some(path) => (RecapRenderer::from_path(path), path.display().to_string()),
        None => (RecapRenderer::new(), "built-in template".to_string()),
    };

    match renderer {
        Ok(_) => DoctorCheck {
            name: "recap_template",
            status: CheckStatus::Pass,
            details: format!("{origin} parsed"),
        },
        Err(error) => DoctorCheck {
            name: "recap_template",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

/// 2 x 40HC at 3600 with a 15% margin must come to 8280.
fn check_pricing() -> DoctorCheck {
    let draft = DraftQuote::new(RequestId("doctor".to_string()))
        .apply(StepUpdate::Containers(Step3 {
            containers: vec![ContainerLine {
                id: "doctor-1".to_string(),
                container_type: ContainerType::new("40HC"),
                quantity: 2,
            }],
        }))
        .apply(StepUpdate::Seafreight(Step5 {
            selections: vec![SeafreightSelection {
                carrier: Carrier { id: None, name: "doctor".to_string() },
                container: SeafreightContainer {
                    unit_price: Some(Decimal::from(3600)),
                    ..SeafreightContainer::default()
                },
                ..SeafreightSelection::default()
            }],
        }));
    let breakdown =
        price_draft(&PricingInput::new(&draft, Margin::percentage(Decimal::from(15)), "EUR"));

    if breakdown.grand_total == Decimal::from(8280) {
        DoctorCheck {
            name: "pricing_selfcheck",
            status: CheckStatus::Pass,
            details: "reference draft priced at 8280 EUR".to_string(),
        }
    } else {
        DoctorCheck {
            name: "pricing_selfcheck",
            status: CheckStatus::Fail,
            details: format!(
                "reference draft priced at {} EUR, expected 8280",
                breakdown.grand_total
            ),
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
