use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use freightdesk_core::config::{AppConfig, ConfigOverrides};
use toml::Value;

use crate::commands::{load_config, CommandResult};

const COMMAND: &str = "config";

struct Field {
    key_path: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

pub fn run(config_path: Option<&Path>) -> CommandResult {
    let config = match load_config(COMMAND, config_path, ConfigOverrides::default()) {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let config_file_path = detect_config_path(config_path);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key_path,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key_path, &field.value, source));
    }

    CommandResult::text(lines.join("\n"))
}

fn fields(config: &AppConfig) -> Vec<Field> {
    vec![
        Field {
            key_path: "pricing.currency",
            env_keys: &["FREIGHTDESK_PRICING_CURRENCY"],
            value: config.pricing.currency.clone(),
        },
        Field {
            key_path: "pricing.margin_type",
            env_keys: &["FREIGHTDESK_PRICING_MARGIN_TYPE"],
            value: format!("{:?}", config.pricing.margin_type),
        },
        Field {
            key_path: "pricing.margin_value",
            env_keys: &["FREIGHTDESK_PRICING_MARGIN_VALUE"],
            value: config.pricing.margin_value.to_string(),
        },
        Field {
            key_path: "pricing.rounding_scale",
            env_keys: &["FREIGHTDESK_PRICING_ROUNDING_SCALE"],
            value: config.pricing.rounding_scale.to_string(),
        },
        Field {
            key_path: "recap.template_path",
            env_keys: &["FREIGHTDESK_RECAP_TEMPLATE_PATH"],
            value: config
                .recap
                .template_path
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "<built-in>".to_string()),
        },
        Field {
            key_path: "logging.level",
            env_keys: &["FREIGHTDESK_LOGGING_LEVEL", "FREIGHTDESK_LOG_LEVEL"],
            value: config.logging.level.clone(),
        },
        Field {
            key_path: "logging.format",
            env_keys: &["FREIGHTDESK_LOGGING_FORMAT", "FREIGHTDESK_LOG_FORMAT"],
            value: format!("{:?}", config.logging.format),
        },
    ]
}

fn detect_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then(|| path.to_path_buf());
    }

    let root = PathBuf::from("freightdesk.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/freightdesk.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let env_hit = env_keys
        .iter()
        .find(|key| env::var(key).map(|value| !value.trim().is_empty()).unwrap_or(false));
    if let Some(env_key) = env_hit {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
