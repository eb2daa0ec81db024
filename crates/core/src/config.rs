use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::finalize::{Margin, MarginType};

const DEFAULT_CONFIG_FILE: &str = "freightdesk.toml";
const MAX_ROUNDING_SCALE: u32 = 6;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AppConfig {
    pub pricing: PricingConfig,
    pub recap: RecapConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PricingConfig {
    pub currency: String,
    pub margin_type: MarginType,
    pub margin_value: Decimal,
    /// Decimal places of displayed totals. Sums are computed unrounded.
    pub rounding_scale: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RecapConfig {
    pub template_path: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub currency: Option<String>,
    pub margin_type: Option<MarginType>,
    pub margin_value: Option<Decimal>,
    pub rounding_scale: Option<u32>,
    pub recap_template_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pricing: PricingConfig {
                currency: "EUR".to_string(),
                margin_type: MarginType::Percentage,
                margin_value: Decimal::ZERO,
                rounding_scale: 2,
            },
            recap: RecapConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl PricingConfig {
    /// Margin applied when a command does not pass one explicitly.
    pub fn default_margin(&self) -> Margin {
        Margin { kind: self.margin_type, value: self.margin_value }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(pricing) = patch.pricing {
            if let Some(currency) = pricing.currency {
                self.pricing.currency = currency;
            }
            if let Some(margin_type) = pricing.margin_type {
                self.pricing.margin_type = margin_type;
            }
            if let Some(margin_value) = pricing.margin_value {
                self.pricing.margin_value = margin_value;
            }
            if let Some(rounding_scale) = pricing.rounding_scale {
                self.pricing.rounding_scale = rounding_scale;
            }
        }

        if let Some(recap) = patch.recap {
            if let Some(template_path) = recap.template_path {
                self.recap.template_path = Some(template_path);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("FREIGHTDESK_PRICING_CURRENCY") {
            self.pricing.currency = value;
        }
        if let Some(value) = read_env("FREIGHTDESK_PRICING_MARGIN_TYPE") {
            self.pricing.margin_type = value.parse().map_err(|_| {
                ConfigError::InvalidEnvOverride {
                    key: "FREIGHTDESK_PRICING_MARGIN_TYPE".to_string(),
                    value: value.clone(),
                }
            })?;
        }
        if let Some(value) = read_env("FREIGHTDESK_PRICING_MARGIN_VALUE") {
            self.pricing.margin_value = parse_decimal("FREIGHTDESK_PRICING_MARGIN_VALUE", &value)?;
        }
        if let Some(value) = read_env("FREIGHTDESK_PRICING_ROUNDING_SCALE") {
            self.pricing.rounding_scale = parse_u32("FREIGHTDESK_PRICING_ROUNDING_SCALE", &value)?;
        }

        if let Some(value) = read_env("FREIGHTDESK_RECAP_TEMPLATE_PATH") {
            self.recap.template_path = Some(PathBuf::from(value));
        }

        let log_level =
            read_env("FREIGHTDESK_LOGGING_LEVEL").or_else(|| read_env("FREIGHTDESK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("FREIGHTDESK_LOGGING_FORMAT").or_else(|| read_env("FREIGHTDESK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(currency) = overrides.currency {
            self.pricing.currency = currency;
        }
        if let Some(margin_type) = overrides.margin_type {
            self.pricing.margin_type = margin_type;
        }
        if let Some(margin_value) = overrides.margin_value {
            self.pricing.margin_value = margin_value;
        }
        if let Some(rounding_scale) = overrides.rounding_scale {
            self.pricing.rounding_scale = rounding_scale;
        }
        if let Some(template_path) = overrides.recap_template_path {
            self.recap.template_path = Some(template_path);
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_pricing(&self.pricing)?;
        validate_recap(&self.recap)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from("config").join(DEFAULT_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_pricing(pricing: &PricingConfig) -> Result<(), ConfigError> {
    let currency = pricing.currency.as_str();
    if currency.len() != 3 || !currency.chars().all(|ch| ch.is_ascii_uppercase()) {
        return Err(ConfigError::Validation(format!(
            "pricing.currency must be a three-letter upper-case code, got `{currency}`"
        )));
    }

    if pricing.margin_value < Decimal::ZERO {
        return Err(ConfigError::Validation(
            "pricing.margin_value must not be negative".to_string(),
        ));
    }

    if pricing.rounding_scale > MAX_ROUNDING_SCALE {
        return Err(ConfigError::Validation(format!(
            "pricing.rounding_scale must be between 0 and {MAX_ROUNDING_SCALE}"
        )));
    }

    Ok(())
}

fn validate_recap(recap: &RecapConfig) -> Result<(), ConfigError> {
    match &recap.template_path {
        Some(path) if path.as_os_str().is_empty() => Err(ConfigError::Validation(
            "recap.template_path must not be empty when set".to_string(),
        )),
        _ => Ok(()),
    }
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_decimal(key: &str, value: &str) -> Result<Decimal, ConfigError> {
    value.trim().parse::<Decimal>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    pricing: Option<PricingPatch>,
    recap: Option<RecapPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct PricingPatch {
    currency: Option<String>,
    margin_type: Option<MarginType>,
    margin_value: Option<Decimal>,
    rounding_scale: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct RecapPatch {
    template_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use rust_decimal::Decimal;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
    use crate::domain::finalize::MarginType;

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    fn load_from(dir: &TempDir, contents: &str) -> Result<AppConfig, String> {
        let path = dir.path().join("freightdesk.toml");
        fs::write(&path, contents).map_err(|err| err.to_string())?;
        AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
            .map_err(|err| format!("config load failed: {err}"))
    }

    #[test]
    fn defaults_price_in_euro_without_margin() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::default();
        ensure(config.pricing.currency == "EUR", "default currency should be EUR")?;
        ensure(config.pricing.margin_value == Decimal::ZERO, "default margin should be zero")?;
        ensure(config.pricing.rounding_scale == 2, "default rounding scale should be 2")?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )?;
        ensure(config.validate().is_ok(), "defaults should validate")
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_FREIGHTDESK_CURRENCY", "USD");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let config = load_from(
                &dir,
                r#"
[pricing]
currency = "${TEST_FREIGHTDESK_CURRENCY}"
margin_type = "amount"
margin_value = "125.50"

[recap]
template_path = "templates/recap.txt"
"#,
            )?;

            ensure(config.pricing.currency == "USD", "currency should be interpolated from env")?;
            ensure(
                config.pricing.default_margin().kind == MarginType::Amount,
                "margin type should come from the file",
            )?;
            ensure(
                config.pricing.margin_value == Decimal::new(12550, 2),
                "margin value should be parsed as a decimal",
            )?;
            ensure(
                config.recap.template_path == Some(PathBuf::from("templates/recap.txt")),
                "template path should come from the file",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_FREIGHTDESK_CURRENCY"]);
        result
    }

    #[test]
    fn missing_interpolation_variable_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&["TEST_FREIGHTDESK_UNSET"]);

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("freightdesk.toml");
        fs::write(&path, "[pricing]\ncurrency = \"${TEST_FREIGHTDESK_UNSET}\"\n")
            .map_err(|err| err.to_string())?;

        let error =
            AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() });
        ensure(
            matches!(
                error,
                Err(ConfigError::MissingEnvInterpolation { ref var })
                    if var == "TEST_FREIGHTDESK_UNSET"
            ),
            "missing variable should be named in the error",
        )
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("FREIGHTDESK_LOG_LEVEL", "warn");
        env::set_var("FREIGHTDESK_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "json logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["FREIGHTDESK_LOG_LEVEL", "FREIGHTDESK_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("FREIGHTDESK_PRICING_CURRENCY", "GBP");
        env::set_var("FREIGHTDESK_PRICING_MARGIN_VALUE", "12");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("freightdesk.toml");
            fs::write(
                &path,
                r#"
[pricing]
currency = "USD"
margin_value = 5
rounding_scale = 3

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    margin_value: Some(Decimal::from(20)),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.pricing.currency == "GBP", "env currency should win over the file")?;
            ensure(
                config.pricing.margin_value == Decimal::from(20),
                "override margin should win over env and file",
            )?;
            ensure(
                config.pricing.rounding_scale == 3,
                "file rounding scale should win over defaults",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            Ok(())
        })();

        clear_vars(&["FREIGHTDESK_PRICING_CURRENCY", "FREIGHTDESK_PRICING_MARGIN_VALUE"]);
        result
    }

    #[test]
    fn invalid_env_values_are_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("FREIGHTDESK_PRICING_MARGIN_TYPE", "markup");

        let result = (|| -> Result<(), String> {
            let error = AppConfig::load(LoadOptions::default());
            ensure(
                matches!(
                    error,
                    Err(ConfigError::InvalidEnvOverride { ref key, .. })
                        if key == "FREIGHTDESK_PRICING_MARGIN_TYPE"
                ),
                "unknown margin type should be rejected",
            )
        })();

        clear_vars(&["FREIGHTDESK_PRICING_MARGIN_TYPE"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("FREIGHTDESK_PRICING_CURRENCY", "euro");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("pricing.currency")
            );
            ensure(has_message, "validation failure should mention pricing.currency")
        })();

        clear_vars(&["FREIGHTDESK_PRICING_CURRENCY"]);
        result
    }

    #[test]
    fn rounding_scale_and_margin_bounds_are_enforced() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let scale = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides { rounding_scale: Some(7), ..ConfigOverrides::default() },
            ..LoadOptions::default()
        });
        ensure(
            matches!(
                scale,
                Err(ConfigError::Validation(ref message)) if message.contains("rounding_scale")
            ),
            "rounding scale above 6 should be rejected",
        )?;

        let margin = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                margin_value: Some(Decimal::from(-1)),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });
        ensure(
            matches!(
                margin,
                Err(ConfigError::Validation(ref message)) if message.contains("margin_value")
            ),
            "negative margin should be rejected",
        )
    }

    #[test]
    fn required_file_must_exist() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("absent.toml");
        let error = AppConfig::load(LoadOptions {
            config_path: Some(path.clone()),
            require_file: true,
            ..LoadOptions::default()
        });
        ensure(
            matches!(error, Err(ConfigError::MissingConfigFile(ref missing)) if *missing == path),
            "missing required file should be reported with its path",
        )
    }
}
