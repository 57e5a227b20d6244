use crate::*;
use anyhow::{Context, Result};
use thiserror::Error;
use url::Url;

const LOG_FORMATS: [&str; 3] = ["pretty", "json", "compact"];
const MAX_TIMEOUT_SECONDS: u64 = 60;
const RECOMMENDED_TIMEOUT_SECONDS: std::ops::RangeInclusive<u64> = 10..=15;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Service name is required")]
    MissingServiceName,

    #[error("cache.ttl_seconds must be a positive integer")]
    InvalidCacheTtl,

    #[error("Provider '{name}': {message}")]
    InvalidProvider { name: String, message: String },

    #[error("{field} must be a positive integer")]
    InvalidPositiveInteger { field: String },

    #[error("At least one supported currency is required")]
    NoSupportedCurrencies,

    #[error("Invalid currency '{0}': expected 1-20 ASCII letters or digits")]
    InvalidCurrency(String),

    #[error("Invalid log format: {0}. Must be one of: pretty, json, compact")]
    InvalidLogFormat(String),

    #[error(
        "server.request_timeout_seconds ({timeout}) must cover the upstream timeouts of one request ({budget})"
    )]
    RequestTimeoutTooShort { timeout: u64, budget: u64 },

    #[error("metrics.port {port} collides with server.http_port")]
    PortConflict { port: u16 },

    #[error("Environment variable '{var}' is missing or invalid: {message}")]
    InvalidEnvVar { var: String, message: String },
}

#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct DefaultApplied {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
    pub defaults_applied: Vec<DefaultApplied>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            defaults_applied: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationWarning {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn add_default(&mut self, field: &str, value: &str) {
        self.defaults_applied.push(DefaultApplied {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

pub fn validate_config(config: &AppConfig) -> ValidationReport {
    let mut report = ValidationReport::new();

    if config.service.name.trim().is_empty() {
        report.add_error(ValidationError::MissingServiceName);
    }

    validate_server(config, &mut report);
    validate_provider("deribit", &config.providers.deribit, &mut report);
    validate_provider("binance_futures", &config.providers.binance_futures, &mut report);

    if config.cache.ttl_seconds == 0 {
        report.add_error(ValidationError::InvalidCacheTtl);
    }

    validate_derivatives(&config.derivatives, &mut report);

    report
}

/// Parse a YAML document and validate it, recording the sections that fell
/// back to defaults and any `${VAR}` left unresolved.
pub fn validate_document(content: &str) -> Result<(AppConfig, ValidationReport)> {
    let substituted = substitution::substitute_env_vars(content)?;
    let raw: serde_yaml::Value = serde_yaml::from_str(&substituted)
        .with_context(|| "Failed to parse YAML configuration")?;
    let config: AppConfig = serde_yaml::from_value(raw.clone())
        .with_context(|| "Configuration does not match the expected schema")?;

    let mut report = validate_config(&config);
    record_defaults(&raw, &config, &mut report);

    if has_unresolved_env_vars(&substituted) {
        for var in unresolved_vars(&substituted) {
            report.add_error(ValidationError::InvalidEnvVar {
                var,
                message: "not set".to_string(),
            });
        }
    }

    Ok((config, report))
}

fn unresolved_vars(content: &str) -> Vec<String> {
    let mut vars: Vec<String> = content
        .split('$')
        .skip(1)
        .filter_map(|rest| {
            let rest = rest.strip_prefix('{').unwrap_or(rest);
            let name: String = rest
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
                .collect();
            (!name.is_empty()).then_some(name)
        })
        .collect();
    vars.sort();
    vars.dedup();
    vars
}

fn record_defaults(raw: &serde_yaml::Value, config: &AppConfig, report: &mut ValidationReport) {
    let has = |section: &str, key: Option<&str>| {
        let section = raw.get(section);
        match key {
            None => section.is_some(),
            Some(key) => section.and_then(|s| s.get(key)).is_some(),
        }
    };

    if !has("server", Some("http_port")) {
        report.add_default("server.http_port", &config.server.http_port.to_string());
    }
    if !has("logging", Some("level")) {
        report.add_default("logging.level", &config.logging.level);
    }
    if !has("cache", Some("ttl_seconds")) {
        report.add_default("cache.ttl_seconds", &config.cache.ttl_seconds.to_string());
    }
    if !has("providers", Some("deribit")) {
        report.add_default("providers.deribit.base_url", &config.providers.deribit.base_url);
    }
    if !has("providers", Some("binance_futures")) {
        report.add_default(
            "providers.binance_futures.base_url",
            &config.providers.binance_futures.base_url,
        );
    }
    if !has("derivatives", Some("supported_currencies")) {
        report.add_default(
            "derivatives.supported_currencies",
            &config.derivatives.supported_currencies.join(","),
        );
    }
}

fn validate_server(config: &AppConfig, report: &mut ValidationReport) {
    if config.server.http_port == 0 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "server.http_port".to_string(),
        });
    }

    if config.server.request_timeout_seconds == 0 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "server.request_timeout_seconds".to_string(),
        });
    }

    // A request may wait on a Deribit fetch and then a Binance fetch
    let budget = config
        .providers
        .deribit
        .timeout_seconds
        .saturating_add(config.providers.binance_futures.timeout_seconds);
    if config.server.request_timeout_seconds > 0 && config.server.request_timeout_seconds < budget {
        report.add_error(ValidationError::RequestTimeoutTooShort {
            timeout: config.server.request_timeout_seconds,
            budget,
        });
    }

    if !LOG_FORMATS.contains(&config.logging.format.to_lowercase().as_str()) {
        report.add_error(ValidationError::InvalidLogFormat(config.logging.format.clone()));
    }

    if config.metrics.enabled && config.metrics.port == config.server.http_port {
        report.add_error(ValidationError::PortConflict {
            port: config.metrics.port,
        });
    }
}

fn validate_provider(name: &str, provider: &ProviderConfig, report: &mut ValidationReport) {
    let invalid = |message: String| ValidationError::InvalidProvider {
        name: name.to_string(),
        message,
    };

    match Url::parse(&provider.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            if url.scheme() == "http" {
                report.add_warning(
                    &format!("providers.{}.base_url", name),
                    "Plain http base URL; use https outside local testing",
                );
            }
        }
        Ok(url) => report.add_error(invalid(format!(
            "base_url scheme must be http or https, got '{}'",
            url.scheme()
        ))),
        Err(e) => report.add_error(invalid(format!(
            "base_url '{}' is not a valid URL: {}",
            provider.base_url, e
        ))),
    }

    if provider.timeout_seconds == 0 || provider.timeout_seconds > MAX_TIMEOUT_SECONDS {
        report.add_error(invalid(format!(
            "timeout_seconds must be between 1 and {}, got {}",
            MAX_TIMEOUT_SECONDS, provider.timeout_seconds
        )));
    } else if !RECOMMENDED_TIMEOUT_SECONDS.contains(&provider.timeout_seconds) {
        report.add_warning(
            &format!("providers.{}.timeout_seconds", name),
            "Recommended upstream timeout is 10-15 seconds",
        );
    }
}

fn validate_derivatives(derivatives: &DerivativesConfig, report: &mut ValidationReport) {
    if derivatives.supported_currencies.is_empty() {
        report.add_error(ValidationError::NoSupportedCurrencies);
    }

    for currency in &derivatives.supported_currencies {
        let valid = !currency.is_empty()
            && currency.len() <= 20
            && currency.chars().all(|c| c.is_ascii_alphanumeric());
        if !valid {
            report.add_error(ValidationError::InvalidCurrency(currency.clone()));
        }
    }

    for (field, value) in [
        ("derivatives.order_book_fetch_depth", derivatives.order_book_fetch_depth),
        ("derivatives.order_book_display_depth", derivatives.order_book_display_depth),
        ("derivatives.raw_data_limit", derivatives.raw_data_limit),
    ] {
        if value == 0 {
            report.add_error(ValidationError::InvalidPositiveInteger {
                field: field.to_string(),
            });
        }
    }

    if derivatives.order_book_display_depth > derivatives.order_book_fetch_depth {
        report.add_warning(
            "derivatives.order_book_display_depth",
            "Display depth exceeds fetch depth; coarse books may be thinner than requested",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let report = validate_config(&AppConfig::default());
        assert!(report.is_valid(), "{:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let mut config = AppConfig::default();
        config.cache.ttl_seconds = 0;
        assert_eq!(validate_config(&config).errors, vec![ValidationError::InvalidCacheTtl]);
    }

    #[test]
    fn test_provider_timeouts() {
        let mut config = AppConfig::default();
        config.providers.deribit.timeout_seconds = 90;
        config.providers.binance_futures.timeout_seconds = 30;
        config.server.request_timeout_seconds = 120;

        let report = validate_config(&config);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].to_string().contains("deribit"));
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].field, "providers.binance_futures.timeout_seconds");
    }

    #[test]
    fn test_request_timeout_covers_upstream() {
        let mut config = AppConfig::default();
        config.server.request_timeout_seconds = 20;

        assert_eq!(
            validate_config(&config).errors,
            vec![ValidationError::RequestTimeoutTooShort {
                timeout: 20,
                budget: 25
            }]
        );

        config.server.request_timeout_seconds = 25;
        assert!(validate_config(&config).is_valid());
    }

    #[test]
    fn test_bad_base_urls() {
        let mut config = AppConfig::default();
        config.providers.deribit.base_url = "ftp://deribit.com".to_string();
        config.providers.binance_futures.base_url = "not a url".to_string();

        let report = validate_config(&config);
        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    fn test_derivatives_rules() {
        let mut config = AppConfig::default();
        config.derivatives.supported_currencies = vec![];
        config.derivatives.order_book_display_depth = 0;

        let report = validate_config(&config);
        assert!(report.errors.contains(&ValidationError::NoSupportedCurrencies));
        assert!(report.errors.contains(&ValidationError::InvalidPositiveInteger {
            field: "derivatives.order_book_display_depth".to_string()
        }));

        config.derivatives.supported_currencies = vec!["BTC-USD".to_string()];
        config.derivatives.order_book_display_depth = 20;
        assert_eq!(
            validate_config(&config).errors,
            vec![ValidationError::InvalidCurrency("BTC-USD".to_string())]
        );
    }

    #[test]
    fn test_log_format_and_port_conflict() {
        let mut config = AppConfig::default();
        config.logging.format = "xml".to_string();
        config.metrics.enabled = true;
        config.metrics.port = config.server.http_port;

        let report = validate_config(&config);
        assert!(report.errors.contains(&ValidationError::InvalidLogFormat("xml".to_string())));
        assert!(report.errors.contains(&ValidationError::PortConflict { port: 8080 }));
    }

    #[test]
    fn test_document_records_defaults_and_missing_vars() {
        std::env::remove_var("TR_VALIDATE_MISSING_URL");
        let yaml = r#"
server:
  http_port: 8081
providers:
  deribit:
    base_url: "${TR_VALIDATE_MISSING_URL}"
    timeout_seconds: 15
"#;
        let (config, report) = validate_document(yaml).unwrap();
        assert_eq!(config.server.http_port, 8081);
        assert!(report
            .defaults_applied
            .iter()
            .any(|d| d.field == "cache.ttl_seconds" && d.value == "300"));
        assert!(!report.defaults_applied.iter().any(|d| d.field == "server.http_port"));
        assert!(report.errors.contains(&ValidationError::InvalidEnvVar {
            var: "TR_VALIDATE_MISSING_URL".to_string(),
            message: "not set".to_string(),
        }));
    }
}
