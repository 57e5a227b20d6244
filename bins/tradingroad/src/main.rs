//! TradingRoad CLI and Server Binary
//!
//! Entry point: initialises a configuration file, validates one, or starts
//! the derivatives analytics HTTP API.

use anyhow::{Context, Result};
use cli::{Cli, Commands, LogFormatArg};
use config::{
    generate_default_config, load_config, save_config, validate_config, validate_document, AppConfig,
};
use market_data::api::derivatives_routes;
use market_data::clients::{http_sources, ClientOptions};
use market_data::{DerivativesService, ServiceSettings};
use observability::{init_logging, init_metrics, LogFormat};
use server::{health_routes, validate_ports_available, HealthState, HttpServer, ServerConfig, ServerExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Start {
            config,
            http,
            host,
            log_format,
        } => start_command(config, http, host, log_format).await,
        Commands::Validate { config } => {
            init_logging("tradingroad", LogFormat::Pretty, "warn")?;
            validate_command(config)
        }
        Commands::Init { output, force } => {
            init_logging("tradingroad", LogFormat::Pretty, "info")?;
            init_command(output, force)
        }
    }
}

/// CLI flags win over the file
fn apply_overrides(
    config: &mut AppConfig,
    http: Option<u16>,
    host: Option<String>,
    log_format: Option<LogFormatArg>,
) {
    if let Some(port) = http {
        config.server.http_port = port;
    }
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(format) = log_format {
        config.logging.format = format.as_str().to_string();
    }
}

fn service_settings(config: &AppConfig) -> ServiceSettings {
    ServiceSettings {
        order_book_fetch_depth: config.derivatives.order_book_fetch_depth,
        order_book_display_depth: config.derivatives.order_book_display_depth,
        raw_data_limit: config.derivatives.raw_data_limit,
        cache_ttl: config.cache.ttl(),
        supported_currencies: config
            .derivatives
            .supported_currencies
            .iter()
            .map(|c| c.to_uppercase())
            .collect(),
    }
}

fn server_config(config: &AppConfig) -> ServerConfig {
    ServerConfig::new(config.server.host.clone(), config.server.http_port)
        .with_request_timeout(config.server.request_timeout())
        .with_cors(config.server.cors_allow_any_origin)
}

async fn start_command(
    config_path: Option<PathBuf>,
    http: Option<u16>,
    host: Option<String>,
    log_format: Option<LogFormatArg>,
) -> Result<()> {
    let mut config = match &config_path {
        Some(path) => load_config(path)?,
        None => generate_default_config(),
    };
    apply_overrides(&mut config, http, host, log_format);

    let format = config.logging.format.parse::<LogFormat>().unwrap_or_default();
    init_logging(&config.service.name, format, &config.logging.level)?;

    match &config_path {
        Some(path) => info!(?path, "Configuration loaded"),
        None => info!("No configuration file given, using defaults"),
    }

    let report = validate_config(&config);
    for warning in &report.warnings {
        warn!(field = %warning.field, message = %warning.message, "Configuration warning");
    }
    if !report.is_valid() {
        error!(
            error_count = report.errors.len(),
            "Configuration validation failed"
        );
        for err in &report.errors {
            error!("{}", err);
        }
        anyhow::bail!("Cannot start due to configuration errors");
    }

    if config.metrics.enabled {
        init_metrics(config.metrics.port)?;
    }

    let providers = &config.providers;
    let sources = http_sources(
        &ClientOptions::new(&providers.deribit.base_url, providers.deribit.timeout()),
        &ClientOptions::new(
            &providers.binance_futures.base_url,
            providers.binance_futures.timeout(),
        ),
    )
    .context("Failed to build upstream clients")?;

    let settings = service_settings(&config);
    debug!(?settings, "Derivatives service settings");
    let service = Arc::new(DerivativesService::new(sources, settings));

    let router = derivatives_routes(service).merge(health_routes(HealthState::new(
        config.service.name.clone(),
        env!("CARGO_PKG_VERSION"),
    )));

    let server_config = server_config(&config);
    validate_ports_available(&server_config).await?;

    info!(
        service = %config.service.name,
        environment = %config.service.environment,
        host = %server_config.host,
        http_port = server_config.http_port,
        cache_ttl_seconds = config.cache.ttl_seconds,
        "Starting TradingRoad"
    );

    HttpServer::new(server_config, router).run_with_ctrl_c().await?;

    info!("TradingRoad stopped");
    Ok(())
}

fn validate_command<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let config_path = config_path.as_ref();
    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

    let (config, report) = validate_document(&content)?;

    println!("\n=== Configuration Validation Report ===\n");

    if !report.defaults_applied.is_empty() {
        println!("Defaults Applied ({}):", report.defaults_applied.len());
        for default in &report.defaults_applied {
            println!("  [info] {} = {}", default.field, default.value);
        }
        println!();
    }

    if !report.warnings.is_empty() {
        println!("Warnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            println!("  [warn] [{}] {}", warning.field, warning.message);
        }
        println!();
    }

    if !report.errors.is_empty() {
        println!("Errors ({}):", report.errors.len());
        for err in &report.errors {
            println!("  [error] {}", err);
        }
        println!();
        anyhow::bail!("Configuration validation failed");
    }

    println!("[ok] Configuration is valid!");
    println!();
    println!("Service: {} ({})", config.service.name, config.service.environment);
    println!("Listen: {}:{}", config.server.host, config.server.http_port);
    println!("Deribit: {}", config.providers.deribit.base_url);
    println!("Binance futures: {}", config.providers.binance_futures.base_url);
    println!("Cache TTL: {}s", config.cache.ttl_seconds);
    println!(
        "Currencies: {}",
        config.derivatives.supported_currencies.join(", ")
    );

    Ok(())
}

fn init_command<P: AsRef<Path>>(output_path: P, force: bool) -> Result<()> {
    let output_path = output_path.as_ref();
    if output_path.exists() && !force {
        anyhow::bail!(
            "{:?} already exists; pass --force to overwrite",
            output_path
        );
    }

    let config = generate_default_config();

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    save_config(&config, output_path)?;

    println!("[ok] Configuration file created successfully!");
    println!();
    println!("Location: {:?}", output_path);
    println!();
    println!("Next steps:");
    println!("  1. Edit provider URLs, cache TTL and currencies as needed");
    println!(
        "  2. Run 'tradingroad validate --config {:?}' to check configuration",
        output_path
    );
    println!(
        "  3. Run 'tradingroad start --config {:?}' to start the API",
        output_path
    );

    Ok(())
}
