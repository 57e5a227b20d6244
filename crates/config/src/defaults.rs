use super::ProviderConfig;

pub fn default_enabled() -> bool {
    true
}

pub fn default_service_name() -> String {
    "tradingroad".to_string()
}

pub fn default_environment() -> String {
    "development".to_string()
}

pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub fn default_http_port() -> u16 {
    8080
}

pub fn default_request_timeout_seconds() -> u64 {
    30
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_log_format() -> String {
    "pretty".to_string()
}

pub fn default_metrics_port() -> u16 {
    9090
}

pub fn default_deribit() -> ProviderConfig {
    ProviderConfig {
        base_url: "https://www.deribit.com/api/v2".to_string(),
        timeout_seconds: 15,
    }
}

pub fn default_binance_futures() -> ProviderConfig {
    ProviderConfig {
        base_url: "https://fapi.binance.com".to_string(),
        timeout_seconds: 10,
    }
}

pub fn default_ttl_seconds() -> u64 {
    300
}

pub fn default_supported_currencies() -> Vec<String> {
    vec!["BTC".to_string(), "ETH".to_string()]
}

pub fn default_order_book_fetch_depth() -> usize {
    100
}

pub fn default_order_book_display_depth() -> usize {
    20
}

pub fn default_raw_data_limit() -> usize {
    1000
}
