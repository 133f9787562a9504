use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tablescout_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let source = |key_path: &str, env_key: &str| {
        field_source(key_path, env_key, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "provider.backend",
        &format!("{:?}", config.provider.backend),
        source("provider.backend", "TABLESCOUT_PROVIDER_BACKEND"),
    ));
    lines.push(render_line(
        "provider.api_key",
        "<redacted>",
        source("provider.api_key", "TABLESCOUT_PROVIDER_API_KEY"),
    ));
    lines.push(render_line(
        "provider.timeout_secs",
        &config.provider.timeout_secs.to_string(),
        source("provider.timeout_secs", "TABLESCOUT_PROVIDER_TIMEOUT_SECS"),
    ));
    lines.push(render_line(
        "provider.radius_m",
        &config.provider.radius_m.to_string(),
        source("provider.radius_m", "TABLESCOUT_PROVIDER_RADIUS_M"),
    ));
    lines.push(render_line(
        "provider.page_size",
        &config.provider.page_size.to_string(),
        source("provider.page_size", "TABLESCOUT_PROVIDER_PAGE_SIZE"),
    ));
    lines.push(render_line(
        "provider.default_city",
        &config.provider.default_city,
        source("provider.default_city", "TABLESCOUT_PROVIDER_DEFAULT_CITY"),
    ));

    lines.push(render_line(
        "llm.enabled",
        &config.llm.enabled.to_string(),
        source("llm.enabled", "TABLESCOUT_LLM_ENABLED"),
    ));
    lines.push(render_line(
        "llm.model",
        &config.llm.model,
        source("llm.model", "TABLESCOUT_LLM_MODEL"),
    ));
    lines.push(render_line(
        "llm.base_url",
        config.llm.base_url.as_deref().unwrap_or("<unset>"),
        source("llm.base_url", "TABLESCOUT_LLM_BASE_URL"),
    ));
    let llm_api_key = if config.llm.api_key.is_some() { "<redacted>" } else { "<unset>" };
    lines.push(render_line(
        "llm.api_key",
        llm_api_key,
        source("llm.api_key", "TABLESCOUT_LLM_API_KEY"),
    ));

    lines.push(render_line(
        "server.bind_address",
        &config.server.bind_address,
        source("server.bind_address", "TABLESCOUT_SERVER_BIND_ADDRESS"),
    ));
    lines.push(render_line(
        "server.port",
        &config.server.port.to_string(),
        source("server.port", "TABLESCOUT_SERVER_PORT"),
    ));
    lines.push(render_line(
        "server.health_check_port",
        &config.server.health_check_port.to_string(),
        source("server.health_check_port", "TABLESCOUT_SERVER_HEALTH_CHECK_PORT"),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", "TABLESCOUT_LOGGING_LEVEL"),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", "TABLESCOUT_LOGGING_FORMAT"),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("tablescout.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/tablescout.toml");
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
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
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
