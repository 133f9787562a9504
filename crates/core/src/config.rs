use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub llm: LlmConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub backend: ProviderKind,
    pub api_key: SecretString,
    /// Override for the provider's API host; mainly for tests.
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub radius_m: u32,
    pub page_size: u32,
    pub default_city: String,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub enabled: bool,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub health_check_port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Amap,
    Baidu,
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
    pub provider_backend: Option<ProviderKind>,
    pub provider_api_key: Option<String>,
    pub provider_base_url: Option<String>,
    pub default_city: Option<String>,
    pub log_level: Option<String>,
    pub llm_enabled: Option<bool>,
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
            provider: ProviderConfig {
                backend: ProviderKind::Amap,
                api_key: String::new().into(),
                base_url: None,
                timeout_secs: 10,
                radius_m: 3000,
                page_size: 20,
                default_city: "北京".to_string(),
            },
            llm: LlmConfig {
                enabled: false,
                api_key: None,
                base_url: Some(
                    "https://dashscope.aliyuncs.com/compatible-mode/v1".to_string(),
                ),
                model: "qwen-plus".to_string(),
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                health_check_port: 8081,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "amap" => Ok(Self::Amap),
            "baidu" => Ok(Self::Baidu),
            other => Err(ConfigError::Validation(format!(
                "unsupported provider backend `{other}` (expected amap|baidu)"
            ))),
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

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from("tablescout.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(provider) = patch.provider {
            if let Some(backend) = provider.backend {
                self.provider.backend = backend;
            }
            if let Some(api_key_value) = provider.api_key {
                self.provider.api_key = secret_value(api_key_value);
            }
            if let Some(base_url) = provider.base_url {
                self.provider.base_url = Some(base_url);
            }
            if let Some(timeout_secs) = provider.timeout_secs {
                self.provider.timeout_secs = timeout_secs;
            }
            if let Some(radius_m) = provider.radius_m {
                self.provider.radius_m = radius_m;
            }
            if let Some(page_size) = provider.page_size {
                self.provider.page_size = page_size;
            }
            if let Some(default_city) = provider.default_city {
                self.provider.default_city = default_city;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(enabled) = llm.enabled {
                self.llm.enabled = enabled;
            }
            if let Some(api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = Some(base_url);
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
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
        if let Some(value) = read_env("TABLESCOUT_PROVIDER_BACKEND") {
            self.provider.backend = value.parse()?;
        }
        if let Some(value) = read_env("TABLESCOUT_PROVIDER_API_KEY") {
            self.provider.api_key = secret_value(value);
        }
        if let Some(value) = read_env("TABLESCOUT_PROVIDER_BASE_URL") {
            self.provider.base_url = Some(value);
        }
        if let Some(value) = read_env("TABLESCOUT_PROVIDER_TIMEOUT_SECS") {
            self.provider.timeout_secs = parse_u64("TABLESCOUT_PROVIDER_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("TABLESCOUT_PROVIDER_RADIUS_M") {
            self.provider.radius_m = parse_u32("TABLESCOUT_PROVIDER_RADIUS_M", &value)?;
        }
        if let Some(value) = read_env("TABLESCOUT_PROVIDER_PAGE_SIZE") {
            self.provider.page_size = parse_u32("TABLESCOUT_PROVIDER_PAGE_SIZE", &value)?;
        }
        if let Some(value) = read_env("TABLESCOUT_PROVIDER_DEFAULT_CITY") {
            self.provider.default_city = value;
        }

        if let Some(value) = read_env("TABLESCOUT_LLM_ENABLED") {
            self.llm.enabled = parse_bool("TABLESCOUT_LLM_ENABLED", &value)?;
        }
        if let Some(value) = read_env("TABLESCOUT_LLM_API_KEY") {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("TABLESCOUT_LLM_BASE_URL") {
            self.llm.base_url = Some(value);
        }
        if let Some(value) = read_env("TABLESCOUT_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("TABLESCOUT_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("TABLESCOUT_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("TABLESCOUT_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("TABLESCOUT_SERVER_PORT") {
            self.server.port = parse_u16("TABLESCOUT_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("TABLESCOUT_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port =
                parse_u16("TABLESCOUT_SERVER_HEALTH_CHECK_PORT", &value)?;
        }
        if let Some(value) = read_env("TABLESCOUT_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("TABLESCOUT_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("TABLESCOUT_LOGGING_LEVEL").or_else(|| read_env("TABLESCOUT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("TABLESCOUT_LOGGING_FORMAT").or_else(|| read_env("TABLESCOUT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(backend) = overrides.provider_backend {
            self.provider.backend = backend;
        }
        if let Some(api_key) = overrides.provider_api_key {
            self.provider.api_key = secret_value(api_key);
        }
        if let Some(base_url) = overrides.provider_base_url {
            self.provider.base_url = Some(base_url);
        }
        if let Some(default_city) = overrides.default_city {
            self.provider.default_city = default_city;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(llm_enabled) = overrides.llm_enabled {
            self.llm.enabled = llm_enabled;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_provider(&self.provider)?;
        validate_llm(&self.llm)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("tablescout.toml"), PathBuf::from("config/tablescout.toml")]
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

fn validate_provider(provider: &ProviderConfig) -> Result<(), ConfigError> {
    if provider.api_key.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "provider.api_key is required (your Amap or Baidu web service key)".to_string(),
        ));
    }

    if provider.timeout_secs == 0 || provider.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "provider.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if provider.radius_m == 0 || provider.radius_m > 50_000 {
        return Err(ConfigError::Validation(
            "provider.radius_m must be in range 1..=50000".to_string(),
        ));
    }

    if provider.page_size == 0 || provider.page_size > 25 {
        return Err(ConfigError::Validation(
            "provider.page_size must be in range 1..=25".to_string(),
        ));
    }

    if provider.default_city.trim().is_empty() {
        return Err(ConfigError::Validation(
            "provider.default_city must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if llm.enabled {
        let key_missing = llm
            .api_key
            .as_ref()
            .map(|value| value.expose_secret().trim().is_empty())
            .unwrap_or(true);
        if key_missing {
            return Err(ConfigError::Validation(
                "llm.api_key is required when llm.enabled is true".to_string(),
            ));
        }

        let url_missing =
            llm.base_url.as_ref().map(|value| value.trim().is_empty()).unwrap_or(true);
        if url_missing {
            return Err(ConfigError::Validation(
                "llm.base_url is required when llm.enabled is true".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.health_check_port == 0 {
        return Err(ConfigError::Validation(
            "server.health_check_port must be greater than zero".to_string(),
        ));
    }

    if server.port == server.health_check_port {
        return Err(ConfigError::Validation(
            "server.port and server.health_check_port must differ".to_string(),
        ));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
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

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    provider: Option<ProviderPatch>,
    llm: Option<LlmPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderPatch {
    backend: Option<ProviderKind>,
    api_key: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    radius_m: Option<u32>,
    page_size: Option<u32>,
    default_city: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    enabled: Option<bool>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    health_check_port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
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
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat, ProviderKind};

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

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_PROVIDER_KEY", "key-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("tablescout.toml");
            fs::write(
                &path,
                r#"
[provider]
backend = "baidu"
api_key = "${TEST_PROVIDER_KEY}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.provider.api_key.expose_secret() == "key-from-env",
                "api key should be loaded from environment",
            )?;
            ensure(
                config.provider.backend == ProviderKind::Baidu,
                "backend should be loaded from file",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_PROVIDER_KEY"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TABLESCOUT_PROVIDER_API_KEY", "key-from-env");
        env::set_var("TABLESCOUT_PROVIDER_DEFAULT_CITY", "上海");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("tablescout.toml");
            fs::write(
                &path,
                r#"
[provider]
api_key = "key-from-file"
default_city = "广州"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.provider.api_key.expose_secret() == "key-from-env",
                "env api key should win over file",
            )?;
            ensure(config.provider.default_city == "上海", "env default city should win")?;
            ensure(config.logging.level == "debug", "programmatic override should win")?;
            Ok(())
        })();

        clear_vars(&["TABLESCOUT_PROVIDER_API_KEY", "TABLESCOUT_PROVIDER_DEFAULT_CITY"]);
        result
    }

    #[test]
    fn validation_fails_fast_without_provider_key() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let error = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => return Err("expected validation failure without an api key".to_string()),
            Err(error) => error,
        };
        let has_message = matches!(
            error,
            ConfigError::Validation(ref message) if message.contains("provider.api_key")
        );
        ensure(has_message, "validation failure should mention provider.api_key")
    }

    #[test]
    fn invalid_backend_env_value_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TABLESCOUT_PROVIDER_BACKEND", "osm");
        env::set_var("TABLESCOUT_PROVIDER_API_KEY", "some-key");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected backend parse failure".to_string()),
                Err(error) => error,
            };
            ensure(
                error.to_string().contains("unsupported provider backend"),
                "error should name the unsupported backend",
            )
        })();

        clear_vars(&["TABLESCOUT_PROVIDER_BACKEND", "TABLESCOUT_PROVIDER_API_KEY"]);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TABLESCOUT_PROVIDER_API_KEY", "super-secret-key");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(
                !debug.contains("super-secret-key"),
                "debug output should not contain the api key",
            )?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            Ok(())
        })();

        clear_vars(&["TABLESCOUT_PROVIDER_API_KEY"]);
        result
    }

    #[test]
    fn llm_enabled_requires_key_and_base_url() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TABLESCOUT_PROVIDER_API_KEY", "some-key");
        env::set_var("TABLESCOUT_LLM_ENABLED", "true");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected llm validation failure".to_string()),
                Err(error) => error,
            };
            ensure(
                error.to_string().contains("llm.api_key"),
                "validation failure should mention llm.api_key",
            )
        })();

        clear_vars(&["TABLESCOUT_PROVIDER_API_KEY", "TABLESCOUT_LLM_ENABLED"]);
        result
    }
}
