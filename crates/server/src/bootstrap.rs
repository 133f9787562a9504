use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use tablescout_agent::{LlmClient, OpenAiCompatClient, SkillRouter};
use tablescout_core::config::{AppConfig, ConfigError, LoadOptions, ProviderKind};
use tablescout_core::engine::{EngineDefaults, RelaxationEngine};
use tablescout_core::gateway::ProviderError;
use tablescout_providers::build_gateway;

use crate::card::agent_card;
use crate::rpc::{AppState, SharedState};

pub struct Application {
    pub config: AppConfig,
    pub state: SharedState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("provider gateway initialization failed: {0}")]
    Provider(#[from] ProviderError),
    #[error("llm client initialization failed: {0}")]
    Llm(String),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        backend = provider_label(config.provider.backend),
        "starting application bootstrap"
    );

    let gateway = build_gateway(&config.provider)?;
    let defaults = EngineDefaults {
        city: config.provider.default_city.clone(),
        radius_m: config.provider.radius_m,
        page_size: config.provider.page_size,
    };
    let engine = RelaxationEngine::new(gateway, defaults);

    let llm: Option<Arc<dyn LlmClient>> = if config.llm.enabled {
        let client = OpenAiCompatClient::from_config(&config.llm)
            .map_err(|error| BootstrapError::Llm(error.to_string()))?;
        Some(Arc::new(client))
    } else {
        None
    };

    let state = AppState::new(SkillRouter::new(engine, llm), agent_card());

    info!(event_name = "system.bootstrap.ready", "application bootstrap complete");

    Ok(Application { config, state })
}

pub fn provider_label(backend: ProviderKind) -> &'static str {
    match backend {
        ProviderKind::Amap => "amap",
        ProviderKind::Baidu => "baidu",
    }
}
