pub mod config;
pub mod doctor;
pub mod recommend;
pub mod search;

use tablescout_agent::SkillRouter;
use tablescout_core::config::{AppConfig, LoadOptions};
use tablescout_core::engine::{EngineDefaults, RelaxationEngine};
use tablescout_providers::build_gateway;

pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

/// One-shot skill execution for the `search` and `recommend` subcommands:
/// load config, build the gateway, run the skill on a throwaway runtime.
pub(crate) fn dispatch_skill(skill_id: &str, params: serde_json::Value) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult {
                exit_code: 1,
                output: format!("config validation failed: {error}"),
            };
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult {
                exit_code: 1,
                output: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let outcome = runtime.block_on(async {
        let gateway = build_gateway(&config.provider).map_err(|error| error.to_string())?;
        let defaults = EngineDefaults {
            city: config.provider.default_city.clone(),
            radius_m: config.provider.radius_m,
            page_size: config.provider.page_size,
        };
        let router = SkillRouter::new(RelaxationEngine::new(gateway, defaults), None);
        router.dispatch(skill_id, params).await.map_err(|error| error.to_string())
    });

    match outcome {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => {
            CommandResult { exit_code: 1, output: format!("{skill_id} failed: {error}") }
        }
    }
}
