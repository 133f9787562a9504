//! Concrete POI provider backends behind the `ProviderGateway` interface.
//!
//! Both adapters normalize their provider's wire format into the shared
//! `Venue` shape; which one runs is a config decision made once at startup.

pub mod amap;
pub mod baidu;

use std::sync::Arc;

use tablescout_core::config::{ProviderConfig, ProviderKind};
use tablescout_core::gateway::{ProviderError, ProviderGateway};

pub use amap::AmapGateway;
pub use baidu::BaiduGateway;

/// Build the configured backend. Callers hold the result as a shared
/// gateway reference; no other code mentions a concrete provider.
pub fn build_gateway(config: &ProviderConfig) -> Result<Arc<dyn ProviderGateway>, ProviderError> {
    match config.backend {
        ProviderKind::Amap => Ok(Arc::new(AmapGateway::from_config(config)?)),
        ProviderKind::Baidu => Ok(Arc::new(BaiduGateway::from_config(config)?)),
    }
}

#[cfg(test)]
mod tests {
    use tablescout_core::config::{AppConfig, ProviderKind};

    use super::build_gateway;

    #[test]
    fn factory_builds_both_backends() {
        let mut provider = AppConfig::default().provider;
        provider.api_key = "some-key".to_string().into();

        provider.backend = ProviderKind::Amap;
        assert!(build_gateway(&provider).is_ok());

        provider.backend = ProviderKind::Baidu;
        assert!(build_gateway(&provider).is_ok());
    }
}
