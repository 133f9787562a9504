use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};

#[derive(Clone)]
pub struct HealthState {
    provider_backend: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub provider: HealthCheck,
    pub checked_at: String,
}

pub fn router(provider_backend: &'static str) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { provider_backend })
}

pub async fn spawn(
    bind_address: &str,
    port: u16,
    provider_backend: &'static str,
) -> std::io::Result<()> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        event_name = "system.health.start",
        bind_address = %address,
        "health endpoint started"
    );

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router(provider_backend)).await {
            error!(
                event_name = "system.health.error",
                error = %error,
                "health endpoint server terminated unexpectedly"
            );
        }
    });

    Ok(())
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    // Config is validated before the server starts, so the provider check
    // reports which backend this process serves rather than probing it;
    // per-request failures surface as error-marked results instead.
    let payload = HealthResponse {
        status: "ready",
        service: HealthCheck {
            status: "ready",
            detail: "tablescout-server runtime initialized".to_string(),
        },
        provider: HealthCheck {
            status: "ready",
            detail: format!("{} backend configured", state.provider_backend),
        },
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode, Json};

    use crate::health::{health, HealthState};

    #[tokio::test]
    async fn health_reports_ready_with_the_configured_backend() {
        let (status, Json(payload)) =
            health(State(HealthState { provider_backend: "amap" })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.service.status, "ready");
        assert!(payload.provider.detail.contains("amap"));
    }
}
