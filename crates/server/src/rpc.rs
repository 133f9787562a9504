//! JSON-RPC 2.0 envelope over HTTP: the `/a2a` endpoint and its method
//! table. Tasks are request-scoped data kept in process memory only for
//! `tasks/get` replay; nothing persists.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use tablescout_agent::{SkillError, SkillRouter};

const CODE_HANDLER_FAILED: i64 = -32000;
const CODE_TASK_NOT_FOUND: i64 = -32001;
const CODE_METHOD_NOT_FOUND: i64 = -32601;
const CODE_INVALID_PARAMS: i64 = -32602;

pub struct AppState {
    pub skills: SkillRouter,
    pub tasks: Mutex<HashMap<String, TaskRecord>>,
    pub card: Value,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(skills: SkillRouter, card: Value) -> SharedState {
        Arc::new(Self { skills, tasks: Mutex::new(HashMap::new()), card })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub status: TaskStatus,
    pub result: TaskResult,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskStatus {
    pub state: String,
    pub timestamp: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskResult {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    #[allow(dead_code)]
    pub jsonrpc: Option<String>,
    pub id: Option<Value>,
    pub method: Option<String>,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    fn invalid_params(message: impl Into<String>) -> Self {
        Self { code: CODE_INVALID_PARAMS, message: message.into() }
    }
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/a2a", post(handle_a2a))
        .route("/.well-known/agent-card.json", get(agent_card))
        .with_state(state)
}

async fn agent_card(State(state): State<SharedState>) -> Json<Value> {
    Json(state.card.clone())
}

async fn handle_a2a(
    State(state): State<SharedState>,
    Json(request): Json<RpcRequest>,
) -> Json<Value> {
    let id = request.id.clone().unwrap_or(Value::Null);

    let response = match request.method.as_deref() {
        Some("tasks/send") => tasks_send(&state, request.params).await,
        Some("tasks/get") => tasks_get(&state, request.params),
        Some("agent/info") => Ok(state.card.clone()),
        Some(other) => Err(RpcError {
            code: CODE_METHOD_NOT_FOUND,
            message: format!("unknown method: {other}"),
        }),
        None => Err(RpcError::invalid_params("missing method")),
    };

    let envelope = match response {
        Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
        Err(error) => json!({ "jsonrpc": "2.0", "id": id, "error": error }),
    };
    Json(envelope)
}

#[derive(Debug, Deserialize)]
struct SendParams {
    id: Option<String>,
    skill_id: Option<String>,
    #[serde(default)]
    params: Value,
}

async fn tasks_send(state: &AppState, params: Value) -> Result<Value, RpcError> {
    let send: SendParams =
        serde_json::from_value(params).map_err(|error| RpcError::invalid_params(error.to_string()))?;
    let Some(skill_id) = send.skill_id.filter(|skill_id| !skill_id.is_empty()) else {
        return Err(RpcError::invalid_params("missing skill_id parameter"));
    };

    let task_id = send.id.unwrap_or_else(|| Uuid::new_v4().to_string());
    let skill_params = if send.params.is_null() { json!({}) } else { send.params };

    info!(
        event_name = "rpc.tasks_send",
        task_id = %task_id,
        skill_id = %skill_id,
        "executing skill task"
    );

    let text = match state.skills.dispatch(&skill_id, skill_params).await {
        Ok(text) => text,
        // An unknown skill still completes the task with guidance, like
        // any other no-result outcome.
        Err(error @ SkillError::UnknownSkill(_)) => error.to_string(),
        Err(SkillError::InvalidParams { skill, message }) => {
            return Err(RpcError {
                code: CODE_HANDLER_FAILED,
                message: format!("skill `{skill}` rejected its parameters: {message}"),
            });
        }
    };

    let record = TaskRecord {
        id: task_id.clone(),
        status: TaskStatus { state: "completed".to_string(), timestamp: Utc::now().to_rfc3339() },
        result: TaskResult { kind: "text".to_string(), text },
    };

    state.tasks.lock().expect("task store lock").insert(task_id, record.clone());

    serde_json::to_value(&record)
        .map_err(|error| RpcError { code: CODE_HANDLER_FAILED, message: error.to_string() })
}

#[derive(Debug, Deserialize)]
struct GetParams {
    id: Option<String>,
}

fn tasks_get(state: &AppState, params: Value) -> Result<Value, RpcError> {
    let get: GetParams =
        serde_json::from_value(params).map_err(|error| RpcError::invalid_params(error.to_string()))?;
    let Some(task_id) = get.id else {
        return Err(RpcError::invalid_params("missing id parameter"));
    };

    let tasks = state.tasks.lock().expect("task store lock");
    match tasks.get(&task_id) {
        Some(record) => serde_json::to_value(record)
            .map_err(|error| RpcError { code: CODE_HANDLER_FAILED, message: error.to_string() }),
        None => Err(RpcError { code: CODE_TASK_NOT_FOUND, message: "Task not found".to_string() }),
    }
}
