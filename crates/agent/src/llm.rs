//! LLM collaboration: free-text request analysis and optional response
//! styling through an OpenAI-compatible chat endpoint.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use tablescout_core::config::LlmConfig;
use tablescout_core::domain::Venue;

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_message: &str) -> Result<String>;
}

/// Chat-completions client for any OpenAI-compatible endpoint.
pub struct OpenAiCompatClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiCompatClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_ref()
            .map(|key| key.expose_secret().to_string())
            .ok_or_else(|| anyhow!("llm.api_key is not configured"))?;
        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| anyhow!("llm.base_url is not configured"))?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, api_key, base_url, model: config.model.clone() })
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatClient {
    async fn complete(&self, system_prompt: &str, user_message: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_message },
            ],
            "temperature": 0.7,
            "max_tokens": 2000,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let completion: ChatCompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("chat completion returned no choices"))
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

/// Structured intent extracted from a free-text food request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct FoodIntent {
    pub taste: Option<String>,
    pub budget_min: Option<u32>,
    pub budget_max: Option<u32>,
    pub cuisine: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub meal_time: Option<String>,
}

const ANALYZE_SYSTEM_PROMPT: &str = "\
You extract dining preferences from a user's request. Reply with only a \
JSON object, no prose, with these fields (null when absent): \
\"taste\" (e.g. 清淡, 辣, 鲜), \"budget_min\" (number), \"budget_max\" \
(number), \"cuisine\" (e.g. 川菜, 日料, 火锅), \"keywords\" (array of \
strings), \"meal_time\" (e.g. 早餐, 午餐, 晚餐, 夜宵).";

/// Pull a structured intent out of free text. Any model or parse failure
/// degrades to an empty intent; explicit request parameters still apply.
pub async fn analyze_food_request(client: &dyn LlmClient, user_input: &str) -> FoodIntent {
    let response = match client.complete(ANALYZE_SYSTEM_PROMPT, user_input).await {
        Ok(response) => response,
        Err(error) => {
            warn!(event_name = "llm.analyze_failed", error = %error, "intent analysis failed");
            return FoodIntent::default();
        }
    };

    match serde_json::from_str(strip_code_fence(&response)) {
        Ok(intent) => intent,
        Err(error) => {
            warn!(event_name = "llm.analyze_unparseable", error = %error, "intent reply was not JSON");
            FoodIntent::default()
        }
    }
}

const STYLE_SYSTEM_PROMPT: &str = "\
You are a dining recommendation assistant. Using the user's request and \
the venue data provided, write a short, friendly recommendation in \
markdown. Highlight how each venue matches the request. Do not invent \
venues that are not in the data.";

/// Optional styling pass over the leading venues. Falls back to the
/// pre-rendered text when the model is unavailable or replies empty.
pub async fn style_recommendation(
    client: &dyn LlmClient,
    user_input: &str,
    venues: &[Venue],
    rendered_fallback: &str,
) -> String {
    let mut lines = vec![format!("User request: {user_input}"), String::from("Venues:")];
    for venue in venues.iter().take(5) {
        lines.push(format!(
            "- {} | category {} | rating {} | cost {} | {}",
            venue.name, venue.category, venue.rating, venue.cost, venue.address
        ));
    }

    match client.complete(STYLE_SYSTEM_PROMPT, &lines.join("\n")).await {
        Ok(styled) if !styled.trim().is_empty() => styled,
        Ok(_) => rendered_fallback.to_string(),
        Err(error) => {
            warn!(event_name = "llm.style_failed", error = %error, "styling pass failed");
            rendered_fallback.to_string()
        }
    }
}

/// Models often wrap JSON replies in a markdown fence; strip one if present.
fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
