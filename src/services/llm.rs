use crate::error::{AppError, Result};
use crate::models::TransportMode;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Chat model constrained to answer with a JSON object.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Parsed JSON content of the first choice. Content that is not valid
    /// JSON comes back as `{"raw": <content>}`.
    async fn chat_json(&self, request: ChatRequest) -> Result<Value>;
}

#[derive(Clone)]
pub struct GroqClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl GroqClient {
    pub fn new(endpoint: String, api_key: Option<String>, model: String) -> Self {
        GroqClient {
            client: Client::new(),
            endpoint,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl LlmClient for GroqClient {
    async fn chat_json(&self, request: ChatRequest) -> Result<Value> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Llm("Missing GROQ_KEY".to_string()))?;

        let body = json!({
            "model": self.model,
            "messages": request.messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
            "response_format": {"type": "json_object"},
        });

        tracing::debug!(
            model = %self.model,
            messages = request.messages.len(),
            "Groq chat request with {} messages",
            request.messages.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Llm(format!("GROQ error {}: {}", status, error_text)));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse response: {}", e)))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        Ok(parse_content(&content))
    }
}

fn parse_content(content: &str) -> Value {
    serde_json::from_str(content).unwrap_or_else(|_| json!({ "raw": content }))
}

// Chat completion response types

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

const PLANNER_INSTRUCTIONS: &str = r#"You plan outdoor trips that an ordinary person can actually complete.

Answer with a single JSON object in the shape below and nothing else.
Only use places that exist: towns, parks, roads, trails, landmarks.
When you do not know a coordinate for certain, set lat and lon to null. Never guess coordinates.

Use the traveller's notes to pick the theme (nature, food, history, romance...) and prefer safe, scenic options.

Stay close to the destination:
- walk: every place within about 10 km of the destination center.
- bike: every place within about 70 km of the destination center.

Mode rules:
- walk: exactly 1 day, a loop that finishes where it started, 5 to 15 km on foot.
- bike: exactly 2 days of roughly 60 km each, point to point and never a loop.
  Day 1 starts near the destination and ends in another town with an overnight stay and a lodging suggestion.
  Day 2 starts in that overnight town and ends in a town other than the day 1 start.

Shape:
{
  "destination": string,
  "mode": "bike" | "walk",
  "total_distance_km": number,
  "days": [
    {
      "day": number,
      "distance_km": number,
      "start": string,
      "end": string,
      "waypoints": [string],
      "overnight": { "city": string, "lodging_suggestion": string } | null,
      "highlights": [string]
    }
  ],
  "map_points": [ { "name": string, "lat": number | null, "lon": number | null } ],
  "notes": [string]
}"#;

/// Messages asking the model for a raw plan
pub fn plan_request(destination: &str, mode: TransportMode, notes: &str) -> ChatRequest {
    let user = format!(
        "Destination: \"{}\"\nMode: \"{}\"\nTraveller notes: \"{}\"\n\n\
         Use the shape exactly and keep every place near the destination.",
        destination, mode, notes
    );

    ChatRequest {
        messages: vec![ChatMessage::system(PLANNER_INSTRUCTIONS), ChatMessage::user(user)],
        temperature: 0.35,
        max_tokens: 2000,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_content_falls_back_to_raw() {
        assert_eq!(parse_content(r#"{"days":[]}"#), json!({"days": []}));
        assert_eq!(parse_content("not json"), json!({"raw": "not json"}));
        assert_eq!(parse_content(""), json!({"raw": ""}));
    }

    #[test]
    fn test_plan_request_mentions_inputs() {
        let request = plan_request("Paris", TransportMode::Walk, "romantic walk");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        assert!(request.messages[1].content.contains("\"Paris\""));
        assert!(request.messages[1].content.contains("\"walk\""));
        assert!(request.messages[1].content.contains("romantic walk"));
    }

    #[tokio::test]
    async fn test_missing_key_is_llm_error() {
        let client = GroqClient::new(
            "http://localhost:1".to_string(),
            None,
            "model".to_string(),
        );
        let result = client.chat_json(plan_request("Paris", TransportMode::Walk, "")).await;
        assert!(matches!(result, Err(AppError::Llm(_))));
    }
}
