use crate::constants::DESCRIPTION_HIGHLIGHTS_MAX;
use crate::error::{AppError, Result};
use crate::models::{PlaceDescription, TransportMode};
use crate::services::itinerary::normalize;
use crate::services::llm::{ChatMessage, ChatRequest, LlmClient};
use serde_json::{json, Value};

const WRITER_INSTRUCTIONS: &str = r#"You write short, accurate travel blurbs.

For every place name you receive, write 2 to 4 sentences.
Return exactly one item per name, in the order given. Never add, drop, merge or rename a place.
When you do not know a place, keep the blurb general instead of inventing details.
Answer with this JSON object only:
{"items":[{"name":"<name exactly as given>","summary":"<2-4 sentences>"}]}"#;

/// Inputs for one description batch
#[derive(Debug, Clone)]
pub struct DescriptionRequest<'a> {
    pub destination: &'a str,
    pub mode: TransportMode,
    pub names: &'a [String],
    pub highlights: &'a [String],
}

/// Writes one description per place name, strictly 1:1 with the input.
pub struct NarrativeWriter<'a> {
    llm: &'a dyn LlmClient,
    place_limit: usize,
}

impl<'a> NarrativeWriter<'a> {
    pub fn new(llm: &'a dyn LlmClient, place_limit: usize) -> Self {
        NarrativeWriter { llm, place_limit }
    }

    /// Descriptions for the first `place_limit` names, same order and count.
    ///
    /// A failed model call yields an empty list. A reply that does not match
    /// the names one-to-one is an error.
    pub async fn describe(&self, request: DescriptionRequest<'_>) -> Result<Vec<PlaceDescription>> {
        let names: Vec<&String> = request.names.iter().take(self.place_limit).collect();
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let highlights: Vec<&String> = request
            .highlights
            .iter()
            .take(DESCRIPTION_HIGHLIGHTS_MAX)
            .collect();
        let payload = json!({
            "destination": request.destination,
            "mode": request.mode,
            "places": names,
            "highlights": highlights,
        });

        let chat = ChatRequest {
            messages: vec![
                ChatMessage::system(WRITER_INSTRUCTIONS),
                ChatMessage::user(payload.to_string()),
            ],
            temperature: 0.35,
            max_tokens: 1400,
        };

        let reply = match self.llm.chat_json(chat).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("Place descriptions unavailable: {}", e);
                return Ok(Vec::new());
            }
        };

        let items = match &reply {
            Value::Object(object) => object.get("items").cloned().unwrap_or(Value::Null),
            Value::Array(_) => reply.clone(),
            _ => Value::Null,
        };
        let descriptions = normalize::place_descriptions(&items);

        check_one_to_one(&names, &descriptions)?;
        tracing::debug!("Wrote {} place descriptions", descriptions.len());
        Ok(descriptions)
    }
}

fn check_one_to_one(names: &[&String], descriptions: &[PlaceDescription]) -> Result<()> {
    if names.len() != descriptions.len() {
        return Err(AppError::Narrative(format!(
            "expected {} place descriptions, got {}",
            names.len(),
            descriptions.len()
        )));
    }

    for (index, (name, description)) in names.iter().zip(descriptions).enumerate() {
        if name.trim().to_lowercase() != description.name.trim().to_lowercase() {
            return Err(AppError::Narrative(format!(
                "description {} is for '{}' instead of '{}'",
                index + 1,
                description.name,
                name
            )));
        }
    }

    Ok(())
}
