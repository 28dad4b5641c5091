use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use crate::application::ports::{
    CompletionError, CompletionRequest, CompletionService, OutputSchema,
};

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

/// OpenAI-compatible `/chat/completions` client. One instance per model.
pub struct OpenAiCompletionClient {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiCompletionClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    async fn chat(
        &self,
        request: &CompletionRequest,
        response_format: Option<serde_json::Value>,
    ) -> Result<String, CompletionError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        let body = ChatRequest {
            model: &self.config.model,
            messages,
            temperature: request.temperature,
            response_format,
        };

        let response = self
            .client
            .post(format!(
                "{}/chat/completions",
                self.config.api_url.trim_end_matches('/')
            ))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::NetworkError(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CompletionError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::ParseError(e.to_string()))?;

        extract_content(parsed)
    }
}

fn extract_content(response: ChatResponse) -> Result<String, CompletionError> {
    let message = response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or(CompletionError::EmptyResponse)?;

    if let Some(refusal) = message.refusal {
        return Err(CompletionError::ParseError(format!("Model refused: {}", refusal)));
    }

    message
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or(CompletionError::EmptyResponse)
}

fn json_schema_format(schema: &OutputSchema) -> serde_json::Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": schema.name,
            "schema": schema.schema,
            "strict": true,
        }
    })
}

#[async_trait]
impl CompletionService for OpenAiCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        self.chat(&request, None).await
    }

    async fn complete_structured(
        &self,
        request: CompletionRequest,
        schema: &OutputSchema,
    ) -> Result<serde_json::Value, CompletionError> {
        let content = self.chat(&request, Some(json_schema_format(schema))).await?;
        serde_json::from_str(&content).map_err(|e| CompletionError::ParseError(e.to_string()))
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_first_choice() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "{\"references\": []}"}}]}"#,
        )
        .unwrap();

        assert_eq!(extract_content(response).unwrap(), "{\"references\": []}");
    }

    #[test]
    fn test_empty_and_refused() {
        let empty: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(extract_content(empty), Err(CompletionError::EmptyResponse)));

        let refused: ChatResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"content": null, "refusal": "no"}}]}"#,
        )
        .unwrap();
        assert!(matches!(extract_content(refused), Err(CompletionError::ParseError(_))));
    }

    #[test]
    fn test_schema_format() {
        let format = json_schema_format(&OutputSchema {
            name: "references".to_string(),
            schema: json!({"type": "object"}),
        });

        assert_eq!(format["type"], "json_schema");
        assert_eq!(format["json_schema"]["name"], "references");
    }
}
