use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use crate::assistant::dispatch::NO_RESPONSE_REPLY;
use crate::assistant::protocol::{ModelBackend, ModelReply, ModelRequest, TurnPart};
use crate::assistant::transcript::{Role, ToolCall};
use crate::config::ModelConfig;
use crate::error::ModelError;

/// Gemini `generateContent` over REST.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

impl GeminiClient {
    pub fn new(config: &ModelConfig) -> Result<Self, ModelError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ModelError::MissingApiKey)?
            .to_string();

        let client = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    async fn send(&self, request: ModelRequest) -> Result<ModelReply, ModelError> {
        let body = request_body(&request);
        debug!(model = %self.model, turns = request.turns.len(), "Sending generateContent");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Model backend rejected request");
            return Err(ModelError::Status { status: status.as_u16(), body });
        }

        let raw: Value = response.json().await?;
        parse_reply(raw)
    }
}

impl ModelBackend for GeminiClient {
    fn generate(
        &self,
        request: ModelRequest,
    ) -> impl std::future::Future<Output = Result<ModelReply, ModelError>> + Send {
        let client = self.clone();
        async move { client.send(request).await }
    }
}

/// Wire body for `generateContent`.
pub fn request_body(request: &ModelRequest) -> Value {
    let contents: Vec<Value> = request
        .turns
        .iter()
        .map(|turn| {
            let role = match turn.role {
                Role::User => "user",
                Role::Assistant => "model",
            };
            let part = match &turn.part {
                TurnPart::Text(text) => json!({ "text": text }),
                TurnPart::ToolCall(call) => json!({ "functionCall": { "name": call.name, "args": call.args } }),
                TurnPart::ToolResult(result) => json!({
                    "functionResponse": { "name": result.name, "response": result.response }
                }),
            };
            json!({ "role": role, "parts": [part] })
        })
        .collect();

    let declarations: Vec<Value> = request
        .tools
        .iter()
        .map(|tool| json!({ "name": tool.name, "description": tool.description, "parameters": tool.parameters }))
        .collect();

    json!({
        "systemInstruction": { "parts": [{ "text": request.system_instruction }] },
        "contents": contents,
        "tools": [{ "functionDeclarations": declarations }],
    })
}

/// Decodes a `generateContent` response. Function calls win over text; an
/// empty answer becomes the canned no-response reply.
pub fn parse_reply(raw: Value) -> Result<ModelReply, ModelError> {
    let response: GenerateContentResponse =
        serde_json::from_value(raw).map_err(|e| ModelError::Malformed(e.to_string()))?;
    let parts = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts)
        .unwrap_or_default();

    let mut calls = Vec::new();
    let mut text = String::new();
    for part in parts {
        if let Some(call) = part.function_call {
            calls.push(ToolCall::new(call.name, call.args));
        } else if let Some(chunk) = part.text {
            text.push_str(&chunk);
        }
    }

    Ok(if !calls.is_empty() {
        ModelReply::ToolCalls(calls)
    } else if text.trim().is_empty() {
        ModelReply::Text(NO_RESPONSE_REPLY.to_string())
    } else {
        ModelReply::Text(text)
    })
}
