//! Google Gemini generateContent API backend.
//!
//! Conversations are `contents` with `user`/`model` roles; tool traffic is
//! `functionCall` / `functionResponse` parts. Gemini expects the whole
//! batch of function calls from a turn answered in the next user content,
//! which is how the neutral tool-role message is framed here. Parts marked
//! `thought` are model-internal and never surface as visible text.

use crate::model::{
    Backend, Message, ModelError, ModelRequest, ModelResponse, Part, Role, ToolCall, ToolSpec,
    Usage,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

// ─────────────────────────────────────────────────────────────────────────────
// API Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ApiRequest {
    contents: Vec<ApiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<ApiSystemInstruction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiToolDeclarations>,
}

#[derive(Debug, Serialize)]
struct ApiSystemInstruction {
    parts: Vec<ApiTextPart>,
}

#[derive(Debug, Serialize)]
struct ApiTextPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct ApiToolDeclarations {
    function_declarations: Vec<ApiFunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct ApiFunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize)]
struct ApiContent {
    role: &'static str,
    parts: Vec<ApiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    thought: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<ApiFunctionCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_response: Option<ApiFunctionResponse>,
}

impl ApiPart {
    fn text(text: String) -> Self {
        Self {
            text: Some(text),
            thought: false,
            function_call: None,
            function_response: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    args: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunctionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    response: Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    candidates: Vec<ApiCandidate>,
    #[serde(rename = "usageMetadata", default)]
    usage_metadata: Option<ApiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct ApiCandidate {
    content: ApiCandidateContent,
}

#[derive(Debug, Deserialize)]
struct ApiCandidateContent {
    #[serde(default)]
    parts: Vec<ApiPart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiUsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Gemini API backend.
#[derive(Clone)]
pub struct GeminiBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiBackend {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: GEMINI_API_BASE.to_string(),
        }
    }

    fn role_to_api(role: Role) -> &'static str {
        match role {
            // Function responses are delivered in a user content.
            Role::User | Role::Tool => "user",
            Role::Assistant => "model",
        }
    }

    fn message_to_api(msg: &Message) -> ApiContent {
        let parts: Vec<ApiPart> = msg
            .parts
            .iter()
            .map(|part| match part {
                Part::Text { text } => ApiPart::text(text.clone()),
                Part::ToolCall(call) => ApiPart {
                    text: None,
                    thought: false,
                    function_call: Some(ApiFunctionCall {
                        id: Some(call.id.clone()),
                        name: call.name.clone(),
                        args: call.args.clone(),
                    }),
                    function_response: None,
                },
                Part::ToolResult(result) => ApiPart {
                    text: None,
                    thought: false,
                    function_call: None,
                    function_response: Some(ApiFunctionResponse {
                        id: Some(result.id.clone()),
                        name: result.name.clone(),
                        response: result.result.clone(),
                    }),
                },
            })
            .collect();

        ApiContent {
            role: Self::role_to_api(msg.role),
            parts,
        }
    }

    fn tool_to_api(spec: &ToolSpec) -> ApiFunctionDeclaration {
        ApiFunctionDeclaration {
            name: spec.name.clone(),
            description: spec.description.clone(),
            parameters: spec.schema.clone(),
        }
    }

    fn response_to_message(parts: Vec<ApiPart>) -> Message {
        let parts: Vec<Part> = parts
            .into_iter()
            .filter_map(|part| {
                if let Some(call) = part.function_call {
                    // Gemini may omit call ids; mint one so result linkage
                    // stays intact through the rest of the loop.
                    let id = call
                        .id
                        .filter(|id| !id.is_empty())
                        .unwrap_or_else(|| format!("call-{}", Uuid::new_v4()));
                    return Some(Part::ToolCall(ToolCall {
                        id,
                        name: call.name,
                        args: call.args,
                    }));
                }
                match part.text {
                    Some(text) if !part.thought && !text.is_empty() => {
                        Some(Part::Text { text })
                    }
                    _ => None,
                }
            })
            .collect();

        Message {
            role: Role::Assistant,
            parts,
        }
    }
}

impl std::fmt::Display for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gemini({})", self.model)
    }
}

impl Backend for GeminiBackend {
    async fn generate(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        let contents: Vec<ApiContent> =
            request.messages.iter().map(Self::message_to_api).collect();

        let api_request = ApiRequest {
            contents,
            system_instruction: (!request.system.is_empty()).then(|| ApiSystemInstruction {
                parts: vec![ApiTextPart {
                    text: request.system.to_string(),
                }],
            }),
            tools: if request.tools.is_empty() {
                Vec::new()
            } else {
                vec![ApiToolDeclarations {
                    function_declarations: request.tools.iter().map(Self::tool_to_api).collect(),
                }]
            },
        };

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api(format!("{status}: {body}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        let candidate = api_response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::InvalidResponse("response has no candidates".into()))?;

        let message = Self::response_to_message(candidate.content.parts);
        let usage = api_response
            .usage_metadata
            .map(|u| Usage {
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
            })
            .unwrap_or_default();

        Ok(ModelResponse { message, usage })
    }
}
