use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::LlmConfig;

/// Sent to the user whenever the completion service fails for any reason.
pub const FALLBACK_REPLY: &str = "Sorry, an error occurred while processing your request.";

/// One fully-built request for the completion service: the system-level
/// instructions plus exactly one input shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub instructions: String,
    pub input: RequestInput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestInput {
    /// A single user message.
    Text(String),
    /// An ordered exchange of role-tagged turns.
    Turns(Vec<Turn>),
    /// A caption plus a dereferenceable image URL; routed to the vision model.
    ImageWithCaption { caption: String, image_url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Assistant,
    User,
}

impl Role {
    fn as_str(self) -> &'static str {
        match self {
            Role::Assistant => "assistant",
            Role::User => "user",
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

pub struct LlmClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Run one completion call and normalize the outcome to a plain string.
    /// Service failures are logged and replaced with the fixed apology; the
    /// caller never sees an error and nothing is retried.
    pub async fn complete(&self, request: &CompletionRequest) -> String {
        match self.try_complete(request).await {
            Ok(text) => text,
            Err(e) => {
                error!("Completion request failed: {:#}", e);
                FALLBACK_REPLY.to_string()
            }
        }
    }

    async fn try_complete(&self, request: &CompletionRequest) -> Result<String> {
        let model = match request.input {
            RequestInput::ImageWithCaption { .. } => self.config.vision_model.clone(),
            _ => self.config.model.clone(),
        };

        let mut messages = vec![ChatMessage {
            role: "system",
            content: MessageContent::Text(request.instructions.clone()),
        }];

        match &request.input {
            RequestInput::Text(text) => {
                messages.push(ChatMessage {
                    role: "user",
                    content: MessageContent::Text(text.clone()),
                });
            }
            RequestInput::Turns(turns) => {
                for turn in turns {
                    messages.push(ChatMessage {
                        role: turn.role.as_str(),
                        content: MessageContent::Text(turn.text.clone()),
                    });
                }
            }
            RequestInput::ImageWithCaption { caption, image_url } => {
                messages.push(ChatMessage {
                    role: "user",
                    content: MessageContent::Parts(vec![
                        ContentPart::Text {
                            text: caption.clone(),
                        },
                        ContentPart::ImageUrl {
                            image_url: ImageUrl {
                                url: image_url.clone(),
                            },
                        },
                    ]),
                });
            }
        }

        let body = ChatRequest {
            model,
            messages,
            max_tokens: self.config.max_tokens,
        };

        let url = format!("{}/chat/completions", self.config.base_url);

        debug!("Sending completion request to {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .context("Failed to send request to the completion API")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("Completion API error ({}): {}", status, error_body);
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .context("Failed to parse completion API response")?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .context("Completion API returned no text")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multipart_content_serializes_as_typed_parts() {
        let content = MessageContent::Parts(vec![
            ContentPart::Text {
                text: "what is this?".to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: "https://api.telegram.org/file/bot123/photo.jpg".to_string(),
                },
            },
        ]);

        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json[0]["type"], "text");
        assert_eq!(json[0]["text"], "what is this?");
        assert_eq!(json[1]["type"], "image_url");
        assert_eq!(
            json[1]["image_url"]["url"],
            "https://api.telegram.org/file/bot123/photo.jpg"
        );
    }

    #[test]
    fn test_plain_content_serializes_as_bare_string() {
        let message = ChatMessage {
            role: "user",
            content: MessageContent::Text("halo".to_string()),
        };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["content"], "halo");
    }
}
