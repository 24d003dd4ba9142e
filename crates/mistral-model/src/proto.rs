use mathbot_model::{ModelCompletion, ModelMessage, ModelRequest};
use serde::{Deserialize, Serialize};

use crate::MistralConfig;

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChatCompletion {
    pub id: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Choice {
    pub message: Option<ResponseMessage>,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<MessageContent>,
}

/// Mistral answers either with a plain string or, for some models, with
/// a list of typed chunks.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Chunks(Vec<ContentChunk>),
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ContentChunk {
    pub r#type: Option<String>,
    pub text: Option<String>,
}

impl MessageContent {
    fn into_text(self) -> String {
        match self {
            MessageContent::Text(text) => text,
            MessageContent::Chunks(chunks) => chunks
                .into_iter()
                .filter(|c| c.r#type.as_deref().is_none_or(|t| t == "text"))
                .filter_map(|c| c.text)
                .collect(),
        }
    }
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System { content: String },
    User { content: String },
    Assistant { content: String },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(
    req: &ModelRequest,
    config: &MistralConfig,
) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: config.model.clone(),
        messages: req.messages.iter().map(create_message).collect(),
        temperature: config.temperature,
        stream: false,
    }
}

#[inline]
fn create_message(msg: &ModelMessage) -> Message {
    match msg {
        ModelMessage::System(content) => Message::System {
            content: content.clone(),
        },
        ModelMessage::User(content) => Message::User {
            content: content.clone(),
        },
        ModelMessage::Assistant(content) => Message::Assistant {
            content: content.clone(),
        },
    }
}

/// Takes the first choice out of a completion. Returns `None` if the
/// completion carries no text at all.
pub fn into_model_completion(
    mut completion: ChatCompletion,
) -> Option<ModelCompletion> {
    if completion.choices.is_empty() {
        return None;
    }
    let choice = completion.choices.swap_remove(0);
    let content = choice.message?.content?.into_text();
    if content.is_empty() {
        return None;
    }
    Some(ModelCompletion {
        id: completion.id,
        content,
        finish_reason: choice.finish_reason,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::MistralConfigBuilder;

    #[test]
    fn test_create_request() {
        let request = ModelRequest {
            messages: vec![
                ModelMessage::System("Tu es un assistant.".to_owned()),
                ModelMessage::User("8 fois 7".to_owned()),
                ModelMessage::Assistant("56".to_owned()),
            ],
        };
        let config = MistralConfigBuilder::with_api_key("xxx")
            .with_model("custom")
            .build();
        let expected = ChatCompletionRequest {
            model: "custom".to_owned(),
            messages: vec![
                Message::System {
                    content: "Tu es un assistant.".to_owned(),
                },
                Message::User {
                    content: "8 fois 7".to_owned(),
                },
                Message::Assistant {
                    content: "56".to_owned(),
                },
            ],
            temperature: None,
            stream: false,
        };
        assert_eq!(create_request(&request, &config), expected);

        let body = serde_json::to_value(&expected).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "custom",
                "messages": [
                    { "role": "system", "content": "Tu es un assistant." },
                    { "role": "user", "content": "8 fois 7" },
                    { "role": "assistant", "content": "56" }
                ],
                "stream": false
            })
        );
    }

    #[test]
    fn test_temperature_is_sent_when_configured() {
        let config = MistralConfigBuilder::with_api_key("xxx")
            .with_temperature(0.5)
            .build();
        let body = serde_json::to_value(create_request(
            &ModelRequest::default(),
            &config,
        ))
        .unwrap();
        assert_eq!(body["temperature"], json!(0.5));
    }

    #[test]
    fn test_into_model_completion() {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "id": "cmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "56" },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 1 }
        }))
        .unwrap();
        let completion = into_model_completion(completion).unwrap();
        assert_eq!(completion.id.as_deref(), Some("cmpl-1"));
        assert_eq!(completion.content, "56");
        assert_eq!(completion.finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn test_chunked_content_is_joined() {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "id": "cmpl-2",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": [
                        { "type": "text", "text": "8 × 7 " },
                        { "type": "reference", "reference_ids": [1] },
                        { "type": "text", "text": "= 56" }
                    ]
                },
                "finish_reason": "stop"
            }]
        }))
        .unwrap();
        let completion = into_model_completion(completion).unwrap();
        assert_eq!(completion.content, "8 × 7 = 56");
    }

    #[test]
    fn test_missing_content() {
        for payload in [
            json!({ "id": "x", "choices": [] }),
            json!({ "id": "x" }),
            json!({ "id": "x", "choices": [{ "finish_reason": "stop" }] }),
            json!({
                "id": "x",
                "choices": [{ "message": { "role": "assistant" } }]
            }),
            json!({
                "id": "x",
                "choices": [{ "message": { "content": "" } }]
            }),
        ] {
            let completion: ChatCompletion =
                serde_json::from_value(payload.clone()).unwrap();
            assert_eq!(into_model_completion(completion), None, "{payload}");
        }
    }
}
